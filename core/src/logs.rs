//! # Access Log Rows
//!
//! Proxy access logs are read into [`LogRow`]s, narrowed by a
//! [`filter::ContentFilter`], and only then attributed to institutions.

pub mod filter;
pub mod ingest;

use serde::{Deserialize, Serialize};

/// The columns of one access-log line that the usage report needs.
///
/// Field names double as the header of the processed-log CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub month: String,
    pub day: u32,
    pub time: String,
    pub client_ip: String,
    pub server_name: String,
    pub request_path: String,
    pub http_request: String,
}

pub use filter::ContentFilter;
pub use ingest::{LogBatch, LogLineError};
