use std::path::PathBuf;

/// One site served behind the proxy, as it appears in the log's
/// request-path column, and the report column it counts towards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub path: String,
    pub label: String,
}

impl Site {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// Run configuration, built once by the binary and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend that must have served a request for it to count.
    pub server_name: String,

    /// Sites to count, in report column order.
    pub sites: Vec<Site>,

    /// Alternative to a site match: the HTTP request line contains this.
    pub view_marker: String,

    /// CSV export of the institution table.
    pub institutions_file: PathBuf,

    /// Title rows above the header of the institution table.
    pub skip_rows: usize,

    /// Where per-institution usage reports are kept.
    pub report_dir: PathBuf,
}

impl Config {
    pub fn site_labels(&self) -> Vec<String> {
        self.sites.iter().map(|site| site.label.clone()).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: "cap/local".to_string(),
            sites: vec![
                Site::new("{https|heritage.canadiana.ca}", "Heritage"),
                Site::new("{https|www.canadiana.ca}", "Canadiana"),
                Site::new("{https|gac.canadiana.ca}", "GAC"),
                Site::new("{https|parl.canadiana.ca}", "Parl"),
            ],
            view_marker: "/view".to_string(),
            institutions_file: PathBuf::from("data/IP_addresses.csv"),
            skip_rows: 2,
            report_dir: PathBuf::from("data/reports"),
        }
    }
}
