pub mod check;
pub mod clean;
pub mod parse;
pub mod report;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use ipusage_common::config::{Config, Site};

#[derive(Parser)]
#[command(name = "ipusage", version)]
#[command(about = "Attribute proxy access logs to subscribing institutions.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print results, warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count an institution's views in the given logs and update its report
    #[command(alias = "r")]
    Report {
        /// Institution name or abbreviation, case-insensitive
        institution: String,
        /// Raw proxy logs or processed CSV files
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },
    /// Filter every log file in a folder into one processed CSV
    #[command(alias = "c")]
    Clean {
        folder: PathBuf,
        /// Where the processed file is written
        #[arg(long, default_value = "data/processed")]
        out_dir: PathBuf,
    },
    /// Show how an institution's IP specifications were read
    Check {
        /// Institution name or abbreviation, case-insensitive
        institution: String,
    },
    /// Parse IP specifications and print their canonical form
    #[command(alias = "p")]
    Parse {
        #[arg(required = true)]
        specs: Vec<String>,
    },
}

/// Run configuration. Unset values fall back to [`Config::default`].
#[derive(clap::Args)]
pub struct ConfigArgs {
    /// Backend that must have served a request for it to count
    #[arg(long, env, global = true)]
    pub server_name: Option<String>,

    /// Site to count, as PATH=LABEL; repeat or comma-separate for several
    #[arg(long = "site", env = "SITES", global = true, value_delimiter = ',', value_parser = parse_site)]
    pub sites: Vec<Site>,

    /// Substring of the HTTP request that also marks a view
    #[arg(long, env, global = true)]
    pub view_marker: Option<String>,

    /// CSV export of the institution table
    #[arg(long, env, global = true, value_name = "FILE")]
    pub institutions_file: Option<PathBuf>,

    /// Title rows above the institution table's header
    #[arg(long, env, global = true)]
    pub skip_rows: Option<usize>,

    /// Directory of per-institution usage reports
    #[arg(long, env, global = true, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            server_name: self.server_name.unwrap_or(defaults.server_name),
            sites: if self.sites.is_empty() {
                defaults.sites
            } else {
                self.sites
            },
            view_marker: self.view_marker.unwrap_or(defaults.view_marker),
            institutions_file: self.institutions_file.unwrap_or(defaults.institutions_file),
            skip_rows: self.skip_rows.unwrap_or(defaults.skip_rows),
            report_dir: self.report_dir.unwrap_or(defaults.report_dir),
        }
    }
}

fn parse_site(s: &str) -> Result<Site, String> {
    match s.rsplit_once('=') {
        Some((path, label)) if !path.trim().is_empty() && !label.trim().is_empty() => {
            Ok(Site::new(path.trim(), label.trim()))
        }
        _ => Err(format!("expected PATH=LABEL, got '{s}'")),
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
