use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Local;
use ipusage_common::config::Config;
use ipusage_core::logs::{ContentFilter, ingest};
use tracing::info;

use crate::commands::report::read_filtered;
use crate::terminal::print;

pub fn clean(folder: &Path, out_dir: &Path, cfg: &Config, quiet: bool) -> anyhow::Result<()> {
    let files = ingest::list_files(folder)?;
    if files.is_empty() {
        bail!("No log files in {}", folder.display());
    }
    info!("Cleaning {} log files from {}", files.len(), folder.display());

    let filter = ContentFilter::new(cfg);
    let batch = read_filtered(&files, &filter, quiet)?;

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let path: PathBuf = out_dir.join(format!("logs_{}.csv", today()));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    ingest::write_processed(file, &batch.rows)?;

    print::aligned_line("Files", files.len().to_string(), 5);
    print::aligned_line("Rows", batch.rows.len().to_string(), 5);
    print::aligned_line("Saved", path.display().to_string(), 5);
    Ok(())
}

/// Local date as `YYYY-MM-DD`, the stamp of the processed file.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
