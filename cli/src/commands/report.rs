use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;
use colored::*;
use ipusage_common::config::Config;
use ipusage_core::attribution::LogAttributor;
use ipusage_core::institutions;
use ipusage_core::logs::{ContentFilter, LogBatch, ingest};
use ipusage_core::report::{self, UsageReport};
use tracing::{info, warn};

use crate::terminal::{colors, print, progress};

pub fn report(institution: &str, logs: &[PathBuf], cfg: &Config, quiet: bool) -> anyhow::Result<()> {
    let start_time: Instant = Instant::now();

    info!("Loading institutions from {}", cfg.institutions_file.display());
    let build = institutions::load_catalog(&cfg.institutions_file, cfg.skip_rows)?;
    if !build.rejected.is_empty() {
        warn!(
            "{} IP specifications could not be read, see `ipusage check`",
            build.rejected.len()
        );
    }

    let Some((id, record)) = build.catalog.lookup(institution) else {
        bail!("Institution `{institution}` not found");
    };
    info!("Institution '{}' found", record.name());

    let filter = ContentFilter::new(cfg);
    let batch = read_filtered(logs, &filter, quiet)?;
    info!("{} log rows kept after filtering", batch.rows.len());

    let tally = LogAttributor::new(&build.catalog).attribute_institution(
        id,
        &batch.rows,
        report::day_key(&filter),
    );
    if tally.unparsable() > 0 {
        warn!("{} rows had an unreadable client address", tally.unparsable());
    }

    let usage = UsageReport::from_tally(&tally, id, cfg.site_labels());

    print::header(record.report_name());
    if usage.is_empty() {
        print::no_results();
    } else {
        print::report_table(&usage);
    }

    let path = report::report_path(&cfg.report_dir, record);
    report::update_report(&path, usage)?;

    print::fat_separator();
    let total_time: ColoredString = format!("{:.2}s", start_time.elapsed().as_secs_f64()).bold().yellow();
    print::centerln(&format!(
        "{}",
        format!("Report written to {} in {total_time}", path.display()).color(colors::TEXT_DEFAULT)
    ));
    Ok(())
}

/// Loads every log file and keeps the rows the filter accepts.
pub fn read_filtered(logs: &[PathBuf], filter: &ContentFilter, quiet: bool) -> anyhow::Result<LogBatch> {
    let bar = progress::file_bar(logs.len(), quiet);
    let mut combined = LogBatch::default();

    for path in logs {
        bar.set_message(path.display().to_string());
        let mut batch = ingest::load_file(path)?;
        batch.retain(filter);
        combined.extend(batch);
        bar.inc(1);
    }

    bar.finish_and_clear();
    if combined.skipped > 0 {
        warn!("{} malformed log lines skipped", combined.skipped);
    }
    Ok(combined)
}
