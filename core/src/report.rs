//! # Usage Reports
//!
//! Per-institution daily view counts, one column per site plus a total.
//! Reports are kept as one CSV file per institution and merged with what
//! an earlier run left behind.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use tracing::{debug, info};

use crate::attribution::UsageTally;
use crate::catalog::{InstitutionId, InstitutionRecord};
use crate::logs::{ContentFilter, LogRow};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_HEADER: &str = "Month";
const DAY_HEADER: &str = "Day";
const TOTAL_HEADER: &str = "Total";

/// Bucket used when attributing rows for a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayKey {
    pub month: String,
    pub day: u32,
    /// Index into the configured sites, `None` for rows counted through the
    /// view marker alone.
    pub site: Option<usize>,
}

/// Bucketing closure for [`crate::attribution::LogAttributor`].
pub fn day_key(filter: &ContentFilter) -> impl Fn(&LogRow) -> DayKey + Sync + '_ {
    move |row| DayKey {
        month: row.month.clone(),
        day: row.day,
        site: filter.site_index(row),
    }
}

/// Calendar position of a month abbreviation; unknown names sort last.
fn month_rank(month: &str) -> usize {
    let month = month.trim();
    MONTHS
        .iter()
        .position(|m| month.get(..3).is_some_and(|head| head.eq_ignore_ascii_case(m)))
        .unwrap_or(MONTHS.len())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    pub month: String,
    pub day: u32,
    /// One count per report column.
    pub counts: Vec<u64>,
}

impl UsageRow {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReport {
    columns: Vec<String>,
    rows: Vec<UsageRow>,
}

impl UsageReport {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds the report of one institution from a day-bucketed tally.
    pub fn from_tally(tally: &UsageTally<DayKey>, id: InstitutionId, columns: Vec<String>) -> Self {
        let mut days: BTreeMap<(usize, String, u32), Vec<u64>> = BTreeMap::new();
        let mut unlabeled = 0;

        for (owner, key, count) in tally.iter() {
            if owner != id {
                continue;
            }
            let Some(site) = key.site.filter(|&site| site < columns.len()) else {
                unlabeled += count;
                continue;
            };
            let counts = days
                .entry((month_rank(&key.month), key.month.clone(), key.day))
                .or_insert_with(|| vec![0; columns.len()]);
            counts[site] += count;
        }

        if unlabeled > 0 {
            debug!("{unlabeled} matching views had no site column");
        }

        let rows = days
            .into_iter()
            .map(|((_, month, day), counts)| UsageRow { month, day, counts })
            .collect();

        let mut report = Self { columns, rows };
        report.normalize();
        report
    }

    /// Appends `newer` to `self`, then orders by month, day and total and
    /// keeps only the highest-total row of each day.
    pub fn merge(mut self, newer: UsageReport) -> Self {
        for column in &newer.columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.counts.push(0);
                }
            }
        }

        for row in newer.rows {
            let mut counts = vec![0; self.columns.len()];
            for (column, count) in newer.columns.iter().zip(row.counts) {
                if let Some(idx) = self.columns.iter().position(|c| c == column) {
                    counts[idx] = count;
                }
            }
            self.rows.push(UsageRow {
                month: row.month,
                day: row.day,
                counts,
            });
        }

        self.normalize();
        self
    }

    fn normalize(&mut self) {
        self.rows.sort_by(|a, b| {
            (month_rank(&a.month), &a.month, a.day, a.total())
                .cmp(&(month_rank(&b.month), &b.month, b.day, b.total()))
        });

        // Sorted by total within a day, so the last duplicate is the largest.
        let mut kept: Vec<UsageRow> = Vec::with_capacity(self.rows.len());
        for row in self.rows.drain(..) {
            match kept.last_mut() {
                Some(last) if last.month == row.month && last.day == row.day => *last = row,
                _ => kept.push(row),
            }
        }
        self.rows = kept;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[UsageRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every row's total.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(UsageRow::total).sum()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec![MONTH_HEADER.to_string(), DAY_HEADER.to_string()];
        header.extend(self.columns.iter().cloned());
        header.push(TOTAL_HEADER.to_string());
        header
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().context("reading report header")?.clone();

        let month_idx = position(&headers, MONTH_HEADER)?;
        let day_idx = position(&headers, DAY_HEADER)?;
        let count_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, h)| *idx != month_idx && *idx != day_idx && h.trim() != TOTAL_HEADER)
            .map(|(idx, h)| (idx, h.trim().to_string()))
            .collect();

        let mut rows = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("report row {row_no}"))?;
            let month = record.get(month_idx).unwrap_or("").trim().to_string();
            let day = parse_count(record.get(day_idx), row_no, DAY_HEADER)?;
            let counts = count_columns
                .iter()
                .map(|(idx, name)| parse_count(record.get(*idx), row_no, name))
                .collect::<Result<Vec<u64>>>()?;

            rows.push(UsageRow {
                month,
                day: u32::try_from(day).with_context(|| format!("report row {row_no}: day"))?,
                counts,
            });
        }

        let mut report = Self {
            columns: count_columns.into_iter().map(|(_, name)| name).collect(),
            rows,
        };
        report.normalize();
        Ok(report)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.header()).context("writing report header")?;

        for row in &self.rows {
            let mut record = vec![row.month.clone(), row.day.to_string()];
            record.extend(row.counts.iter().map(u64::to_string));
            record.push(row.total().to_string());
            writer.write_record(&record).context("writing report row")?;
        }

        writer.flush().context("flushing report")?;
        Ok(())
    }
}

fn position(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("report missing '{name}' column"))
}

/// Empty cells count as zero.
fn parse_count(cell: Option<&str>, row_no: usize, column: &str) -> Result<u64> {
    let cell = cell.unwrap_or("").trim();
    if cell.is_empty() {
        return Ok(0);
    }
    match cell.parse::<u64>() {
        Ok(value) => Ok(value),
        // Spreadsheet round trips turn integers into `12.0`.
        Err(_) => match cell.parse::<f64>() {
            Ok(value) if value >= 0.0 && value.fract() == 0.0 => Ok(value as u64),
            _ => bail!("report row {row_no}: '{cell}' in {column} is not a count"),
        },
    }
}

/// Report file of `record` inside `dir`.
pub fn report_path(dir: &Path, record: &InstitutionRecord) -> PathBuf {
    let file_name: String = record
        .report_name()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    dir.join(format!("{}.csv", file_name.trim()))
}

/// Merges `report` into the file at `path`, creating it if needed, and
/// returns what was written.
pub fn update_report(path: &Path, report: UsageReport) -> Result<UsageReport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let exists = path.is_file();
    let merged = if exists {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let existing = UsageReport::from_reader(file)
            .with_context(|| format!("reading {}", path.display()))?;
        existing.merge(report)
    } else {
        report
    };

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    merged.to_writer(file)?;

    info!(
        "{} report: {}",
        if exists { "Updated" } else { "Created" },
        path.display()
    );
    Ok(merged)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
