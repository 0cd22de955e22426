//! Loader for the institution table, exported from the subscriber
//! spreadsheet as CSV.
//!
//! Layout: `skip_rows` title rows, then a header row naming the columns.
//! `Institution` and `IP Addresses` are required, `Abbreviation` is optional.
//! Address cells may span several lines inside quotes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};

use crate::catalog::{CatalogBuild, InstitutionCatalog, SourceRecord};

const NAME_COLUMN: &str = "Institution";
const ABBREVIATION_COLUMN: &str = "Abbreviation";
const ADDRESSES_COLUMN: &str = "IP Addresses";

/// Reads the table at `path` into source records.
pub fn load_file(path: &Path, skip_rows: usize) -> Result<Vec<SourceRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    from_reader(file, skip_rows).with_context(|| format!("reading {}", path.display()))
}

/// Reads the table at `path` and builds the catalog from it.
pub fn load_catalog(path: &Path, skip_rows: usize) -> Result<CatalogBuild> {
    let sources = load_file(path, skip_rows)?;
    Ok(InstitutionCatalog::build(sources))
}

pub fn from_reader<R: Read>(reader: R, skip_rows: usize) -> Result<Vec<SourceRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.records();

    for row in 0..skip_rows {
        if records.next().transpose().context("CSV title rows")?.is_none() {
            bail!("Table ends after {row} rows, before its header");
        }
    }

    let headers = records
        .next()
        .transpose()
        .context("CSV header row")?
        .context("Table has no header row")?;

    let name_idx = column(&headers, NAME_COLUMN)?;
    let addresses_idx = column(&headers, ADDRESSES_COLUMN)?;
    let abbreviation_idx = column(&headers, ABBREVIATION_COLUMN).ok();

    let mut sources = Vec::new();
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let name = record.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }

        let abbreviation = abbreviation_idx
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
            .trim();

        let cells = record
            .get(addresses_idx)
            .filter(|cell| !cell.trim().is_empty())
            .map(|cell| vec![cell.to_string()])
            .unwrap_or_default();

        sources.push(SourceRecord {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            cells,
        });
    }

    Ok(sources)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .with_context(|| format!("Table missing '{name}' column"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
