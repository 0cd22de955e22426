//! # Institution Catalog
//!
//! Immutable mapping from institution identity to its [`RangeSet`], built
//! once per run from the institution table.

use std::net::Ipv4Addr;

use ipusage_common::network::{self, ParseError, RangeSet};
use tracing::{debug, warn};

/// Longest name usable as a report title; longer names fall back to the
/// abbreviation.
pub const MAX_REPORT_NAME_LEN: usize = 30;

/// One institution row as delivered by the table loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    pub name: String,
    pub abbreviation: String,
    /// Raw cells, each holding one specification per line.
    pub cells: Vec<String>,
}

/// Index of an institution inside its [`InstitutionCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstitutionId(pub usize);

#[derive(Debug, Clone)]
pub struct InstitutionRecord {
    name: String,
    abbreviation: String,
    ranges: RangeSet,
}

impl InstitutionRecord {
    pub fn new(name: impl Into<String>, abbreviation: impl Into<String>, ranges: RangeSet) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            ranges,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        network::matches(ip, &self.ranges)
    }

    /// Case-insensitive exact match on the name or the abbreviation.
    pub fn is_called(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.name.trim().eq_ignore_ascii_case(query)
            || self.abbreviation.trim().eq_ignore_ascii_case(query)
    }

    /// Name used to title this institution's report.
    pub fn report_name(&self) -> &str {
        if self.name.chars().count() > MAX_REPORT_NAME_LEN && !self.abbreviation.is_empty() {
            &self.abbreviation
        } else {
            &self.name
        }
    }
}

/// A specification rejected while building one institution's ranges.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub institution: String,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default)]
pub struct InstitutionCatalog {
    records: Vec<InstitutionRecord>,
}

/// Outcome of [`InstitutionCatalog::build`].
#[derive(Debug, Clone, Default)]
pub struct CatalogBuild {
    pub catalog: InstitutionCatalog,
    pub rejected: Vec<Rejection>,
}

impl InstitutionCatalog {
    /// Parses every institution's cells. A bad specification only costs its
    /// own line; an institution left without ranges is kept and never matches.
    pub fn build<I>(sources: I) -> CatalogBuild
    where
        I: IntoIterator<Item = SourceRecord>,
    {
        let mut build = CatalogBuild::default();

        for source in sources {
            let ranges = RangeSet::from_cells(&source.cells);

            if ranges.ranges.is_empty() {
                warn!("{} has no usable IP specification", source.name);
            } else {
                debug!("{}: {} ranges", source.name, ranges.ranges.len());
            }

            build
                .rejected
                .extend(ranges.rejected.into_iter().map(|error| Rejection {
                    institution: source.name.clone(),
                    error,
                }));

            build.catalog.records.push(InstitutionRecord::new(
                source.name,
                source.abbreviation,
                ranges.ranges,
            ));
        }

        build
    }

    pub fn from_records(records: Vec<InstitutionRecord>) -> Self {
        Self { records }
    }

    /// First institution whose name or abbreviation equals `query`, ignoring case.
    pub fn lookup(&self, query: &str) -> Option<(InstitutionId, &InstitutionRecord)> {
        self.records
            .iter()
            .position(|record| record.is_called(query))
            .map(|idx| (InstitutionId(idx), &self.records[idx]))
    }

    pub fn get(&self, id: InstitutionId) -> Option<&InstitutionRecord> {
        self.records.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstitutionId, &InstitutionRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| (InstitutionId(idx), record))
    }

    /// Every institution whose ranges hold `ip`.
    pub fn matching(&self, ip: Ipv4Addr) -> impl Iterator<Item = InstitutionId> + '_ {
        self.iter()
            .filter(move |(_, record)| record.matches(ip))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, abbreviation: &str, cell: &str) -> SourceRecord {
        SourceRecord {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            cells: vec![cell.to_string()],
        }
    }

    fn sample() -> CatalogBuild {
        InstitutionCatalog::build([
            source("McGill University", "mcgill.ca", "132.206.*.*\n132.216.*.*"),
            source("University of Toronto", "utoronto.ca", "128.100.0-255.*\n999.1.1.1"),
            source("Empty College", "empty.ca", "TBD"),
        ])
    }

    #[test]
    fn test_build_keeps_every_institution() {
        let build = sample();
        assert_eq!(build.catalog.len(), 3);
        assert_eq!(build.rejected.len(), 1);
        assert_eq!(build.rejected[0].institution, "University of Toronto");
    }

    #[test]
    fn test_lookup_by_name_or_abbreviation_ignoring_case() {
        let build = sample();
        let catalog = &build.catalog;

        let (id, record) = catalog.lookup("mcgill university").unwrap();
        assert_eq!(id, InstitutionId(0));
        assert_eq!(record.abbreviation(), "mcgill.ca");

        let (id, _) = catalog.lookup("UTORONTO.CA").unwrap();
        assert_eq!(id, InstitutionId(1));
    }

    #[test]
    fn test_lookup_not_found() {
        let build = sample();
        assert!(build.catalog.lookup("Harvard").is_none());
        assert!(build.catalog.lookup("McGill").is_none());
        assert!(build.catalog.lookup("").is_none());
    }

    #[test]
    fn test_empty_institution_never_matches() {
        let build = sample();
        let (_, record) = build.catalog.lookup("empty.ca").unwrap();
        assert!(record.ranges().is_empty());
        assert!(!record.matches(Ipv4Addr::new(132, 206, 1, 1)));
    }

    #[test]
    fn test_matching_institutions() {
        let build = sample();
        let hits: Vec<_> = build.catalog.matching(Ipv4Addr::new(128, 100, 7, 9)).collect();
        assert_eq!(hits, vec![InstitutionId(1)]);
        assert_eq!(build.catalog.matching(Ipv4Addr::new(8, 8, 8, 8)).count(), 0);
    }

    #[test]
    fn test_report_name_falls_back_to_abbreviation() {
        let short = InstitutionRecord::new("McGill University", "mcgill.ca", RangeSet::default());
        assert_eq!(short.report_name(), "McGill University");

        let long = InstitutionRecord::new(
            "Bibliothèque et Archives nationales du Québec",
            "banq.qc.ca",
            RangeSet::default(),
        );
        assert_eq!(long.report_name(), "banq.qc.ca");
    }
}
