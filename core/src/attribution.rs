//! # Log Attribution
//!
//! Counts log rows per institution. Rows are spread over the rayon pool;
//! each worker folds into its own [`UsageTally`] and the partial tallies are
//! summed at the end, so no counter is shared between threads.

use std::collections::HashMap;
use std::hash::Hash;

use ipusage_common::network::client;
use rayon::prelude::*;
use tracing::debug;

use crate::catalog::{InstitutionCatalog, InstitutionId, InstitutionRecord};
use crate::logs::LogRow;

/// Matching-row counts keyed by institution and a caller-chosen bucket.
#[derive(Debug, Clone)]
pub struct UsageTally<K> {
    counts: HashMap<(InstitutionId, K), u64>,
    rows: u64,
    unparsable: u64,
}

impl<K> Default for UsageTally<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
            rows: 0,
            unparsable: 0,
        }
    }
}

impl<K: Eq + Hash> UsageTally<K> {
    pub fn record(&mut self, id: InstitutionId, key: K) {
        *self.counts.entry((id, key)).or_insert(0) += 1;
    }

    /// Sums two tallies. Order of merging does not change the result.
    pub fn merge(mut self, other: Self) -> Self {
        for (entry, count) in other.counts {
            *self.counts.entry(entry).or_insert(0) += count;
        }
        self.rows += other.rows;
        self.unparsable += other.unparsable;
        self
    }

    pub fn get(&self, id: InstitutionId, key: K) -> u64 {
        self.counts.get(&(id, key)).copied().unwrap_or(0)
    }

    /// All matching rows of one institution, across buckets.
    pub fn total(&self, id: InstitutionId) -> u64 {
        self.counts
            .iter()
            .filter(|((owner, _), _)| *owner == id)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstitutionId, &K, u64)> {
        self.counts
            .iter()
            .map(|((id, key), count)| (*id, key, *count))
    }

    /// Rows examined, including unparsable ones.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Rows whose client address could not be read; they match nothing.
    pub fn unparsable(&self) -> u64 {
        self.unparsable
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub struct LogAttributor<'a> {
    catalog: &'a InstitutionCatalog,
}

impl<'a> LogAttributor<'a> {
    pub fn new(catalog: &'a InstitutionCatalog) -> Self {
        Self { catalog }
    }

    /// Tests every row against every institution in the catalog.
    pub fn attribute<K, F>(&self, rows: &[LogRow], bucket: F) -> UsageTally<K>
    where
        K: Eq + Hash + Clone + Send,
        F: Fn(&LogRow) -> K + Sync,
    {
        let candidates: Vec<_> = self.catalog.iter().collect();
        tally(&candidates, rows, bucket)
    }

    /// Tests every row against a single institution. Unknown ids count nothing.
    pub fn attribute_institution<K, F>(
        &self,
        id: InstitutionId,
        rows: &[LogRow],
        bucket: F,
    ) -> UsageTally<K>
    where
        K: Eq + Hash + Clone + Send,
        F: Fn(&LogRow) -> K + Sync,
    {
        let candidates: Vec<_> = self
            .catalog
            .get(id)
            .map(|record| (id, record))
            .into_iter()
            .collect();
        tally(&candidates, rows, bucket)
    }
}

fn tally<K, F>(
    candidates: &[(InstitutionId, &InstitutionRecord)],
    rows: &[LogRow],
    bucket: F,
) -> UsageTally<K>
where
    K: Eq + Hash + Clone + Send,
    F: Fn(&LogRow) -> K + Sync,
{
    let tally = rows
        .par_iter()
        .fold(UsageTally::default, |mut tally, row| {
            tally.rows += 1;

            let Ok(ip) = client::parse_client_addr(&row.client_ip) else {
                tally.unparsable += 1;
                return tally;
            };

            let mut key: Option<K> = None;
            for (id, record) in candidates {
                if record.matches(ip) {
                    let bucket_key = key.get_or_insert_with(|| bucket(row));
                    tally.record(*id, bucket_key.clone());
                }
            }
            tally
        })
        .reduce(UsageTally::default, UsageTally::merge);

    debug!(
        "Attributed {} rows against {} institutions ({} unparsable)",
        tally.rows,
        candidates.len(),
        tally.unparsable
    );
    tally
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
