//! # Range Sets
//!
//! All address ranges belonging to one institution, matched with OR
//! semantics. Built from the raw text cells of the institution table, where
//! each line is an independent specification.

use std::net::Ipv4Addr;

use tracing::{debug, trace};

use crate::network::pattern::{self, ParseError};
use crate::network::range::AddressRange;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<AddressRange>,
}

/// Outcome of building a [`RangeSet`]: the accepted ranges plus every
/// rejected specification. Rejections never suppress sibling lines.
#[derive(Debug, Clone, Default)]
pub struct RangeSetBuild {
    pub ranges: RangeSet,
    pub rejected: Vec<ParseError>,
}

impl RangeSet {
    pub fn new(ranges: Vec<AddressRange>) -> Self {
        Self { ranges }
    }

    /// Parses each line on its own. Lines without a digit are skipped
    /// silently; other failures are collected in [`RangeSetBuild::rejected`].
    pub fn build<I, S>(lines: I) -> RangeSetBuild
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut build = RangeSetBuild::default();

        for line in lines {
            let line = line.as_ref();
            if !line.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }

            match pattern::parse(line) {
                Ok(range) => build.ranges.ranges.push(range),
                Err(err) if err.is_empty_spec() => {
                    trace!("Skipping line without a usable address: {line:?}");
                }
                Err(err) => {
                    debug!("Rejected specification: {err}");
                    build.rejected.push(err);
                }
            }
        }

        build
    }

    /// Like [`RangeSet::build`], for whole cells that hold one
    /// specification per line.
    pub fn from_cells<I, S>(cells: I) -> RangeSetBuild
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = cells
            .into_iter()
            .flat_map(|cell| split_cell(cell.as_ref()))
            .collect();
        Self::build(lines)
    }

    /// OR across ranges, short-circuiting on the first hit.
    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<AddressRange> for RangeSet {
    fn from_iter<T: IntoIterator<Item = AddressRange>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a AddressRange;
    type IntoIter = std::slice::Iter<'a, AddressRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Splits on `\n`, `\r\n` and lone `\r`.
fn split_cell(cell: &str) -> Vec<String> {
    cell.split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
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
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_build_keeps_valid_line_next_to_malformed_one() {
        let build = RangeSet::build(["192.168.1.1", "192.168.1.999"]);
        assert_eq!(build.ranges.len(), 1);
        assert_eq!(
            build.ranges.iter().next(),
            Some(&AddressRange::single(Ipv4Addr::new(192, 168, 1, 1)))
        );
        assert_eq!(build.rejected.len(), 1);
        assert_eq!(build.rejected[0].spec(), "192.168.1.999");
    }

    #[test]
    fn test_build_skips_blank_and_annotation_lines_without_rejecting() {
        let build = RangeSet::build(["", "  ", "Main campus:", "10.0.0.1"]);
        assert_eq!(build.ranges.len(), 1);
        assert!(build.rejected.is_empty());
    }

    #[test]
    fn test_build_reports_ipv6_lines() {
        let build = RangeSet::build(["IPv6: 2001:db8::1", "10.*.*.*"]);
        assert_eq!(build.ranges.len(), 1);
        assert!(matches!(build.rejected[0], ParseError::UnsupportedFamily(_)));
    }

    #[test]
    fn test_build_skips_ipv4_labelled_lines_without_rejecting() {
        let build = RangeSet::build(["IPv4: 203.0.113.7"]);
        assert!(build.ranges.is_empty());
        assert!(build.rejected.is_empty());
        assert!(!build.ranges.matches(Ipv4Addr::new(203, 0, 113, 7)));
    }

    #[test]
    fn test_from_cells_splits_line_breaks() {
        let cell = "132.206.*.*\r\n132.216.0-10.*\rnotes\n\n10.0.0.1-10.0.0.9";
        let build = RangeSet::from_cells([cell, "8.8.8.8"]);
        assert_eq!(build.ranges.len(), 4);
        assert!(build.rejected.is_empty());
    }

    #[test]
    fn test_matches_bounding_box() {
        let set: RangeSet = ["192.168.0.0-192.168.255.255"]
            .iter()
            .map(|s| s.parse::<AddressRange>().unwrap())
            .collect();
        assert!(set.matches(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!set.matches(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let build = RangeSet::build(["garbage 999.1", "IPv6: ::1", ""]);
        assert!(build.ranges.is_empty());
        assert!(!build.ranges.matches(Ipv4Addr::new(0, 0, 0, 0)));
        assert!(!build.ranges.matches(Ipv4Addr::new(255, 255, 255, 255)));
    }

    #[quickcheck]
    fn prop_empty_set_never_matches(ip: u32) -> bool {
        !RangeSet::default().matches(Ipv4Addr::from(ip))
    }

    #[quickcheck]
    fn prop_set_matches_iff_some_member_does(a: u32, b: u32, ip: u32) -> bool {
        let set = RangeSet::new(vec![
            AddressRange::single(Ipv4Addr::from(a)),
            AddressRange::single(Ipv4Addr::from(b)),
        ]);
        set.matches(Ipv4Addr::from(ip)) == (ip == a || ip == b)
    }
}
