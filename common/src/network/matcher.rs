//! Membership test of a client address against a [`RangeSet`].
//!
//! Pure predicates over immutable data, safe to call from any number of
//! threads at once.

use std::net::Ipv4Addr;

use crate::network::range_set::RangeSet;

/// True if any range in `ranges` holds `ip` in all four octet bounds.
pub fn matches(ip: Ipv4Addr, ranges: &RangeSet) -> bool {
    ranges.matches(ip)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
