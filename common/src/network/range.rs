//! # Address Range Model
//!
//! Canonical representation of one institution address specification.
//!
//! Every accepted specification, whether it was typed as a single address,
//! a wildcard pattern, an octet-wise dash range or a start-end pair, collapses
//! into the same four inclusive per-octet bounds. Matching is a bounding-box
//! test over those bounds, never a linear 32-bit interval test.

use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::network::pattern::{self, ParseError};

/// Inclusive bounds for a single octet position, `lo <= hi` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OctetBound {
    lo: u8,
    hi: u8,
}

impl OctetBound {
    /// The wildcard bound, `0..=255`.
    pub const ANY: OctetBound = OctetBound { lo: 0, hi: u8::MAX };

    /// Returns `None` when `lo > hi`.
    pub fn new(lo: u8, hi: u8) -> Option<Self> {
        (lo <= hi).then_some(Self { lo, hi })
    }

    /// Orders the two ends, so `10-5` and `5-10` yield the same bound.
    pub fn spanning(a: u8, b: u8) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn exact(value: u8) -> Self {
        Self {
            lo: value,
            hi: value,
        }
    }

    pub fn lo(&self) -> u8 {
        self.lo
    }

    pub fn hi(&self) -> u8 {
        self.hi
    }

    pub fn is_exact(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, octet: u8) -> bool {
        self.lo <= octet && octet <= self.hi
    }

    /// Number of octet values covered, between 1 and 256.
    pub fn width(&self) -> u16 {
        u16::from(self.hi) - u16::from(self.lo) + 1
    }
}

impl Display for OctetBound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "{}", self.lo)
        } else if *self == Self::ANY {
            write!(f, "*")
        } else {
            write!(f, "{}-{}", self.lo, self.hi)
        }
    }
}

/// Tagged view over an [`AddressRange`].
///
/// Both cases share the same four-bound storage, so the matcher never needs
/// to look at the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    SingleAddress(Ipv4Addr),
    BoundedRange { start: Ipv4Addr, end: Ipv4Addr },
}

/// Four inclusive octet bounds. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    bounds: [OctetBound; 4],
}

impl AddressRange {
    pub fn new(bounds: [OctetBound; 4]) -> Self {
        Self { bounds }
    }

    pub fn single(addr: Ipv4Addr) -> Self {
        Self {
            bounds: addr.octets().map(OctetBound::exact),
        }
    }

    /// Pairs two addresses octet by octet: `lo[i] = start[i]`, `hi[i] = end[i]`.
    ///
    /// Returns `None` if any start octet exceeds its end octet; the pair is
    /// never swapped.
    pub fn componentwise(start: Ipv4Addr, end: Ipv4Addr) -> Option<Self> {
        let (start, end) = (start.octets(), end.octets());
        let mut bounds = [OctetBound::ANY; 4];
        for (i, bound) in bounds.iter_mut().enumerate() {
            *bound = OctetBound::new(start[i], end[i])?;
        }
        Some(Self { bounds })
    }

    pub fn bounds(&self) -> &[OctetBound; 4] {
        &self.bounds
    }

    /// Lowest address inside the box.
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.bounds.map(|b| b.lo))
    }

    /// Highest address inside the box.
    pub fn end(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.bounds.map(|b| b.hi))
    }

    pub fn is_single(&self) -> bool {
        self.bounds.iter().all(OctetBound::is_exact)
    }

    pub fn kind(&self) -> RangeKind {
        if self.is_single() {
            RangeKind::SingleAddress(self.start())
        } else {
            RangeKind::BoundedRange {
                start: self.start(),
                end: self.end(),
            }
        }
    }

    /// Bounding-box membership: every octet of `ip` must sit inside its bound.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.bounds
            .iter()
            .zip(ip.octets())
            .all(|(bound, octet)| bound.contains(octet))
    }

    /// Count of distinct addresses inside the box.
    pub fn len(&self) -> u64 {
        self.bounds.iter().map(|b| u64::from(b.width())).product()
    }
}

impl From<Ipv4Addr> for AddressRange {
    fn from(addr: Ipv4Addr) -> Self {
        Self::single(addr)
    }
}

impl Display for AddressRange {
    /// Canonical text: a dotted quad for single addresses, otherwise one
    /// `n`, `*` or `m-n` token per octet. Parsing this text yields `self`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = &self.bounds;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

impl FromStr for AddressRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        pattern::parse(s)
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
