pub mod client;
pub mod matcher;
pub mod pattern;
pub mod range;
pub mod range_set;

pub use matcher::matches;
pub use pattern::{ParseError, parse};
pub use range::{AddressRange, OctetBound, RangeKind};
pub use range_set::{RangeSet, RangeSetBuild};
