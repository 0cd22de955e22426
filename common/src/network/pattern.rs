//! # Specification Parser
//!
//! Turns one human-typed address specification into an [`AddressRange`].
//!
//! Supported forms, tried in this order:
//! * **Whole-address range**: `10.0.0.1-10.0.0.5`, paired octet by octet.
//! * **Octet-wise pattern**: `10.*.*.1`, `10.0-5.1.1`, any mix of `n`, `*` and `m-n`.
//! * **Single address**: `192.168.1.1`, leading zeros allowed (`010.08.1.1`).
//!
//! Cells in the institution table carry stray annotation text, so every
//! character other than digits, `.`, `*` and `-` is dropped before parsing.

use std::net::{Ipv4Addr, Ipv6Addr};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::network::range::{AddressRange, OctetBound};

/// Label some cells put in front of IPv6 entries.
const IPV6_MARKER: &str = "ipv6";
/// Label some cells put in front of IPv4 entries that repeat an address
/// listed elsewhere in the cell. Such lines are skipped.
const IPV4_MARKER: &str = "ipv4";

/// Why a raw specification was rejected. Each variant keeps the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("'{0}' is not an IPv4 specification")]
    UnsupportedFamily(String),
    #[error("malformed token '{token}' in '{spec}'")]
    MalformedToken { spec: String, token: String },
    #[error("malformed address range '{0}'")]
    MalformedRange(String),
    #[error("'{0}' contains no address")]
    EmptySpecification(String),
}

impl ParseError {
    /// The specification as it was given to the parser.
    pub fn spec(&self) -> &str {
        match self {
            Self::UnsupportedFamily(spec)
            | Self::MalformedRange(spec)
            | Self::EmptySpecification(spec) => spec,
            Self::MalformedToken { spec, .. } => spec,
        }
    }

    /// Blank and annotation-only lines are skipped, not reported.
    pub fn is_empty_spec(&self) -> bool {
        matches!(self, Self::EmptySpecification(_))
    }
}

/// Parses a single raw specification.
pub fn parse(raw: &str) -> Result<AddressRange, ParseError> {
    lazy_static! {
        static ref WHOLE_RANGE: Regex = Regex::new(
            r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})-(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$"
        )
        .expect("Not possible");
    }

    let cleaned = clean(raw)?;

    if let Some(caps) = WHOLE_RANGE.captures(&cleaned) {
        return parse_whole_range(raw, &caps);
    }

    if cleaned.contains('-') || cleaned.contains('*') {
        return parse_octet_pattern(raw, &cleaned);
    }

    parse_single(raw, &cleaned)
}

/// Trims, rejects other families, skips labelled repeats, strips
/// annotation characters.
fn clean(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();

    if is_ipv6(trimmed) {
        return Err(ParseError::UnsupportedFamily(raw.to_string()));
    }

    if strip_prefix_ignore_case(trimmed, IPV4_MARKER).is_some() {
        return Err(ParseError::EmptySpecification(raw.to_string()));
    }

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '*' | '-'))
        .collect();
    let kept = kept.trim_matches('.');

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseError::EmptySpecification(raw.to_string()));
    }

    Ok(kept.to_string())
}

fn is_ipv6(trimmed: &str) -> bool {
    strip_prefix_ignore_case(trimmed, IPV6_MARKER).is_some()
        || trimmed.contains("::")
        || trimmed.parse::<Ipv6Addr>().is_ok()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn parse_whole_range(raw: &str, caps: &Captures<'_>) -> Result<AddressRange, ParseError> {
    let malformed = || ParseError::MalformedRange(raw.to_string());

    let mut octets = [0u8; 8];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = caps
            .get(i + 1)
            .ok_or_else(malformed)?
            .as_str()
            .parse::<u8>()
            .map_err(|_| malformed())?;
    }

    let start = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let end = Ipv4Addr::new(octets[4], octets[5], octets[6], octets[7]);

    AddressRange::componentwise(start, end).ok_or_else(malformed)
}

fn parse_octet_pattern(raw: &str, cleaned: &str) -> Result<AddressRange, ParseError> {
    let tokens = split_quad(raw, cleaned)?;

    let mut bounds = [OctetBound::ANY; 4];
    for (bound, token) in bounds.iter_mut().zip(tokens) {
        *bound = parse_bound(raw, token)?;
    }

    Ok(AddressRange::new(bounds))
}

fn parse_bound(raw: &str, token: &str) -> Result<OctetBound, ParseError> {
    if token == "*" {
        return Ok(OctetBound::ANY);
    }

    match token.split_once('-') {
        Some((lo, hi)) => Ok(OctetBound::spanning(
            parse_octet(raw, lo, token)?,
            parse_octet(raw, hi, token)?,
        )),
        None => parse_octet(raw, token, token).map(OctetBound::exact),
    }
}

fn parse_single(raw: &str, cleaned: &str) -> Result<AddressRange, ParseError> {
    let tokens = split_quad(raw, cleaned)?;

    let mut octets = [0u8; 4];
    for (octet, token) in octets.iter_mut().zip(tokens) {
        *octet = parse_octet(raw, token, token)?;
    }

    Ok(AddressRange::single(Ipv4Addr::from(octets)))
}

/// Splits on `.` and insists on exactly four tokens.
fn split_quad<'a>(raw: &str, cleaned: &'a str) -> Result<[&'a str; 4], ParseError> {
    let tokens: Vec<&str> = cleaned.split('.').collect();
    <[&str; 4]>::try_from(tokens).map_err(|_| ParseError::MalformedToken {
        spec: raw.to_string(),
        token: cleaned.to_string(),
    })
}

/// Decimal digits only, value 0..=255. Leading zeros are dropped by the
/// integer round trip.
fn parse_octet(raw: &str, digits: &str, token: &str) -> Result<u8, ParseError> {
    let malformed = || ParseError::MalformedToken {
        spec: raw.to_string(),
        token: token.to_string(),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    digits.parse::<u8>().map_err(|_| malformed())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
