use colored::*;
use ipusage_common::network::{self, RangeKind};

use crate::terminal::{colors, print};

pub fn parse(specs: &[String]) -> anyhow::Result<()> {
    for spec in specs {
        match network::parse(spec) {
            Ok(range) => {
                let kind = match range.kind() {
                    RangeKind::SingleAddress(_) => "single",
                    RangeKind::BoundedRange { .. } => "range",
                };
                print::print_status(format!(
                    "{} {} {}",
                    spec.color(colors::TEXT_DEFAULT),
                    "=>".color(colors::SEPARATOR),
                    format!("{range} ({kind}, {} addresses)", range.len()).color(colors::IPV4_ADDR)
                ));
            }
            Err(err) => {
                print::print_status(format!(
                    "{} {} {}",
                    spec.color(colors::TEXT_DEFAULT),
                    "=>".color(colors::SEPARATOR),
                    err.to_string().color(colors::REJECTED)
                ));
            }
        }
    }
    Ok(())
}
