use anyhow::bail;
use colored::*;
use ipusage_common::config::Config;
use ipusage_common::network::RangeKind;
use ipusage_core::institutions;

use crate::terminal::{colors, print};

pub fn check(institution: &str, cfg: &Config) -> anyhow::Result<()> {
    let build = institutions::load_catalog(&cfg.institutions_file, cfg.skip_rows)?;

    let Some((_, record)) = build.catalog.lookup(institution) else {
        bail!("Institution `{institution}` not found");
    };

    print::header("institution");
    print::aligned_line("Name", record.name(), 12);
    print::aligned_line("Abbreviation", record.abbreviation(), 12);
    print::aligned_line("Report", record.report_name(), 12);

    print::header("accepted");
    if record.ranges().is_empty() {
        print::no_results();
    }
    for (idx, range) in record.ranges().iter().enumerate() {
        print::tree_head(idx, &range.to_string());
        let detail: Vec<(String, ColoredString)> = match range.kind() {
            RangeKind::SingleAddress(ip) => {
                vec![("Address".to_string(), ip.to_string().color(colors::IPV4_ADDR))]
            }
            RangeKind::BoundedRange { start, end } => vec![
                ("Lowest".to_string(), start.to_string().color(colors::IPV4_ADDR)),
                ("Highest".to_string(), end.to_string().color(colors::IPV4_ADDR)),
                ("Count".to_string(), range.len().to_string().normal()),
            ],
        };
        print::as_tree_one_level(detail);
    }

    let rejected: Vec<_> = build
        .rejected
        .iter()
        .filter(|r| r.institution == record.name())
        .collect();
    if !rejected.is_empty() {
        print::header("rejected");
        for rejection in rejected {
            print::print_status(format!("{}", rejection.error.to_string().color(colors::REJECTED)));
        }
    }

    print::end_of_program();
    Ok(())
}
