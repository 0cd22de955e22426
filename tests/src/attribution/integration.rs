use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use ipusage_common::config::Config;
use ipusage_common::network::{self, AddressRange, ParseError, RangeSet};
use ipusage_core::attribution::LogAttributor;
use ipusage_core::catalog::InstitutionId;
use ipusage_core::logs::{ContentFilter, ingest};
use ipusage_core::report::{self, UsageReport};
use ipusage_core::institutions;

const TABLE: &str = "\
Canadiana subscribers,,
Last reviewed March 2024,,
Institution,Abbreviation,IP Addresses
McGill University,mcgill.ca,\"132.206.*.*
132.216.0-127.*
IPv6: 2620:0:1a10::/48
132.999.1.1\"
University of Toronto,utoronto.ca,128.100.0.0-128.100.255.255
Nowhere College,nowhere.ca,see attached
";

fn log_line(ip: &str, day: u32, site: &str, request: &str) -> String {
    format!(
        "Mar {day} 10:15:02 proxy01 haproxy[1234]: {ip}:51544 [0{day}/Mar/2024:10:15:02.114] \
         https~ cap/local 0/0/1/30/31 200 5120 - - ---- 12/12/0/0/0 0/0 \
         {{https|{site}}} \"GET {request} HTTP/1.1\""
    )
}

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("ipusage_it_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

/// Table with one bad line per institution does not lose the good lines.
#[test]
fn catalog_from_table_keeps_valid_ranges() {
    let sources = institutions::from_reader(TABLE.as_bytes(), 2).unwrap();
    let build = ipusage_core::catalog::InstitutionCatalog::build(sources);

    assert_eq!(build.catalog.len(), 3);

    let (_, mcgill) = build.catalog.lookup("MCGILL.CA").unwrap();
    assert_eq!(mcgill.ranges().len(), 2);

    let kinds: Vec<bool> = build
        .rejected
        .iter()
        .map(|r| matches!(r.error, ParseError::UnsupportedFamily(_)))
        .collect();
    assert_eq!(kinds, vec![true, false]);

    let (_, nowhere) = build.catalog.lookup("Nowhere College").unwrap();
    assert!(nowhere.ranges().is_empty());
}

#[test]
fn parse_examples_match_expected_boxes() {
    let cases = [
        ("192.168.1.1", [192, 168, 1, 1], [192, 168, 1, 1]),
        ("10.*.*.1", [10, 0, 0, 1], [10, 255, 255, 1]),
        ("10.0-5.1.1", [10, 0, 1, 1], [10, 5, 1, 1]),
        ("10.0.0.1-10.0.0.5", [10, 0, 0, 1], [10, 0, 0, 5]),
        ("010.08.1.1", [10, 8, 1, 1], [10, 8, 1, 1]),
    ];

    for (text, lo, hi) in cases {
        let range = network::parse(text).unwrap();
        assert_eq!(range.start(), Ipv4Addr::from(lo), "{text}");
        assert_eq!(range.end(), Ipv4Addr::from(hi), "{text}");
        assert_eq!(range.to_string().parse::<AddressRange>(), Ok(range), "{text}");
    }

    let set = RangeSet::build(["192.168.0.0-192.168.255.255"]).ranges;
    assert!(network::matches(Ipv4Addr::new(192, 168, 1, 1), &set));
    assert!(!network::matches(Ipv4Addr::new(8, 8, 8, 8), &set));
}

/// Raw logs in, per-day report out, merged into the report store.
#[test]
fn raw_logs_to_report_end_to_end() {
    let dir = tmp_dir("end_to_end");
    let log_path = dir.join("haproxy-traffic.log");
    let lines = [
        log_line("132.206.4.4", 4, "www.canadiana.ca", "/view/oocihm.1"),
        log_line("132.206.4.5", 4, "gac.canadiana.ca", "/view/oocihm.2"),
        log_line("132.216.200.1", 4, "www.canadiana.ca", "/view/oocihm.3"),
        log_line("132.206.4.4", 5, "heritage.canadiana.ca", "/view/c8_1"),
        log_line("132.206.4.4", 5, "www.canadiana.ca", "/search?q=x"),
        log_line("128.100.3.3", 5, "parl.canadiana.ca", "/view/sessional"),
        "truncated line".to_string(),
    ];
    fs::write(&log_path, lines.join("\n")).unwrap();

    let table_path = dir.join("IP_addresses.csv");
    fs::write(&table_path, TABLE).unwrap();

    let cfg = Config {
        institutions_file: table_path,
        report_dir: dir.join("reports"),
        ..Config::default()
    };

    let build = institutions::load_catalog(&cfg.institutions_file, cfg.skip_rows).unwrap();
    let (id, record) = build.catalog.lookup("McGill University").unwrap();
    assert_eq!(id, InstitutionId(0));

    let filter = ContentFilter::new(&cfg);
    let mut batch = ingest::load_file(&log_path).unwrap();
    assert_eq!(batch.skipped, 1);
    batch.retain(&filter);
    assert_eq!(batch.rows.len(), 5);

    let tally = LogAttributor::new(&build.catalog).attribute(&batch.rows, report::day_key(&filter));
    assert_eq!(tally.total(InstitutionId(0)), 3);
    assert_eq!(tally.total(InstitutionId(1)), 1);

    let usage = UsageReport::from_tally(&tally, id, cfg.site_labels());
    let path = report::report_path(&cfg.report_dir, record);
    let written = report::update_report(&path, usage).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "Month,Day,Heritage,Canadiana,GAC,Parl,Total\nMar,4,0,1,1,0,2\nMar,5,1,0,0,0,1\n"
    );
    assert_eq!(written.total(), 3);
}

/// Processed CSV written by the cleaning step reads back into the same rows.
#[test]
fn processed_logs_feed_the_report() {
    let dir = tmp_dir("processed");
    let raw = [
        log_line("128.100.3.3", 7, "parl.canadiana.ca", "/view/sessional"),
        log_line("128.100.3.4", 7, "parl.canadiana.ca", "/view/sessional"),
    ]
    .join("\n");

    let filter = ContentFilter::new(&Config::default());
    let mut batch = ingest::read_raw(raw.as_bytes()).unwrap();
    batch.retain(&filter);

    let processed = dir.join("logs_2024-03-08.csv");
    ingest::write_processed(fs::File::create(&processed).unwrap(), &batch.rows).unwrap();

    let reread = ingest::load_file(&processed).unwrap();
    assert_eq!(reread.rows, batch.rows);

    let sources = institutions::from_reader(TABLE.as_bytes(), 2).unwrap();
    let catalog = ipusage_core::catalog::InstitutionCatalog::build(sources).catalog;
    let (id, _) = catalog.lookup("utoronto.ca").unwrap();

    let tally = LogAttributor::new(&catalog).attribute_institution(id, &reread.rows, report::day_key(&filter));
    let usage = UsageReport::from_tally(&tally, id, Config::default().site_labels());
    assert_eq!(usage.rows().len(), 1);
    assert_eq!(usage.rows()[0].counts, vec![0, 0, 0, 2]);
}

/// Every regular file of a folder lands in one processed CSV; nested
/// folders are left alone.
#[test]
fn folder_of_logs_cleans_into_one_processed_file() {
    let dir = tmp_dir("clean_folder");
    let logs = dir.join("logs");
    fs::create_dir_all(logs.join("archive")).unwrap();

    fs::write(
        logs.join("haproxy.log"),
        [
            log_line("132.206.4.4", 3, "www.canadiana.ca", "/view/oocihm.1"),
            log_line("132.206.4.4", 3, "www.canadiana.ca", "/search?q=x"),
        ]
        .join("\n"),
    )
    .unwrap();
    fs::write(
        logs.join("haproxy.log.1"),
        [
            log_line("128.100.3.3", 2, "parl.canadiana.ca", "/view/sessional"),
            "short line".to_string(),
        ]
        .join("\n"),
    )
    .unwrap();
    fs::write(
        logs.join("archive").join("haproxy.log.9"),
        log_line("10.0.0.1", 1, "gac.canadiana.ca", "/view/oocihm.9"),
    )
    .unwrap();

    let filter = ContentFilter::new(&Config::default());
    let files = ingest::list_files(&logs).unwrap();
    assert_eq!(files.len(), 2);

    let mut combined = ingest::LogBatch::default();
    for path in &files {
        let mut batch = ingest::load_file(path).unwrap();
        batch.retain(&filter);
        combined.extend(batch);
    }
    assert_eq!(combined.skipped, 1);

    let processed = dir.join("processed").join("logs_2024-03-04.csv");
    fs::create_dir_all(processed.parent().unwrap()).unwrap();
    ingest::write_processed(fs::File::create(&processed).unwrap(), &combined.rows).unwrap();

    let reread = ingest::load_file(&processed).unwrap();
    let seen: Vec<(&str, u32)> = reread
        .rows
        .iter()
        .map(|row| (row.client_ip.as_str(), row.day))
        .collect();
    assert_eq!(seen, [("132.206.4.4", 3), ("128.100.3.3", 2)]);
}
