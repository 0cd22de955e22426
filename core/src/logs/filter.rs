//! Narrows log rows down to document views served by the configured backend.

use ipusage_common::config::{Config, Site};

use super::LogRow;

/// Substring every counted HTTP request contains.
const VIEW_SEGMENT: &str = "view/";

#[derive(Debug, Clone)]
pub struct ContentFilter {
    server_name: String,
    sites: Vec<Site>,
    view_marker: String,
}

impl ContentFilter {
    pub fn new(cfg: &Config) -> Self {
        Self {
            server_name: cfg.server_name.clone(),
            sites: cfg.sites.clone(),
            view_marker: cfg.view_marker.clone(),
        }
    }

    /// Served by the configured backend, aimed at a known site or carrying
    /// the view marker, and a request for a `view/` page.
    pub fn keeps(&self, row: &LogRow) -> bool {
        row.server_name == self.server_name
            && (self.site_index(row).is_some() || row.http_request.contains(&self.view_marker))
            && row.http_request.contains(VIEW_SEGMENT)
    }

    /// Position in the configured site list of the site `row` was made against.
    pub fn site_index(&self, row: &LogRow) -> Option<usize> {
        self.sites
            .iter()
            .position(|site| row.request_path.contains(&site.path))
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn apply(&self, rows: Vec<LogRow>) -> Vec<LogRow> {
        rows.into_iter().filter(|row| self.keeps(row)).collect()
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

    fn row(server: &str, path: &str, request: &str) -> LogRow {
        LogRow {
            month: "Mar".into(),
            day: 4,
            time: "10:15:02".into(),
            client_ip: "132.206.9.14".into(),
            server_name: server.into(),
            request_path: path.into(),
            http_request: request.into(),
        }
    }

    #[test]
    fn test_keeps_site_views_on_configured_server() {
        let filter = ContentFilter::new(&Config::default());
        assert!(filter.keeps(&row(
            "cap/local",
            "{https|gac.canadiana.ca}",
            "\"GET /view/oocihm.1 HTTP/1.1\""
        )));
    }

    #[test]
    fn test_rejects_other_servers() {
        let filter = ContentFilter::new(&Config::default());
        assert!(!filter.keeps(&row(
            "cap/other",
            "{https|gac.canadiana.ca}",
            "\"GET /view/oocihm.1 HTTP/1.1\""
        )));
    }

    #[test]
    fn test_rejects_non_view_requests() {
        let filter = ContentFilter::new(&Config::default());
        assert!(!filter.keeps(&row(
            "cap/local",
            "{https|www.canadiana.ca}",
            "\"GET /search?q=maps HTTP/1.1\""
        )));
    }

    #[test]
    fn test_view_marker_stands_in_for_unknown_site() {
        let filter = ContentFilter::new(&Config::default());
        let r = row("cap/local", "{https|beta.canadiana.ca}", "\"GET /view/x HTTP/1.1\"");
        assert!(filter.keeps(&r));
        assert_eq!(filter.site_index(&r), None);
    }

    #[test]
    fn test_site_index_follows_config_order() {
        let filter = ContentFilter::new(&Config::default());
        let r = row("cap/local", "{https|parl.canadiana.ca}", "\"GET /view/x HTTP/1.1\"");
        assert_eq!(filter.site_index(&r), Some(3));
        assert_eq!(filter.sites()[3].label, "Parl");
    }
}
