//! Listing presentation
//!
//! Renders a [`Listing`] as an HTML page or a JSON document. Holds no
//! filesystem or safety logic; it only formats what the browsing core
//! produced.

use crate::browse::{Entry, Listing};
use crate::http::url::encode_relative;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Everything the listing page shows
#[derive(Debug, Serialize)]
pub struct ListingPage<'a> {
    /// Decoded request path without leading/trailing slashes
    pub path: &'a str,
    pub entries: &'a Listing,
    pub local_addr: &'a str,
    pub network_addr: &'a str,
}

impl ListingPage<'_> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_html(&self) -> String {
        let title = if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path)
        };

        let mut html = String::with_capacity(2048);
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("    <meta charset=\"utf-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(html, "    <title>Index of {}</title>", escape_html(&title));
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n<div class=\"container\">\n");

        let _ = writeln!(html, "<h1>{}</h1>", self.breadcrumbs());
        let _ = writeln!(
            html,
            "<p class=\"addr\">Local: <code>{}</code> &middot; Network: <code>{}</code></p>",
            escape_html(self.local_addr),
            escape_html(self.network_addr)
        );

        html.push_str("<table>\n<thead><tr><th>Name</th><th>Type</th><th>Size</th></tr></thead>\n<tbody>\n");
        if !self.path.is_empty() {
            let parent = Path::new(self.path).parent().unwrap_or_else(|| Path::new(""));
            let _ = writeln!(
                html,
                "<tr><td><a href=\"{}\">..</a></td><td>dir</td><td></td></tr>",
                escape_html(&encode_relative(parent))
            );
        }
        for entry in self.entries.entries() {
            html.push_str(&entry_row(entry));
        }
        if self.entries.is_empty() {
            html.push_str("<tr><td colspan=\"3\" class=\"empty\">Empty directory</td></tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</div>\n</body>\n</html>\n");
        html
    }

    /// `/ docs / sub` with each prefix linked
    fn breadcrumbs(&self) -> String {
        let mut out = String::from("<a href=\"/\">/</a>");
        let mut prefix = std::path::PathBuf::new();
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            prefix.push(segment);
            let _ = write!(
                out,
                " <a href=\"{}\">{}</a> /",
                escape_html(&encode_relative(&prefix)),
                escape_html(segment)
            );
        }
        out
    }
}

fn entry_row(entry: &Entry) -> String {
    let (kind, size) = if entry.is_file() {
        ("file", entry.size.map(human_size).unwrap_or_default())
    } else {
        ("dir", String::new())
    };
    let suffix = if entry.is_file() { "" } else { "/" };
    format!(
        "<tr><td><a href=\"{}\">{}{suffix}</a></td><td>{kind}</td><td>{}</td></tr>\n",
        escape_html(&entry.url),
        escape_html(&entry.name),
        size
    )
}

/// Format a byte count: `512 B`, `1.5 KB`, ... `PB` beyond terabytes
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    for unit in &UNITS[1..] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} PB")
}

/// Escape text for HTML element and attribute content
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r"    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f5f6fa; color: #222; }
        .container { max-width: 900px; margin: 40px auto; padding: 24px; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
        h1 { font-size: 1.4em; word-break: break-all; }
        .addr { color: #666; font-size: 0.9em; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #eee; }
        td:last-child, th:last-child { text-align: right; white-space: nowrap; }
        a { color: #3b5bdb; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .empty { color: #999; text-align: center; }
    </style>
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::EntryKind;

    fn sample_listing() -> Listing {
        Listing::from_entries(vec![
            Entry {
                name: "docs".to_string(),
                kind: EntryKind::Directory,
                size: None,
                url: "/docs".to_string(),
            },
            Entry {
                name: "<b>.txt".to_string(),
                kind: EntryKind::File,
                size: Some(2048),
                url: "/download/%3Cb%3E.txt".to_string(),
            },
        ])
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(5), "5 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1.0 KB");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(human_size(3 * 1024_u64.pow(4)), "3.0 TB");
        assert_eq!(human_size(2 * 1024_u64.pow(5)), "2.0 PB");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_html_page() {
        let listing = sample_listing();
        let page = ListingPage {
            path: "docs/sub",
            entries: &listing,
            local_addr: "http://127.0.0.1:8000",
            network_addr: "http://192.168.1.20:8000",
        };
        let html = page.to_html();
        assert!(html.contains("<title>Index of /docs/sub</title>"));
        assert!(html.contains("<a href=\"/docs\">docs</a> / <a href=\"/docs/sub\">sub</a>"));
        assert!(html.contains("<a href=\"/docs\">..</a>"));
        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(html.contains("2.0 KB"));
        assert!(html.contains("http://192.168.1.20:8000"));
        assert!(!html.contains("<b>.txt"));
    }

    #[test]
    fn test_root_page_has_no_parent_link() {
        let listing = Listing::default();
        let page = ListingPage {
            path: "",
            entries: &listing,
            local_addr: "http://127.0.0.1:8000",
            network_addr: "http://127.0.0.1:8000",
        };
        let html = page.to_html();
        assert!(!html.contains(">..</a>"));
        assert!(html.contains("Empty directory"));
    }

    #[test]
    fn test_json_page() {
        let listing = sample_listing();
        let page = ListingPage {
            path: "",
            entries: &listing,
            local_addr: "http://127.0.0.1:8000",
            network_addr: "http://10.0.0.2:8000",
        };
        let value: serde_json::Value =
            serde_json::from_str(&page.to_json().expect("json")).expect("parse");
        assert_eq!(value["path"], "");
        assert_eq!(value["entries"][0]["kind"], "file");
        assert_eq!(value["entries"][0]["size"], 2048);
        assert_eq!(value["entries"][1]["kind"], "directory");
        assert!(value["entries"][1].get("size").is_none());
        assert_eq!(value["network_addr"], "http://10.0.0.2:8000");
    }
}
