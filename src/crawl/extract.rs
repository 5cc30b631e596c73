//! HTML capture: turns a fetched document into a [`RawPageRecord`].
//!
//! Regex-based tag handling, good enough for structural capture of
//! server-rendered pages. Anything heavier (JS execution, full DOM) is
//! a fetcher concern, not a capture concern.

use chrono::Utc;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

use crate::types::page::RawPageRecord;

/// Build the immutable capture record for one fetched page.
///
/// `final_url` is the redirect-resolved URL and becomes the record key.
pub fn build_page_record(final_url: &Url, html: &str) -> RawPageRecord {
    let mut record = RawPageRecord::new(final_url.as_str(), html_to_text(html));
    if let Some(title) = extract_title(html) {
        record = record.with_title(title);
    }
    record.headings = extract_headings(html);
    record.tables = extract_tables(html);
    record.outbound_links = extract_links(final_url, html);
    record.with_fetched_at(Utc::now())
}

/// Extract the document title.
pub fn extract_title(html: &str) -> Option<String> {
    let title_pattern = Regex::new(r"(?s)<title[^>]*>(.*?)</title>").ok()?;
    title_pattern
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// Extract heading texts (h1-h6) in document order.
pub fn extract_headings(html: &str) -> Vec<String> {
    let heading_pattern = Regex::new(r"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap();
    heading_pattern
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|h| !h.is_empty())
        .collect()
}

/// Extract tables as rows of cell texts, in document order.
///
/// Rows with no cells are dropped, as are tables with no rows.
pub fn extract_tables(html: &str) -> Vec<Vec<Vec<String>>> {
    let table_pattern = Regex::new(r"(?s)<table[^>]*>(.*?)</table>").unwrap();
    let row_pattern = Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").unwrap();
    let cell_pattern = Regex::new(r"(?s)<t[dh][^>]*>(.*?)</t[dh]>").unwrap();

    let mut tables = Vec::new();
    for table_cap in table_pattern.captures_iter(html) {
        let table_html = table_cap.get(1).map(|m| m.as_str()).unwrap_or("");
        let mut rows = Vec::new();
        for row_cap in row_pattern.captures_iter(table_html) {
            let row_html = row_cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let cells: Vec<String> = cell_pattern
                .captures_iter(row_html)
                .filter_map(|cap| cap.get(1))
                .map(|m| clean_text(m.as_str()))
                .collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        if !rows.is_empty() {
            tables.push(rows);
        }
    }
    tables
}

/// Extract outbound links as absolute URLs, resolved against the page
/// URL. Fragment-only, javascript:, mailto: and tel: targets are
/// skipped; fragments are stripped so dedup keys stay stable.
pub fn extract_links(base_url: &Url, html: &str) -> BTreeSet<String> {
    let href_pattern = Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap();

    let mut links = BTreeSet::new();
    for cap in href_pattern.captures_iter(html) {
        if let Some(href) = cap.get(1) {
            let href = href.as_str();
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }
            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.insert(resolved.to_string());
            }
        }
    }
    links
}

/// Strip markup down to visible text.
pub fn html_to_text(html: &str) -> String {
    let script_pattern = Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap();
    let style_pattern = Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap();
    let tag_pattern = Regex::new(r"<[^>]+>").unwrap();
    let whitespace_pattern = Regex::new(r"\s+").unwrap();

    let text = script_pattern.replace_all(html, " ");
    let text = style_pattern.replace_all(&text, " ");
    let text = tag_pattern.replace_all(&text, " ");
    let text = decode_entities(&text);
    whitespace_pattern.replace_all(&text, " ").trim().to_string()
}

/// Strip nested tags and collapse whitespace in a captured fragment.
fn clean_text(fragment: &str) -> String {
    let tag_pattern = Regex::new(r"<[^>]+>").unwrap();
    let whitespace_pattern = Regex::new(r"\s+").unwrap();
    let text = tag_pattern.replace_all(fragment, " ");
    let text = decode_entities(&text);
    whitespace_pattern.replace_all(&text, " ").trim().to_string()
}

/// Decode the handful of entities that actually show up in text.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
