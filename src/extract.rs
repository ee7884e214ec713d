use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MARKER_PHRASE: &str = "Nội dung hàng";
pub const UNCATEGORIZED: &str = "Uncategorized";
const QUANTITY_MARKER: &str = "SL:";
const LINE_DELIMITER: &str = " | ";

static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nội\s+dung\s+h[aà]ng").unwrap());
// first "1." item at a line start or after ':'; the description must not start with a digit ("2.4A")
static RE_LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[|:])\s*\d+\.\s*(\D)").unwrap());
// optional ':' (possibly on its own line) and list number right after the marker
static RE_PLAIN_LEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*:?[\s|]*(?:\d+\.\s*)?").unwrap());
static RE_QUANTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),\s*SL:\s*\d+").unwrap());
static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\r?\n)+").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Product record read off one shipping label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub category: String,
}

impl Record {
    pub fn new(name: &str, category: &str) -> Self {
        Record { name: normalize_field(name), category: normalize_field(category) }
    }
}

/// Parse the "goods content" line of an OCR'd label into a record.
/// Returns None when the marker phrase is missing; callers skip such pages.
pub fn extract_record(raw_text: &str) -> Option<Record> {
    let text = RE_LINE_BREAKS.replace_all(raw_text, LINE_DELIMITER);
    let marker = RE_MARKER.find(&text)?;
    let description = description_after_marker(&text[marker.end()..]);
    let span = match RE_QUANTITY.find(description) {
        Some(q) => &description[..q.start()],
        None => description,
    }
    .trim();

    let parts: Vec<&str> = span.split(',').collect();
    let last = parts[parts.len() - 1];
    let (category, name_parts) = if last.contains(QUANTITY_MARKER) {
        if parts.len() > 1 {
            (parts[parts.len() - 2], &parts[..parts.len() - 2])
        } else {
            (UNCATEGORIZED, &parts[..0])
        }
    } else {
        (last, &parts[..parts.len() - 1])
    };

    Some(Record {
        name: normalize_field(&name_parts.join(", ")),
        category: normalize_field(category),
    })
}

// Labels either list items ("(Tổng SL sản phẩm: 2)\n1. Ao so mi, ...") or put the description
// right after the marker. A header is skipped only up to the first list item and only when it
// holds neither another marker nor a quantity.
fn description_after_marker(rest: &str) -> &str {
    if let Some(item) = RE_LIST_ITEM.captures(rest).and_then(|c| c.get(1)) {
        let header = &rest[..item.start()];
        if !RE_MARKER.is_match(header) && !RE_QUANTITY.is_match(header) {
            return &rest[item.start()..];
        }
    }
    let lead = RE_PLAIN_LEAD.find(rest).map(|m| m.end()).unwrap_or(0);
    &rest[lead..]
}

/// Render a record back into label text that `extract_record` reads as the same record.
pub fn canonical_label_text(record: &Record) -> String {
    format!("{}: {}, {}", MARKER_PHRASE, record.name, record.category)
}

/// Collapse whitespace runs and drop the line delimiter inserted for matching.
pub fn normalize_field(s: &str) -> String {
    let collapsed = RE_WHITESPACE.replace_all(s.trim(), " ");
    collapsed.replace(LINE_DELIMITER, " ").trim().to_string()
}
