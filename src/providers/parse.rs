//! Model-output parsing and normalization.
//!
//! Generation backends return anything from clean JSON to prose with a
//! JSON island to free text. Extraction tries, in order:
//!
//! 1. the entire body as JSON;
//! 2. the first well-formed top-level JSON object or array substring
//!    (balanced-bracket search, string-aware);
//! 3. line-oriented `Title:` / `Author:` / `Description:` triples,
//!    zipped up to the shortest sequence;
//! 4. nothing matched — an empty list, never an error.
//!
//! Whichever branch wins, every record passes through the same
//! normalization: `genres` coerced to an array (wrapping a bare
//! `genre` string), numeric fields defaulting to 0, placeholder
//! strings, and a generated id when the model supplied none.

use rand::Rng;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::telemetry;
use crate::types::{
    BookRecommendation, PLACEHOLDER_IMAGE, UNKNOWN_AUTHOR, UNKNOWN_DATE, UNKNOWN_TITLE,
};

/// Keys under which providers tend to nest the record array.
const ARRAY_KEYS: &[&str] = &["books", "recommendations", "results", "items"];

/// Extract and normalize recommendations from raw model output.
///
/// Never fails: unparseable output yields an empty list.
pub fn parse_recommendations(raw: &str) -> Vec<BookRecommendation> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim())
        && let Some(records) = records_from_json(&value)
    {
        branch("json");
        return records.iter().map(normalize_record).collect();
    }

    if let Some(value) = first_json_fragment(raw)
        && let Some(records) = records_from_json(&value)
    {
        branch("fragment");
        return records.iter().map(normalize_record).collect();
    }

    let from_lines = parse_line_triples(raw);
    if !from_lines.is_empty() {
        branch("lines");
        return from_lines;
    }

    branch("empty");
    Vec::new()
}

fn branch(name: &'static str) {
    metrics::counter!(telemetry::PARSE_BRANCH_TOTAL, "branch" => name).increment(1);
}

/// Pull the record list out of a parsed JSON value.
///
/// Accepts a bare array, an object with a well-known array field, or a
/// single object that looks like one record.
fn records_from_json(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => {
            for key in ARRAY_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    return Some(items.clone());
                }
            }
            // A lone record rather than a wrapper object.
            if map.contains_key("title") {
                return Some(vec![value.clone()]);
            }
            None
        }
        _ => None,
    }
}

/// Find the first well-formed top-level JSON object or array substring.
///
/// Walks candidate opening brackets in order; for each, scans forward
/// with bracket-depth counting (skipping string literals and escapes)
/// to the matching close, then attempts a parse. First parse that
/// succeeds wins.
fn first_json_fragment(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    for start in 0..bytes.len() {
        let open = bytes[start];
        if open != b'{' && open != b'[' {
            continue;
        }
        if let Some(end) = matching_close(bytes, start)
            && let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end])
        {
            return Some(value);
        }
    }
    None
}

/// Index of the bracket closing the one at `start`, or `None` if the
/// input ends first.
fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Line-oriented fallback: independently collect every `Title:`,
/// `Author:`, and `Description:` occurrence (descriptions continue
/// until a blank line or the next marker), then zip the three
/// sequences up to the shortest length.
fn parse_line_triples(raw: &str) -> Vec<BookRecommendation> {
    let mut titles: Vec<String> = Vec::new();
    let mut authors: Vec<String> = Vec::new();
    let mut descriptions: Vec<String> = Vec::new();

    let mut lines = raw.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim().trim_start_matches(['-', '*']).trim_start();
        if let Some(rest) = marker_value(trimmed, "title") {
            titles.push(rest);
        } else if let Some(rest) = marker_value(trimmed, "author") {
            authors.push(rest);
        } else if let Some(rest) = marker_value(trimmed, "description") {
            let mut description = rest;
            while let Some(next) = lines.peek() {
                let next_trimmed = next.trim();
                if next_trimmed.is_empty() || has_any_marker(next_trimmed) {
                    break;
                }
                if !description.is_empty() {
                    description.push(' ');
                }
                description.push_str(next_trimmed);
                lines.next();
            }
            descriptions.push(description);
        }
    }

    let n = titles.len().min(authors.len()).min(descriptions.len());
    (0..n)
        .map(|i| BookRecommendation {
            id: generated_id(),
            title: titles[i].clone(),
            author: authors[i].clone(),
            publication_date: UNKNOWN_DATE.to_string(),
            description: descriptions[i].clone(),
            genres: Vec::new(),
            rating: 0.0,
            review_count: 0,
            page_count: 0,
            image_url: PLACEHOLDER_IMAGE.to_string(),
        })
        .collect()
}

/// `marker_value("Title: Dune", "title")` → `Some("Dune")`,
/// case-insensitive on the marker, stripping an optional list index.
fn marker_value(line: &str, marker: &str) -> Option<String> {
    let line = strip_list_index(line);
    let (head, rest) = line.split_once(':')?;
    if head.trim().eq_ignore_ascii_case(marker) {
        Some(rest.trim().to_string())
    } else {
        None
    }
}

fn has_any_marker(line: &str) -> bool {
    ["title", "author", "description"]
        .iter()
        .any(|m| marker_value(line, m).is_some())
}

/// Strip a leading `1.` / `2)` style list index.
fn strip_list_index(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len() {
        rest.trim_start_matches(['.', ')']).trim_start()
    } else {
        line
    }
}

/// Coerce one raw record into the canonical shape. Every missing or
/// mistyped field takes its documented default.
pub(crate) fn normalize_record(value: &Value) -> BookRecommendation {
    BookRecommendation {
        id: id_field(value),
        title: string_field(value, &["title"], UNKNOWN_TITLE),
        author: string_field(value, &["author"], UNKNOWN_AUTHOR),
        publication_date: string_field(
            value,
            &["publicationDate", "publication_date", "year"],
            UNKNOWN_DATE,
        ),
        description: string_field(value, &["description"], ""),
        genres: genres_field(value),
        rating: value
            .get("rating")
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32,
        review_count: count_field(value, &["reviewCount", "review_count"]),
        page_count: count_field(value, &["pageCount", "page_count", "pages"]),
        image_url: string_field(value, &["imageUrl", "image_url"], PLACEHOLDER_IMAGE),
    }
}

fn string_field(value: &Value, keys: &[&str], default: &str) -> String {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
            // Years arrive as numbers often enough to be worth keeping.
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    default.to_string()
}

fn count_field(value: &Value, keys: &[&str]) -> u32 {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_u64))
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// `genres` coerced to an array of strings; a bare `genre` string is
/// wrapped into a one-element array.
fn genres_field(value: &Value) -> Vec<String> {
    match value.get("genres") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => match value.get("genre") {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        },
    }
}

fn id_field(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generated_id(),
    }
}

/// Generated record id: epoch millis plus a random base36 suffix.
/// Uniqueness is best-effort; duplicate ids across independent calls
/// are possible and acceptable.
pub(crate) fn generated_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("gen-{now_ms}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_scan_skips_brackets_inside_strings() {
        let raw = r#"The phrase "array [of] things" precedes [{"title":"A"}] here"#;
        let value = first_json_fragment(raw).expect("fragment");
        assert!(value.is_array());
    }

    #[test]
    fn fragment_scan_handles_unbalanced_prefix() {
        let raw = r#"broken { not json — but then {"title":"B","author":"C"} works"#;
        let value = first_json_fragment(raw).expect("fragment");
        assert_eq!(value["title"], "B");
    }

    #[test]
    fn genre_string_is_wrapped() {
        let record = serde_json::json!({"title": "A", "genre": "Horror"});
        assert_eq!(normalize_record(&record).genres, vec!["Horror"]);
    }

    #[test]
    fn non_numeric_counts_default_to_zero() {
        let record = serde_json::json!({"title": "A", "pageCount": "lots", "rating": "good"});
        let normalized = normalize_record(&record);
        assert_eq!(normalized.page_count, 0);
        assert_eq!(normalized.rating, 0.0);
    }

    #[test]
    fn generated_ids_carry_prefix_and_suffix() {
        let id = generated_id();
        assert!(id.starts_with("gen-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[test]
    fn list_index_is_stripped_from_markers() {
        assert_eq!(marker_value("1. Title: Dune", "title").as_deref(), Some("Dune"));
        assert_eq!(marker_value("2) Author: Herbert", "author").as_deref(), Some("Herbert"));
    }
}
