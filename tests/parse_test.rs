//! Tests for provider-output parsing — the four-branch extraction
//! precedence and field normalization.

use shelftalker::providers::parse::parse_recommendations;
use shelftalker::types::{PLACEHOLDER_IMAGE, UNKNOWN_AUTHOR, UNKNOWN_TITLE};

// =========================================================================
// Branch 1: entire body is JSON
// =========================================================================

#[test]
fn whole_body_json_object_with_books_array() {
    let raw = r#"{"books":[{"title":"A","author":"B","description":"C"}]}"#;
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "A");
    assert_eq!(recs[0].author, "B");
    assert_eq!(recs[0].description, "C");
}

#[test]
fn whole_body_bare_array() {
    let raw = r#"[{"title":"A","author":"B"},{"title":"D","author":"E"}]"#;
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].title, "D");
}

#[test]
fn whole_body_single_record_object() {
    let raw = r#"{"title":"A","author":"B","description":"C"}"#;
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "A");
}

#[test]
fn recommendations_key_is_accepted() {
    let raw = r#"{"recommendations":[{"title":"A","author":"B"}]}"#;
    assert_eq!(parse_recommendations(raw).len(), 1);
}

// =========================================================================
// Branch 2: first balanced JSON substring
// =========================================================================

#[test]
fn json_island_in_prose() {
    let raw = "Here you go:\n[{\"title\":\"A\",\"author\":\"B\",\"description\":\"C\"}]\nEnjoy!";
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "A");
}

#[test]
fn fenced_code_block_is_found() {
    let raw = "```json\n{\"books\":[{\"title\":\"A\",\"author\":\"B\"}]}\n```";
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
}

#[test]
fn first_parseable_island_wins() {
    let raw = r#"{ this is not json } but [{"title":"A","author":"B"}] is"#;
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "A");
}

// =========================================================================
// Branch 3: line-oriented Title/Author/Description triples
// =========================================================================

#[test]
fn three_line_triples_in_source_order() {
    let raw = "\
Title: First Book
Author: Alice
Description: A tale of beginnings.

Title: Second Book
Author: Bob
Description: The middle volume.

Title: Third Book
Author: Carol
Description: How it all ends.";
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].title, "First Book");
    assert_eq!(recs[1].author, "Bob");
    assert_eq!(recs[2].description, "How it all ends.");
    // Placeholder rating and generated ids.
    assert_eq!(recs[0].rating, 0.0);
    assert!(recs[0].id.starts_with("gen-"));
}

#[test]
fn multi_line_description_runs_until_blank_line() {
    let raw = "\
Title: Long One
Author: Alice
Description: It starts here
and keeps going
over several lines.

Title: Unpaired";
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(
        recs[0].description,
        "It starts here and keeps going over several lines."
    );
}

#[test]
fn sequences_zip_to_the_shortest() {
    let raw = "\
Title: One
Title: Two
Author: Alice
Author: Bob
Description: only one description";
    let recs = parse_recommendations(raw);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "One");
    assert_eq!(recs[0].author, "Alice");
}

// =========================================================================
// Branch 4: nothing matches
// =========================================================================

#[test]
fn unparseable_output_yields_empty_list() {
    let recs = parse_recommendations("Sorry, I can't help with book suggestions today.");
    assert!(recs.is_empty());
}

#[test]
fn empty_input_yields_empty_list() {
    assert!(parse_recommendations("").is_empty());
}

// =========================================================================
// Normalization
// =========================================================================

#[test]
fn missing_fields_take_documented_defaults() {
    let recs = parse_recommendations(r#"[{}]"#);
    assert_eq!(recs.len(), 1);
    let rec = &recs[0];
    assert_eq!(rec.title, UNKNOWN_TITLE);
    assert_eq!(rec.author, UNKNOWN_AUTHOR);
    assert!(rec.genres.is_empty());
    assert_eq!(rec.rating, 0.0);
    assert_eq!(rec.review_count, 0);
    assert_eq!(rec.page_count, 0);
    assert_eq!(rec.image_url, PLACEHOLDER_IMAGE);
    assert!(rec.id.starts_with("gen-"));
}

#[test]
fn bare_genre_string_is_wrapped_into_array() {
    let recs = parse_recommendations(r#"[{"title":"A","genre":"Horror"}]"#);
    assert_eq!(recs[0].genres, vec!["Horror"]);
}

#[test]
fn camel_case_numeric_fields_are_read() {
    let raw = r#"[{"title":"A","pageCount":412,"reviewCount":88,"rating":4.5}]"#;
    let rec = &parse_recommendations(raw)[0];
    assert_eq!(rec.page_count, 412);
    assert_eq!(rec.review_count, 88);
    assert!((rec.rating - 4.5).abs() < f32::EPSILON);
}

#[test]
fn provider_supplied_id_is_kept() {
    let recs = parse_recommendations(r#"[{"title":"A","id":"prov-1"}]"#);
    assert_eq!(recs[0].id, "prov-1");
}

#[test]
fn numeric_year_is_stringified() {
    let recs = parse_recommendations(r#"[{"title":"A","publicationDate":1965}]"#);
    assert_eq!(recs[0].publication_date, "1965");
}
