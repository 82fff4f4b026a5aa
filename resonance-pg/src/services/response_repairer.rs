//! Repair of generative output into song records
//!
//! Tolerance policy, in order:
//! 1. Strip code-fence markers and surrounding whitespace
//! 2. Add a missing leading `[` and/or trailing `]`
//! 3. Parse the whole text once as a JSON array, keeping object elements
//! 4. If that fails, recover objects: from every line that opens an object,
//!    read successive objects (which may span lines) until the first one
//!    that does not parse; lines that open no object are skipped
//! 5. Normalize each object with `normalize_song`
//! 6. Zero records is `MalformedOutput`
//!
//! Malformed entries are dropped silently; callers only need a reasonable
//! number of songs, not an exact count.

use resonance_common::models::{SongRecord, UNKNOWN};
use serde_json::{Map, Value};
use tracing::debug;

use super::generative_client::GenerationError;

type JsonObject = Map<String, Value>;

/// Repair raw generative output into an ordered record sequence
pub fn repair(raw: &str) -> Result<Vec<SongRecord>, GenerationError> {
    let stripped = strip_code_fences(raw);

    let objects = match parse_whole(&bracket(&stripped)) {
        Some(objects) => objects,
        None => {
            let recovered = recover_objects(&stripped);
            debug!(
                recovered = recovered.len(),
                "Whole-text parse failed, used line recovery"
            );
            recovered
        }
    };

    let records: Vec<SongRecord> = objects.iter().map(normalize_song).collect();

    if records.is_empty() {
        return Err(GenerationError::MalformedOutput);
    }

    Ok(records)
}

/// Coerce one loosely-typed object into a `SongRecord`
///
/// - `name` / `artist`: missing, blank or non-scalar becomes `"Unknown"`
/// - `year`: strings pass through, numbers are stringified
/// - `genres`: anything but an array becomes empty; scalar elements kept
/// - `album` / `explanation`: strings pass through, anything else is absent
/// - `matchedTrackId` is never taken from generated text
pub fn normalize_song(object: &JsonObject) -> SongRecord {
    SongRecord {
        name: required_text(object.get("name")),
        artist: required_text(object.get("artist")),
        album: optional_string(object.get("album")),
        year: scalar_text(object.get("year")),
        genres: genre_list(object.get("genres")),
        explanation: optional_string(object.get("explanation")),
        matched_track_id: None,
    }
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn bracket(text: &str) -> String {
    let mut bracketed = String::with_capacity(text.len() + 2);
    if !text.starts_with('[') {
        bracketed.push('[');
    }
    bracketed.push_str(text);
    if !text.ends_with(']') {
        bracketed.push(']');
    }
    bracketed
}

fn parse_whole(text: &str) -> Option<Vec<JsonObject>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(object) => Some(object),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn is_separator(c: char) -> bool {
    c == '[' || c == ',' || c.is_whitespace()
}

fn recover_objects(text: &str) -> Vec<JsonObject> {
    let mut objects = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i + 1);
        let line = &text[pos..line_end];
        let start = line.trim_start_matches(is_separator);

        if !start.starts_with('{') {
            pos = line_end;
            continue;
        }

        let from = pos + (line.len() - start.len());
        let (found, consumed) = leading_objects(&text[from..]);
        if found.is_empty() {
            pos = line_end;
        } else {
            objects.extend(found);
            pos = from + consumed;
        }
    }

    objects
}

/// Objects at the start of `text`, up to the first parse error
///
/// Returns the objects and the number of bytes they span.
fn leading_objects(text: &str) -> (Vec<JsonObject>, usize) {
    let mut objects = Vec::new();
    let mut consumed = 0;

    loop {
        let rest = text[consumed..].trim_start_matches(is_separator);
        if !rest.starts_with('{') {
            break;
        }

        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<JsonObject>();
        match stream.next() {
            Some(Ok(object)) => {
                objects.push(object);
                consumed = text.len() - rest.len() + stream.byte_offset();
            }
            _ => break,
        }
    }

    (objects, consumed)
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_text(value: Option<&Value>) -> String {
    scalar_text(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn genre_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| scalar_text(Some(item)))
            .filter(|genre| !genre.trim().is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
