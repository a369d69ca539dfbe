//! Response parsing: untrusted model text → JSON document.
//!
//! Parsing never fails loudly. A response that does not parse is a normal,
//! classified outcome (`graph_json_parse_failed`), distinct from a document
//! that parses but breaks the schema.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// The whole (trimmed) response must be one JSON document.
    #[default]
    Strict,
    /// Fall back to the first complete JSON object embedded in the text
    /// (markdown fences, leading prose, trailing chatter).
    Lenient,
}

pub fn parse_response(raw: &str, mode: ParseMode) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    match mode {
        ParseMode::Strict => None,
        ParseMode::Lenient => first_json_object(trimmed),
    }
}

/// The first brace-balanced `{...}` span that parses as JSON.
///
/// Candidates start at each `{` in turn, so brace-wrapped prose ahead of
/// the real object is skipped.
fn first_json_object(text: &str) -> Option<Value> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_object_at(text, start))
        .find_map(|candidate| serde_json::from_str(candidate).ok())
}

/// Span from the `{` at `start` to its matching `}`, ignoring braces inside
/// string literals.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
