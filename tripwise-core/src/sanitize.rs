//! Cleanup of raw model output before JSON parsing.
//!
//! Models frequently wrap JSON in markdown fences or tack commentary on after a
//! `'''` delimiter. [`sanitize_response`] removes those artifacts and nothing
//! else; it never inspects or validates the JSON itself.

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";
const TRAILER_MARKER: &str = "'''";

/// Strip fence wrappers and trailing commentary from a model response.
///
/// Absent input yields an empty string, which will fail a downstream parse.
pub fn sanitize_response(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest.trim();
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest.trim();
    }

    if let Some(pos) = text.find(TRAILER_MARKER) {
        text = text[..pos].trim();
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest.trim();
    }

    text.to_string()
}
