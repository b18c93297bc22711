//! Confirmation phrase matching and payload templating.
//!
//! A phrase matches when the trimmed, case-insensitive input equals the
//! required phrase exactly. Nothing fuzzier than that: the point of a typed
//! phrase is that the operator proves they read it.

use serde_json::Value;

/// Normalize a phrase for comparison: trim surrounding whitespace, uppercase.
pub fn normalize_phrase(phrase: &str) -> String {
    phrase.trim().to_uppercase()
}

/// Returns true if `input` confirms `required`.
///
/// Only the operator's input is trimmed. A required phrase carrying trailing
/// content is compared as written, so a registry typo can never be satisfied
/// by accident.
pub fn phrase_matches(input: &str, required: &str) -> bool {
    normalize_phrase(input) == required.to_uppercase()
}

/// Fill `{field}` placeholders in a phrase template from top-level payload
/// fields. Values are upper-cased. Returns the name of the first missing
/// field on failure.
pub fn render_template(template: &str, payload: &Value) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unbalanced brace: keep the remainder literally
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let field = &after[..end];
        let value = match payload.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return Err(field.to_string()),
        };
        out.push_str(&value.to_uppercase());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_insensitive_trimmed_match() {
        assert!(phrase_matches(" enable exam mode ", "ENABLE EXAM MODE"));
        assert!(phrase_matches("activate irt", "ACTIVATE IRT"));
        assert!(phrase_matches("ACTIVATE IRT\n", "ACTIVATE IRT"));
    }

    #[test]
    fn test_required_phrase_not_trimmed() {
        assert!(!phrase_matches("activate irt", "ACTIVATE IRT "));
    }

    #[test]
    fn test_partial_or_extra_words_rejected() {
        assert!(!phrase_matches("activate", "ACTIVATE IRT"));
        assert!(!phrase_matches("activate irt now", "ACTIVATE IRT"));
        assert!(!phrase_matches("activate  irt", "ACTIVATE IRT"));
        assert!(!phrase_matches("", "ACTIVATE IRT"));
    }

    #[test]
    fn test_render_template() {
        let payload = json!({"engine": "meilisearch"});
        assert_eq!(
            render_template("ENABLE {engine}", &payload).unwrap(),
            "ENABLE MEILISEARCH"
        );
        assert_eq!(render_template("RUN GRAPH SYNC", &payload).unwrap(), "RUN GRAPH SYNC");
    }

    #[test]
    fn test_render_template_missing_field() {
        let err = render_template("ENABLE {engine}", &json!({})).unwrap_err();
        assert_eq!(err, "engine");

        let err = render_template("ENABLE {engine}", &json!({"engine": "  "})).unwrap_err();
        assert_eq!(err, "engine");
    }
}
