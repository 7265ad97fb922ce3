//! Turns an extracted candidate string into a validated [`SlideDocument`].
//!
//! Validation is all-or-nothing: one bad element rejects the whole deck, so a
//! renderer never receives slides with missing fields.

use crate::models::{SlideDocument, SlideRecord};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Parse and validate a JSON array of slide objects.
///
/// Field values are kept byte for byte and element order is preserved.
pub fn normalize(candidate: &str) -> Result<SlideDocument> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        Error::MalformedModelOutput(format!(
            "reply is not valid JSON ({}); reply starts with: {}",
            e,
            preview(candidate)
        ))
    })?;

    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(Error::MalformedModelOutput(format!(
                "expected a JSON array of slides, got {}",
                kind(&other)
            )));
        }
    };

    if elements.is_empty() {
        return Err(Error::MalformedModelOutput(
            "slide array is empty".to_string(),
        ));
    }

    let slides = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Object(mut object) => slide_from_object(index, &mut object),
            other => Err(Error::MalformedModelOutput(format!(
                "slide {} is {}, expected an object",
                index,
                kind(&other)
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SlideDocument::new(slides))
}

fn slide_from_object(index: usize, object: &mut Map<String, Value>) -> Result<SlideRecord> {
    let mut take = |field: &str| match object.remove(field) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(Error::MalformedModelOutput(format!(
            "slide {}: field `{}` is {}, expected a string",
            index,
            field,
            kind(&other)
        ))),
        None => Err(Error::MalformedModelOutput(format!(
            "slide {}: missing field `{}`",
            index, field
        ))),
    };

    Ok(SlideRecord {
        title: take("title")?,
        desc: take("desc")?,
        prompt_image: take("promptImage")?,
    })
}

/// Reject decks whose descriptions cover less than `min_ratio` of the source
/// text, measured in characters.
pub fn check_desc_coverage(
    document: &SlideDocument,
    source_text: &str,
    min_ratio: f64,
) -> Result<()> {
    let source_chars = source_text.trim().chars().count();
    if source_chars == 0 {
        return Ok(());
    }

    let desc_chars: usize = document.iter().map(|s| s.desc.trim().chars().count()).sum();
    let ratio = desc_chars as f64 / source_chars as f64;

    if ratio < min_ratio {
        return Err(Error::MalformedModelOutput(format!(
            "slide descriptions cover {:.0}% of the lesson text, below the required {:.0}%",
            ratio * 100.0,
            min_ratio * 100.0
        )));
    }

    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let mut preview: String = text.chars().take(MAX).collect();
    if text.chars().count() > MAX {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slide(title: &str, desc: &str, prompt_image: &str) -> SlideRecord {
        SlideRecord {
            title: title.to_string(),
            desc: desc.to_string(),
            prompt_image: prompt_image.to_string(),
        }
    }

    fn malformed(candidate: &str) -> String {
        match normalize(candidate) {
            Err(Error::MalformedModelOutput(message)) => message,
            other => panic!("expected MalformedModelOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_array_preserves_order_and_text() {
        let candidate = r#"[
            {"title": "Second", "desc": "  Keeps   spacing.\nAnd newlines.  ", "promptImage": "b"},
            {"title": "First", "desc": "Short.", "promptImage": "a"}
        ]"#;

        let document = normalize(candidate).unwrap();

        assert_eq!(
            document.slides(),
            &[
                slide("Second", "  Keeps   spacing.\nAnd newlines.  ", "b"),
                slide("First", "Short.", "a"),
            ]
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let document =
            normalize(r#"[{"title":"T","desc":"D","promptImage":"P","notes":"x"}]"#).unwrap();
        assert_eq!(document.slides(), &[slide("T", "D", "P")]);
    }

    #[test]
    fn test_syntax_error_is_malformed() {
        let message = malformed(r#"[{"title": "T", "desc": "D", "promptImage": "P"}"#);
        assert!(message.contains("not valid JSON"));
    }

    #[test]
    fn test_prose_is_malformed() {
        let message = malformed("Sure! Here are the slides you asked for.");
        assert!(message.contains("Sure! Here are the slides"));
    }

    #[test]
    fn test_top_level_object_is_malformed() {
        let message = malformed(r#"{"slides": []}"#);
        assert!(message.contains("an object"));
    }

    #[test]
    fn test_empty_array_is_malformed() {
        assert!(malformed("[]").contains("empty"));
    }

    #[test]
    fn test_missing_field_rejects_whole_document() {
        let candidate = r#"[
            {"title":"A","desc":"a","promptImage":"a"},
            {"title":"B","promptImage":"b"}
        ]"#;

        let message = malformed(candidate);
        assert!(message.contains("slide 1"));
        assert!(message.contains("`desc`"));
    }

    #[test]
    fn test_non_string_field_rejects_whole_document() {
        let message = malformed(r#"[{"title":"A","desc":"a","promptImage":42}]"#);
        assert!(message.contains("`promptImage`"));
        assert!(message.contains("a number"));
    }

    #[test]
    fn test_null_field_is_rejected() {
        let message = malformed(r#"[{"title":null,"desc":"a","promptImage":"p"}]"#);
        assert!(message.contains("`title`"));
    }

    #[test]
    fn test_non_object_element_is_rejected() {
        let message = malformed(r#"[{"title":"A","desc":"a","promptImage":"p"}, "oops"]"#);
        assert!(message.contains("slide 1 is a string"));
    }

    #[test]
    fn test_coverage_gate() {
        let document = normalize(r#"[{"title":"T","desc":"abcde","promptImage":"P"}]"#).unwrap();

        assert!(check_desc_coverage(&document, "abcdefghij", 0.5).is_ok());
        assert!(matches!(
            check_desc_coverage(&document, "abcdefghij", 0.6),
            Err(Error::MalformedModelOutput(_))
        ));
    }

    #[test]
    fn test_coverage_counts_characters_not_bytes() {
        let document = normalize(r#"[{"title":"T","desc":"ánh sáng","promptImage":"P"}]"#).unwrap();
        assert!(check_desc_coverage(&document, "ánh sáng", 1.0).is_ok());
    }
}
