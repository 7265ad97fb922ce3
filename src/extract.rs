//! Isolates the JSON-bearing part of a model reply.
//!
//! Models are asked not to use markdown, but many still wrap their answer in a
//! fenced block. Both forms are accepted here; nothing is parsed.

const FENCE: &str = "```";

/// Return the body of the first fenced block in `reply`, or the whole reply
/// when no complete fenced block exists. The result is trimmed.
pub fn extract_candidate(reply: &str) -> &str {
    fenced_body(reply).unwrap_or(reply).trim()
}

fn fenced_body(reply: &str) -> Option<&str> {
    let mut offset = 0;
    let mut body_start = None;

    for line in reply.split_inclusive('\n') {
        let line_end = offset + line.len();
        match body_start {
            None if is_opening_fence(line) => body_start = Some(line_end),
            Some(start) if line.trim() == FENCE => return Some(&reply[start..offset]),
            _ => {}
        }
        offset = line_end;
    }

    None
}

/// A fence opens only on its own line: "```" plus an optional language tag.
/// JSON strings cannot span lines, so backticks inside a value never match.
fn is_opening_fence(line: &str) -> bool {
    line.trim_start().strip_prefix(FENCE).is_some_and(|rest| {
        rest.trim_end()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[{"title":"A","desc":"B","promptImage":"C"}]"#;

    #[test]
    fn test_unfenced_reply_is_returned_whole() {
        assert_eq!(extract_candidate(BODY), BODY);
    }

    #[test]
    fn test_unfenced_reply_is_trimmed() {
        assert_eq!(extract_candidate(&format!("\n  {}  \n", BODY)), BODY);
    }

    #[test]
    fn test_fenced_with_language_tag_matches_unfenced() {
        let fenced = format!("```json\n{}\n```", BODY);
        assert_eq!(extract_candidate(&fenced), extract_candidate(BODY));
    }

    #[test]
    fn test_fenced_without_language_tag() {
        let fenced = format!("```\n{}\n```", BODY);
        assert_eq!(extract_candidate(&fenced), BODY);
    }

    #[test]
    fn test_fence_must_stand_on_its_own_line() {
        let reply = format!("```json {}```", BODY);
        assert_eq!(extract_candidate(&reply), reply.as_str());
    }

    #[test]
    fn test_backticks_inside_bare_json_are_not_a_fence() {
        let body = r#"[{"title":"Code","desc":"Wrap code like ```python print(1)``` in markdown.","promptImage":"a laptop"}]"#;
        assert_eq!(extract_candidate(body), body);
    }

    #[test]
    fn test_backticks_inside_fenced_json_do_not_close_block() {
        let body = r#"[{"title":"Code","desc":"Use ``` to open a block.","promptImage":"a laptop"}]"#;
        let fenced = format!("```json\n{}\n```", body);
        assert_eq!(extract_candidate(&fenced), body);
    }

    #[test]
    fn test_indented_fence_lines() {
        let fenced = format!("Slides:\n  ```json  \n{}\n  ```  \nDone.", BODY);
        assert_eq!(extract_candidate(&fenced), BODY);
    }

    #[test]
    fn test_prose_around_fenced_block_is_dropped() {
        let reply = format!(
            "Here are your slides:\n\n```json\n{}\n```\n\nLet me know if you need changes.",
            BODY
        );
        assert_eq!(extract_candidate(&reply), BODY);
    }

    #[test]
    fn test_only_first_fenced_block_is_used() {
        let reply = format!("```json\n{}\n```\n```json\n[]\n```", BODY);
        assert_eq!(extract_candidate(&reply), BODY);
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_whole_reply() {
        let reply = format!("```json\n{}", BODY);
        assert_eq!(extract_candidate(&reply), reply.as_str());
    }

    #[test]
    fn test_crlf_line_endings() {
        let fenced = format!("```json\r\n{}\r\n```\r\n", BODY);
        assert_eq!(extract_candidate(&fenced), BODY);
    }

    #[test]
    fn test_non_ascii_content_survives() {
        let body = r#"[{"title":"Quang hợp","desc":"Cây xanh hấp thụ ánh sáng.","promptImage":"leaf"}]"#;
        let fenced = format!("```json\n{}\n```", body);
        assert_eq!(extract_candidate(&fenced), body);
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(extract_candidate("   "), "");
    }
}
