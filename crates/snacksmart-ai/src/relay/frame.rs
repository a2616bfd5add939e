use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct ChunkFrame {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the text delta carried by one SSE line, if any.
///
/// Blank lines, non-`data:` fields, the `[DONE]` sentinel, undecodable
/// payloads and frames without a non-empty `choices[0].delta.content` all
/// yield `None`.
pub fn delta_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    let payload = line.strip_prefix(DATA_PREFIX)?.trim_start();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }

    let frame: ChunkFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::trace!(%error, "Skipping undecodable SSE frame");
            return None;
        }
    };

    frame
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_delta() {
        let line = r#"data: {"id":"c1","choices":[{"index":0,"delta":{"content":"Hello"}}]}"#;
        assert_eq!(delta_from_line(line).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_marker_without_space_and_surrounding_whitespace() {
        let line = "  data:{\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\r";
        assert_eq!(delta_from_line(line).as_deref(), Some(" world"));
    }

    #[test]
    fn test_ignored_lines() {
        for line in [
            "",
            "   ",
            ": keep-alive",
            "event: message",
            "id: 7",
            "data: [DONE]",
            "data:   [DONE]  ",
            "data: {not json",
            "data: {}",
            r#"data: {"choices":[]}"#,
            r#"data: {"choices":[{"delta":{}}]}"#,
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[{"delta":{"content":null}}]}"#,
            r#"data: {"choices":[{"delta":{"content":42}}]}"#,
        ] {
            assert_eq!(delta_from_line(line), None, "line: {line:?}");
        }
    }

    #[test]
    fn test_only_first_choice_is_used() {
        let line = r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#;
        assert_eq!(delta_from_line(line).as_deref(), Some("a"));
    }
}
