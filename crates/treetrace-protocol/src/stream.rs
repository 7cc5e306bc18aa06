//! Consumer-side stream handling. The broker sends flat messages; chunks
//! are reconstructed here by counting bracket markers: a chunk begins at a
//! start marker seen at depth zero and ends at the end marker that returns
//! the depth to zero.

use treetrace_core::model::TrackerMessage;

use crate::error::ProtocolError;

/// Slices a flat message list into chunks, one per top-level tracked call.
/// Nested brackets stay inside their enclosing chunk.
pub fn chunks(messages: &[TrackerMessage]) -> Result<Vec<&[TrackerMessage]>, ProtocolError> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut head = 0usize;

    for (index, message) in messages.iter().enumerate() {
        match message {
            TrackerMessage::RecordStart { .. } => {
                if depth == 0 {
                    head = index;
                }
                depth += 1;
            }
            TrackerMessage::RecordEnd { .. } => {
                if depth == 0 {
                    return Err(ProtocolError::StrayEnd(index));
                }
                depth -= 1;
                if depth == 0 {
                    result.push(&messages[head..=index]);
                }
            }
            TrackerMessage::Record(_) => {}
        }
    }
    if depth > 0 {
        return Err(ProtocolError::Unterminated(depth));
    }
    Ok(result)
}

/// Whether every prefix has at least as many starts as ends and the totals
/// match.
pub fn is_balanced(messages: &[TrackerMessage]) -> bool {
    chunks(messages).is_ok()
}

/// Serialize to JSONL bytes (one JSON object per line).
pub fn to_jsonl(messages: &[TrackerMessage]) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    for message in messages {
        serde_json::to_writer(&mut buf, message)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Deserialize from JSONL bytes, skipping blank lines.
pub fn from_jsonl(data: &[u8]) -> Result<Vec<TrackerMessage>, ProtocolError> {
    let text = std::str::from_utf8(data).map_err(|e| ProtocolError::Parse(e.to_string()))?;
    let mut messages = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        messages.push(serde_json::from_str(line)?);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treetrace_core::model::{ActionRecord, SourceLocation};

    fn loc(line: u32) -> SourceLocation {
        SourceLocation {
            file: Some("src/app.rs".into()),
            line: Some(line),
            column: Some(1),
        }
    }

    fn start(line: u32) -> TrackerMessage {
        TrackerMessage::RecordStart { loc: loc(line) }
    }

    fn end(line: u32) -> TrackerMessage {
        TrackerMessage::RecordEnd { loc: loc(line) }
    }

    fn record(id: &str) -> TrackerMessage {
        TrackerMessage::Record(ActionRecord {
            track_id: id.into(),
            action_type: "Element.set_attribute".into(),
            merge: None,
        })
    }

    #[test]
    fn test_flat_calls_slice_into_one_chunk_each() {
        let messages = vec![
            start(1),
            record("1"),
            end(1),
            start(2),
            record("2"),
            end(2),
        ];
        let chunks = chunks(&messages).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 3);
        assert_eq!(chunks[1][1].record().unwrap().track_id.as_str(), "2");
    }

    #[test]
    fn test_nested_calls_stay_in_the_enclosing_chunk() {
        let messages = vec![
            start(1),
            start(1),
            record("1"),
            end(1),
            record("1"),
            end(1),
            start(9),
            record("2"),
            end(9),
        ];
        let chunks = chunks(&messages).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 6);
        assert_eq!(chunks[1].len(), 3);
    }

    #[test]
    fn test_stray_end_is_an_error() {
        let messages = vec![end(1)];
        assert!(matches!(
            chunks(&messages),
            Err(ProtocolError::StrayEnd(0))
        ));
        assert!(!is_balanced(&messages));
    }

    #[test]
    fn test_unterminated_stream_is_an_error() {
        let messages = vec![start(1), start(2), end(2)];
        assert!(matches!(
            chunks(&messages),
            Err(ProtocolError::Unterminated(1))
        ));
    }

    #[test]
    fn test_empty_stream_is_balanced() {
        assert!(is_balanced(&[]));
        assert!(chunks(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let messages = vec![start(1), record("1"), end(1)];
        let bytes = to_jsonl(&messages).unwrap();
        let parsed = from_jsonl(&bytes).unwrap();
        assert_eq!(parsed, messages);
    }

    #[test]
    fn test_jsonl_skips_blank_lines() {
        let bytes = b"\n{\"type\":\"record\",\"data\":{\"trackid\":\"1\",\"type\":\"Element.set_id\"}}\n\n";
        let parsed = from_jsonl(bytes).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].record().unwrap().action_type, "Element.set_id");
    }
}
