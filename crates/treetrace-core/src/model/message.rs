use serde::{Deserialize, Serialize};

use super::track_id::TrackId;

/// Call-site reference bracketing one intercepted call.
///
/// All fields are optional; a capture failure degrades to an empty location
/// instead of failing the intercepted call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SourceLocation {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.file.is_some() || self.line.is_some() || self.column.is_some()
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => write!(f, "{file}:{line}:{column}"),
            (Some(file), Some(line), None) => write!(f, "{file}:{line}"),
            (Some(file), None, _) => write!(f, "{file}"),
            _ => write!(f, "<unknown>"),
        }
    }
}

/// One data event: which owner changed and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "trackid")]
    pub track_id: TrackId,

    /// Kind-qualified operation name, e.g. `Element.set_attribute`.
    #[serde(rename = "type")]
    pub action_type: String,

    /// Set when a mutation on a shadow-owned object must be attributed into
    /// another owner's stream; carries the shadow owner's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<TrackId>,
}

/// One message on the wire to the external consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TrackerMessage {
    RecordStart { loc: SourceLocation },
    Record(ActionRecord),
    RecordEnd { loc: SourceLocation },
}

impl TrackerMessage {
    pub fn is_start(&self) -> bool {
        matches!(self, TrackerMessage::RecordStart { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, TrackerMessage::RecordEnd { .. })
    }

    pub fn record(&self) -> Option<&ActionRecord> {
        match self {
            TrackerMessage::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            TrackerMessage::RecordStart { loc } | TrackerMessage::RecordEnd { loc } => Some(loc),
            TrackerMessage::Record(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loc() -> SourceLocation {
        SourceLocation {
            file: Some("src/app.rs".into()),
            line: Some(12),
            column: Some(5),
        }
    }

    #[test]
    fn test_record_start_wire_shape() {
        let msg = TrackerMessage::RecordStart { loc: sample_loc() };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "record_start");
        assert_eq!(json["data"]["loc"]["file"], "src/app.rs");
        assert_eq!(json["data"]["loc"]["line"], 12);
        assert_eq!(json["data"]["loc"]["column"], 5);
    }

    #[test]
    fn test_record_wire_shape_uses_trackid_and_type() {
        let msg = TrackerMessage::Record(ActionRecord {
            track_id: "3".into(),
            action_type: "Element.set_attribute".into(),
            merge: None,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "record");
        assert_eq!(json["data"]["trackid"], "3");
        assert_eq!(json["data"]["type"], "Element.set_attribute");
        assert!(json["data"].get("merge").is_none());
    }

    #[test]
    fn test_merge_field_present_when_set() {
        let msg = TrackerMessage::Record(ActionRecord {
            track_id: "3".into(),
            action_type: "Element.set_attribute_node".into(),
            merge: Some("1".into()),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"]["merge"], "1");
    }

    #[test]
    fn test_message_roundtrip() {
        let messages = vec![
            TrackerMessage::RecordStart { loc: sample_loc() },
            TrackerMessage::Record(ActionRecord {
                track_id: "1".into(),
                action_type: "StyleView.set_property".into(),
                merge: None,
            }),
            TrackerMessage::RecordEnd { loc: sample_loc() },
        ];
        for msg in &messages {
            let json = serde_json::to_string(msg).unwrap();
            let parsed: TrackerMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, msg);
        }
    }

    #[test]
    fn test_unavailable_location_serializes_empty() {
        let msg = TrackerMessage::RecordStart {
            loc: SourceLocation::unavailable(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"]["loc"], serde_json::json!({}));
    }

    #[test]
    fn test_location_display() {
        assert_eq!(sample_loc().to_string(), "src/app.rs:12:5");
        assert_eq!(SourceLocation::unavailable().to_string(), "<unknown>");
    }
}
