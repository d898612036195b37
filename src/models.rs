use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::WhiteboardError;

// ============================================================================
// Whiteboard Models
// ============================================================================
//
// - WhiteboardId: validated identifier, safe to use as a file name
// - Event: one committed drawing action, kept as the raw JSON object so
//   payload fields the server does not understand survive verbatim
// - EventKind: the `t` tag, classified into what the store does with it
//
// ============================================================================

/// Identifier of one collaborative canvas.
///
/// Validated on construction so that it can be used directly as a file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WhiteboardId(String);

impl WhiteboardId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, WhiteboardError> {
        let raw = raw.into();

        let unsafe_id = raw.is_empty()
            || raw == "."
            || raw == ".."
            || raw.chars().any(|c| c == '/' || c == '\\' || c.is_control());

        if unsafe_id {
            return Err(WhiteboardError::InvalidIdentifier(raw));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WhiteboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WhiteboardId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WhiteboardId::parse(raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Event Kinds
// ============================================================================

/// Drawing and text-layout tags that are stored verbatim.
pub const DRAWING_TAGS: &[&str] = &[
    "line",
    "pen",
    "rect",
    "circle",
    "eraser",
    "addImgBG",
    "recSelect",
    "eraseRec",
    "addTextBox",
    "removeTextbox",
    "setTextboxPosition",
    "setTextboxFontSize",
    "setTextboxFontColor",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Clear,
    Undo,
    Redo,
    /// Compacted: only the latest text per textbox is kept
    SetTextboxText,
    Drawing(&'static str),
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "clear" => Some(EventKind::Clear),
            "undo" => Some(EventKind::Undo),
            "redo" => Some(EventKind::Redo),
            "setTextboxText" => Some(EventKind::SetTextboxText),
            other => DRAWING_TAGS
                .iter()
                .copied()
                .find(|known| *known == other)
                .map(EventKind::Drawing),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Clear => "clear",
            EventKind::Undo => "undo",
            EventKind::Redo => "redo",
            EventKind::SetTextboxText => "setTextboxText",
            EventKind::Drawing(tag) => tag,
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// A single whiteboard action: `{t, drawId?, username?, d?, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Split transport content into its whiteboard id and the event to store.
    ///
    /// Returns `Ok(None)` when the content is not an object or has no `wid`.
    pub fn from_content(content: Value) -> Result<Option<(WhiteboardId, Event)>, WhiteboardError> {
        let Value::Object(mut fields) = content else {
            return Ok(None);
        };

        let wid = match fields.remove("wid") {
            Some(Value::String(wid)) => wid,
            _ => return Ok(None),
        };

        Ok(Some((WhiteboardId::parse(wid)?, Event(fields))))
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.get("t").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<EventKind> {
        self.tag().and_then(EventKind::from_tag)
    }

    pub fn draw_id(&self) -> Option<&Value> {
        self.0.get("drawId")
    }

    pub fn username(&self) -> Option<&Value> {
        self.0.get("username")
    }

    /// First payload element; identifies the textbox for text edits.
    pub fn textbox_key(&self) -> Option<&Value> {
        self.0.get("d").and_then(|d| d.get(0))
    }

    pub fn same_author(&self, username: Option<&Value>) -> bool {
        loosely_equal(self.username(), username)
    }

    /// Same author and same drawId, compared loosely (see `loosely_equal`).
    pub fn same_group(&self, draw_id: Option<&Value>, username: Option<&Value>) -> bool {
        loosely_equal(self.draw_id(), draw_id) && self.same_author(username)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Identifier comparison as clients send them: `3` and `"3"` are the same
/// id, and an explicit `null` is the same as an absent field.
fn loosely_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (Some(Value::Number(n)), Some(Value::String(s))) | (Some(Value::String(s)), Some(Value::Number(n))) => {
            matches!((n.as_f64(), s.trim().parse::<f64>()), (Some(x), Ok(y)) if x == y)
        }
        (a, b) => a == b,
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_whiteboard_id_rejects_unsafe_names() {
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "nul\0byte", "line\nbreak"] {
            assert!(
                matches!(WhiteboardId::parse(bad), Err(WhiteboardError::InvalidIdentifier(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_whiteboard_id_accepts_plain_names() {
        let id = WhiteboardId::parse("myNewWhiteboard-42_x.y").unwrap();
        assert_eq!(id.as_str(), "myNewWhiteboard-42_x.y");
        assert_eq!(id.to_string(), "myNewWhiteboard-42_x.y");
    }

    #[test]
    fn test_whiteboard_id_deserialization_validates() {
        assert!(serde_json::from_value::<WhiteboardId>(json!("ok")).is_ok());
        assert!(serde_json::from_value::<WhiteboardId>(json!("../x")).is_err());
    }

    #[test]
    fn test_event_kind_classification() {
        assert_eq!(EventKind::from_tag("clear"), Some(EventKind::Clear));
        assert_eq!(EventKind::from_tag("undo"), Some(EventKind::Undo));
        assert_eq!(EventKind::from_tag("redo"), Some(EventKind::Redo));
        assert_eq!(EventKind::from_tag("setTextboxText"), Some(EventKind::SetTextboxText));
        assert_eq!(EventKind::from_tag("pen"), Some(EventKind::Drawing("pen")));
        assert_eq!(EventKind::from_tag("eraseRec"), Some(EventKind::Drawing("eraseRec")));
        assert_eq!(EventKind::from_tag("cursor"), None);
        assert_eq!(EventKind::Drawing("rect").as_str(), "rect");
    }

    #[test]
    fn test_from_content_strips_wid() {
        let content = json!({"t": "pen", "wid": "w1", "username": "alice", "drawId": "d1", "d": [1, 2]});
        let (id, event) = Event::from_content(content).unwrap().unwrap();

        assert_eq!(id.as_str(), "w1");
        assert!(!event.fields().contains_key("wid"));
        assert_eq!(event.kind(), Some(EventKind::Drawing("pen")));
        assert_eq!(event.draw_id(), Some(&json!("d1")));
    }

    #[test]
    fn test_from_content_without_wid_is_none() {
        assert!(Event::from_content(json!({"t": "pen"})).unwrap().is_none());
        assert!(Event::from_content(json!({"t": "pen", "wid": 7})).unwrap().is_none());
        assert!(Event::from_content(json!("pen")).unwrap().is_none());
    }

    #[test]
    fn test_from_content_rejects_unsafe_wid() {
        let result = Event::from_content(json!({"t": "pen", "wid": "../../etc/passwd"}));
        assert!(matches!(result, Err(WhiteboardError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_group_matching() {
        let with_user = event(json!({"t": "pen", "drawId": 3, "username": "bob"}));
        assert!(with_user.same_group(Some(&json!(3)), Some(&json!("bob"))));
        assert!(!with_user.same_group(Some(&json!(4)), Some(&json!("bob"))));
        assert!(!with_user.same_group(Some(&json!(3)), None));

        let anonymous = event(json!({"t": "pen", "drawId": 3}));
        assert!(anonymous.same_group(Some(&json!(3)), None));
        assert!(anonymous.same_group(Some(&json!(3)), Some(&Value::Null)));
    }

    #[test]
    fn test_numeric_and_string_ids_match_loosely() {
        let e = event(json!({"t": "pen", "drawId": 3, "username": "bob"}));
        assert!(e.same_group(Some(&json!("3")), Some(&json!("bob"))));
        assert!(e.same_group(Some(&json!("3.0")), Some(&json!("bob"))));
        assert!(!e.same_group(Some(&json!("three")), Some(&json!("bob"))));

        let numeric_user = event(json!({"t": "pen", "drawId": "d1", "username": 7}));
        assert!(numeric_user.same_author(Some(&json!("7"))));
        assert!(!numeric_user.same_author(Some(&json!("8"))));
    }

    #[test]
    fn test_textbox_key_is_first_payload_element() {
        let e = event(json!({"t": "setTextboxText", "d": ["tb-1", "aGVsbG8="]}));
        assert_eq!(e.textbox_key(), Some(&json!("tb-1")));
        assert_eq!(event(json!({"t": "setTextboxText"})).textbox_key(), None);
    }
}
