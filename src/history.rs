/// Raw channel history and its classification into typed events.
///
/// The history payload is a list of heterogeneous JSON records as returned by
/// `conversations.history`. Records that do not carry the fields a report
/// needs are dropped here on purpose; they are not errors.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level record type for channel messages.
const MESSAGE_TYPE: &str = "message";

/// Subtypes that still count as a user posting in the channel.
const ORDINARY_SUBTYPES: &[&str] = &["thread_broadcast", "file_share", "me_message"];

/// Subtype of the record emitted when a call room is created.
const CALL_SUBTYPE: &str = "sh_room_created";

/// Text prefix of call-room records (ASCII case-insensitive).
const CALL_MARKER: &str = "started a call";

/// One fetched page of channel history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawHistory {
    #[serde(default)]
    pub messages: Vec<Value>,
    /// Set when the channel holds more history than was fetched
    #[serde(default)]
    pub has_more: bool,
}

impl RawHistory {
    pub fn new(messages: Vec<Value>, has_more: bool) -> Self {
        Self { messages, has_more }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub user_id: String,
    /// Epoch seconds
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallEvent {
    pub initiator_user_id: String,
    /// Epoch seconds of the record announcing the call
    pub timestamp: f64,
    pub room_name: String,
    /// Epoch seconds
    pub start_time: f64,
    /// Always strictly positive
    pub duration_minutes: u32,
    pub participant_ids: Vec<String>,
}

impl CallEvent {
    /// True if the user started the call or took part in it.
    pub fn involves(&self, user_id: &str) -> bool {
        self.initiator_user_id == user_id || self.participant_ids.iter().any(|p| p == user_id)
    }
}

/// Keeps ordinary user messages that carry both a user and a timestamp.
///
/// Joins, renames, bot posts and call announcements are skipped.
pub fn extract_messages(raw_events: &[Value]) -> Vec<MessageEvent> {
    let messages: Vec<MessageEvent> = raw_events.iter().filter_map(classify_message).collect();

    tracing::debug!(
        "Classified {} of {} records as messages",
        messages.len(),
        raw_events.len()
    );
    messages
}

/// Keeps call-room records with a positive duration.
pub fn extract_calls(raw_events: &[Value]) -> Vec<CallEvent> {
    let calls: Vec<CallEvent> = raw_events.iter().filter_map(classify_call).collect();

    tracing::debug!(
        "Classified {} of {} records as calls",
        calls.len(),
        raw_events.len()
    );
    calls
}

/// Warning to surface when the fetched history is known to be incomplete.
pub fn truncation_warning(history: &RawHistory) -> Option<String> {
    if !history.has_more {
        return None;
    }
    Some(format!(
        "Warning: channel history was truncated after {} records; the report is based on incomplete history.",
        history.messages.len()
    ))
}

fn classify_message(record: &Value) -> Option<MessageEvent> {
    if record.get("type").and_then(Value::as_str) != Some(MESSAGE_TYPE) {
        return None;
    }
    if record.get("bot_id").is_some() {
        return None;
    }
    if let Some(subtype) = record.get("subtype").and_then(Value::as_str) {
        if !ORDINARY_SUBTYPES.contains(&subtype) {
            return None;
        }
    }

    let user_id = record.get("user").and_then(Value::as_str)?;
    let timestamp = parse_timestamp(record.get("ts")?)?;

    Some(MessageEvent {
        user_id: user_id.to_string(),
        timestamp,
    })
}

fn classify_call(record: &Value) -> Option<CallEvent> {
    if record.get("subtype").and_then(Value::as_str) != Some(CALL_SUBTYPE) {
        return None;
    }
    let text = record.get("text").and_then(Value::as_str)?;
    if !starts_with_ignore_ascii_case(text, CALL_MARKER) {
        return None;
    }

    let initiator = record.get("user").and_then(Value::as_str)?;
    let timestamp = parse_timestamp(record.get("ts")?)?;

    let room = record.get("room")?;
    let start_time = parse_timestamp(room.get("date_start")?)?;
    let end_time = parse_timestamp(room.get("date_end")?)?;
    let history = room.get("participant_history")?.as_array()?;

    let duration = ((end_time - start_time) / 60.0).round();
    if duration < 1.0 || duration > f64::from(u32::MAX) {
        return None;
    }

    let mut participant_ids: Vec<String> = Vec::new();
    for id in history.iter().filter_map(Value::as_str) {
        if !participant_ids.iter().any(|p| p == id) {
            participant_ids.push(id.to_string());
        }
    }

    Some(CallEvent {
        initiator_user_id: initiator.to_string(),
        timestamp,
        room_name: room
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        start_time,
        duration_minutes: duration as u32,
        participant_ids,
    })
}

/// Timestamps arrive either as strings ("1580000000.000100") or numbers.
fn parse_timestamp(value: &Value) -> Option<f64> {
    let ts = match value {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    ts.is_finite().then_some(ts)
}

fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
