use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RejectionReason;

/// Event types the service accepts, matched verbatim against `event_type`.
pub const KNOWN_EVENT_TYPES: &[&str] = &["market_dispatch"];

/// Notification channel type a recipient subscribes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Email,
    Sms,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Email => write!(f, "email"),
            NotificationType::Sms => write!(f, "sms"),
        }
    }
}

/// Raw request body decomposed into the fields the validator inspects.
///
/// Each field is `None` when the key is absent and `Some(value)` otherwise,
/// including `Some(Value::Null)` for an explicit JSON `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPayload {
    pub start_time: Option<Value>,
    pub end_time: Option<Value>,
    pub program_id: Option<Value>,
    pub event_type: Option<Value>,
}

impl EventPayload {
    pub const START_TIME: &'static str = "start_time";
    pub const END_TIME: &'static str = "end_time";
    pub const PROGRAM_ID: &'static str = "program_id";
    pub const EVENT_TYPE: &'static str = "event_type";

    /// Parse a request body. Anything other than a JSON object is malformed.
    pub fn from_slice(body: &[u8]) -> Result<Self, RejectionReason> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RejectionReason::MalformedBody(format!("body is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Decompose an already-parsed JSON value. Unrecognized keys are ignored.
    pub fn from_value(value: Value) -> Result<Self, RejectionReason> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(RejectionReason::MalformedBody(format!(
                "body must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Self {
        Self {
            start_time: map.remove(Self::START_TIME),
            end_time: map.remove(Self::END_TIME),
            program_id: map.remove(Self::PROGRAM_ID),
            event_type: map.remove(Self::EVENT_TYPE),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A validated event, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub program_id: String,
    pub event_type: String,
}

/// Someone registered to hear about one or more programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub destination: String,
    pub notification_type: NotificationType,
    pub program_ids: BTreeSet<String>,
}

impl Recipient {
    pub fn new<I, S>(destination: impl Into<String>, notification_type: NotificationType, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            destination: destination.into(),
            notification_type,
            program_ids: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subscribes_to(&self, program_id: &str) -> bool {
        self.program_ids.contains(program_id)
    }
}

/// Human-readable notification, composed once per accepted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}
