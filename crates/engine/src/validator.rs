//! Event validator — the request acceptance pipeline.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. Required fields present (`start_time`, `program_id`, `event_type`)
//! 2. `program_id` then `event_type` are strings
//! 3. `start_time` parses as a timestamp
//! 4. `end_time`, if given, parses and does not precede `start_time`
//! 5. `event_type` is a known event type
//! 6. `program_id` exists in the program catalog
//!
//! Validation is pure: no I/O, no logging, no suspension points.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use herald_common::error::RejectionReason;
use herald_common::types::{Event, EventPayload, KNOWN_EVENT_TYPES};

use crate::directory::RecipientDirectory;
use crate::timestamp::parse_timestamp;

/// Validates raw payloads into [`Event`]s.
#[derive(Clone)]
pub struct EventValidator {
    directory: Arc<dyn RecipientDirectory>,
    known_event_types: &'static [&'static str],
}

impl EventValidator {
    pub fn new(directory: Arc<dyn RecipientDirectory>) -> Self {
        Self::with_event_types(directory, KNOWN_EVENT_TYPES)
    }

    pub fn with_event_types(
        directory: Arc<dyn RecipientDirectory>,
        known_event_types: &'static [&'static str],
    ) -> Self {
        Self {
            directory,
            known_event_types,
        }
    }

    pub fn validate(&self, payload: &EventPayload) -> Result<Event, RejectionReason> {
        let (start_value, program_value, event_type_value) = match (
            &payload.start_time,
            &payload.program_id,
            &payload.event_type,
        ) {
            (Some(start), Some(program), Some(event_type)) => (start, program, event_type),
            _ => return Err(RejectionReason::MissingFields(Self::missing_fields(payload))),
        };

        let program_id = Self::require_string(EventPayload::PROGRAM_ID, program_value)?;
        let event_type = Self::require_string(EventPayload::EVENT_TYPE, event_type_value)?;

        let start_time = Self::parse_field(EventPayload::START_TIME, start_value)?;

        let end_time = match &payload.end_time {
            None | Some(Value::Null) => None,
            Some(value) => {
                let end_time = Self::parse_field(EventPayload::END_TIME, value)?;
                if end_time < start_time {
                    return Err(RejectionReason::InvertedTimeRange {
                        start: start_time,
                        end: end_time,
                    });
                }
                Some(end_time)
            }
        };

        if !self.known_event_types.contains(&event_type) {
            return Err(RejectionReason::UnknownEventType(event_type.to_string()));
        }

        if self.directory.program_name(program_id).is_none() {
            return Err(RejectionReason::UnknownProgram(program_id.to_string()));
        }

        Ok(Event {
            start_time,
            end_time,
            program_id: program_id.to_string(),
            event_type: event_type.to_string(),
        })
    }

    fn missing_fields(payload: &EventPayload) -> Vec<&'static str> {
        [
            (EventPayload::START_TIME, payload.start_time.is_none()),
            (EventPayload::PROGRAM_ID, payload.program_id.is_none()),
            (EventPayload::EVENT_TYPE, payload.event_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    fn require_string<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, RejectionReason> {
        value.as_str().ok_or_else(|| RejectionReason::InvalidType {
            field,
            value: value.clone(),
        })
    }

    fn parse_field(
        field: &'static str,
        value: &Value,
    ) -> Result<DateTime<FixedOffset>, RejectionReason> {
        value
            .as_str()
            .and_then(parse_timestamp)
            .ok_or_else(|| RejectionReason::UnparsableTimestamp {
                field,
                raw: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
    }
}
