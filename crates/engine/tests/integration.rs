//! Integration tests for the validate → dispatch pipeline.
//!
//! Uses an in-memory directory and recording channels; no network access.
//!
//! ```bash
//! cargo test -p herald-engine --test integration
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use herald_common::error::RejectionReason;
use herald_common::types::{
    DeliveryOutcome, EventPayload, NotificationMessage, NotificationType, Recipient,
};
use herald_engine::directory::StaticDirectory;
use herald_engine::dispatcher::Dispatcher;
use herald_engine::validator::EventValidator;
use herald_notifier::{ChannelRegistry, Delivered, DeliveryError, NotificationChannel};

// ============================================================
// Helpers
// ============================================================

/// Email channel that records every message and rejects one mailbox.
#[derive(Default)]
struct RecordingEmail {
    reject: Option<&'static str>,
    sent: Mutex<Vec<(String, NotificationMessage)>>,
}

#[async_trait]
impl NotificationChannel for RecordingEmail {
    fn notification_type(&self) -> NotificationType {
        NotificationType::Email
    }

    async fn send(
        &self,
        destination: &str,
        message: &NotificationMessage,
    ) -> Result<Delivered, DeliveryError> {
        if self.reject == Some(destination) {
            return Err(DeliveryError::Rejected {
                destination: destination.to_string(),
                reason: "550 5.1.1 user unknown".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.clone()));
        Ok(Delivered {
            destination: destination.to_string(),
            detail: "250 2.0.0 OK".to_string(),
        })
    }
}

fn directory(recipients: usize) -> Arc<StaticDirectory> {
    let mut builder = StaticDirectory::builder()
        .program("1", "Capacity Bidding Program")
        .recipient(Recipient::new("+15555550100", NotificationType::Sms, ["1"]));
    for i in 0..recipients {
        builder = builder.recipient(Recipient::new(
            format!("member{}@example.com", i),
            NotificationType::Email,
            ["1"],
        ));
    }
    Arc::new(builder.build())
}

fn pipeline(
    recipients: usize,
    channel: Arc<RecordingEmail>,
) -> (EventValidator, Dispatcher) {
    let directory = directory(recipients);
    let channels = ChannelRegistry::builder().register(channel).build();
    (
        EventValidator::new(directory.clone()),
        Dispatcher::new(directory, channels, 4),
    )
}

fn payload(value: serde_json::Value) -> EventPayload {
    EventPayload::from_value(value).unwrap()
}

// ============================================================
// Acceptance and fan-out
// ============================================================

#[tokio::test]
async fn test_accepted_event_reaches_every_email_recipient() {
    let channel = Arc::new(RecordingEmail::default());
    let (validator, dispatcher) = pipeline(5, channel.clone());

    // 2024-09-23 is a Monday.
    let event = validator
        .validate(&payload(json!({
            "start_time": "2024-09-23T13:00:00Z",
            "program_id": "1",
            "event_type": "market_dispatch"
        })))
        .unwrap();

    let handle = dispatcher.dispatch(event);
    assert_eq!(handle.launched(), 5);
    assert_eq!(handle.skipped, 1);
    assert!(handle.destinations().all(|d| d.ends_with("@example.com")));

    let outcomes = handle.join().await;
    assert_eq!(outcomes.len(), 5);
    assert!(
        outcomes
            .iter()
            .all(|(_, o)| matches!(o, Ok(DeliveryOutcome::Delivered)))
    );

    let sent = channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 5);
    for (_, message) in sent.iter() {
        assert!(
            message
                .body
                .contains("starting on Monday September 23 at 1:00 PM")
        );
        assert!(!message.body.contains("ending on"));
        assert_eq!(message, &sent[0].1);
    }
}

#[tokio::test]
async fn test_end_time_rendered_when_present() {
    let channel = Arc::new(RecordingEmail::default());
    let (validator, dispatcher) = pipeline(1, channel.clone());

    let event = validator
        .validate(&payload(json!({
            "start_time": "2024-09-23T13:00:00Z",
            "end_time": "2024-09-23T17:30:00Z",
            "program_id": "1",
            "event_type": "market_dispatch"
        })))
        .unwrap();
    dispatcher.dispatch(event).join().await;

    let sent = channel.sent.lock().unwrap();
    assert!(
        sent[0]
            .1
            .body
            .contains("ending on Monday September 23 at 5:30 PM")
    );
}

#[tokio::test]
async fn test_rejected_recipient_does_not_affect_siblings() {
    let channel = Arc::new(RecordingEmail {
        reject: Some("member1@example.com"),
        ..Default::default()
    });
    let (validator, dispatcher) = pipeline(3, channel.clone());

    let event = validator
        .validate(&payload(json!({
            "start_time": "2024-09-23T13:00:00Z",
            "program_id": "1",
            "event_type": "market_dispatch"
        })))
        .unwrap();

    let outcomes = dispatcher.dispatch(event).join().await;
    let failed: Vec<_> = outcomes
        .iter()
        .filter(|(_, o)| !o.as_ref().unwrap().is_delivered())
        .map(|(d, _)| d.as_str())
        .collect();
    assert_eq!(failed, vec!["member1@example.com"]);
    assert_eq!(channel.sent.lock().unwrap().len(), 2);

    let stats = dispatcher.stats();
    assert_eq!(stats.launched, 3);
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
}

// ============================================================
// Rejection never dispatches
// ============================================================

#[tokio::test]
async fn test_rejected_event_is_never_dispatched() {
    let channel = Arc::new(RecordingEmail::default());
    let (validator, dispatcher) = pipeline(2, channel.clone());

    let result = validator.validate(&payload(json!({
        "start_time": "2024-09-25T13:00:00Z",
        "end_time": "2024-09-25T12:00:00Z",
        "program_id": "1",
        "event_type": "market_dispatch"
    })));
    assert!(matches!(
        result,
        Err(RejectionReason::InvertedTimeRange { .. })
    ));

    if let Ok(event) = result {
        dispatcher.dispatch(event);
    }
    dispatcher.shutdown().await;
    assert_eq!(dispatcher.stats().launched, 0);
    assert!(channel.sent.lock().unwrap().is_empty());
}
