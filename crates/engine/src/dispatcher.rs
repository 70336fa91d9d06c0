//! Dispatch coordinator — fans an accepted event out to its recipients.
//!
//! For each event:
//! 1. Resolve the program name and compose one shared message
//! 2. Look up the program's recipients
//! 3. Pick the channel registered for each recipient's notification type
//!    (recipients without one are skipped)
//! 4. Spawn one delivery task per recipient on the dispatcher's task tracker
//!
//! Delivery tasks share only the immutable message, the channel and the
//! stats counters. A failed or panicking delivery is confined to its own task.
//! Concurrency across all in-flight deliveries is bounded by a semaphore.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use herald_common::types::{DeliveryOutcome, Event, NotificationMessage};
use herald_notifier::{ChannelRegistry, NotificationChannel};

use crate::composer::MessageComposer;
use crate::directory::RecipientDirectory;

/// Running totals across every dispatch handled by a [`Dispatcher`].
#[derive(Debug, Default)]
pub struct DispatchStats {
    launched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub launched: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl DispatchStats {
    fn record(&self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered.fetch_add(1, Ordering::Relaxed),
            DeliveryOutcome::Failed(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            launched: self.launched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Counts a delivery as failed if its task ends without recording an outcome,
/// which happens when the channel panics.
struct OutcomeGuard {
    stats: Arc<DispatchStats>,
    recorded: bool,
}

impl OutcomeGuard {
    fn new(stats: Arc<DispatchStats>) -> Self {
        Self {
            stats,
            recorded: false,
        }
    }

    fn record(mut self, outcome: &DeliveryOutcome) {
        self.stats.record(outcome);
        self.recorded = true;
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if !self.recorded {
            warn!("Delivery ended without an outcome, counted as failed");
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Handle to the delivery tasks launched for one event.
///
/// Dropping it does not cancel anything; deliveries keep running.
#[derive(Debug)]
pub struct DispatchHandle {
    pub dispatch_id: Uuid,
    /// Recipients left out because their channel type is not implemented
    pub skipped: usize,
    deliveries: Vec<(String, JoinHandle<DeliveryOutcome>)>,
}

impl DispatchHandle {
    fn empty(dispatch_id: Uuid) -> Self {
        Self {
            dispatch_id,
            skipped: 0,
            deliveries: Vec::new(),
        }
    }

    /// Number of delivery tasks launched.
    pub fn launched(&self) -> usize {
        self.deliveries.len()
    }

    /// Destinations with a launched delivery, in launch order.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.deliveries.iter().map(|(destination, _)| destination.as_str())
    }

    /// Wait for every delivery and collect its outcome, paired with its destination.
    ///
    /// A task that panicked yields its `JoinError`; the others are unaffected.
    pub async fn join(self) -> Vec<(String, Result<DeliveryOutcome, JoinError>)> {
        let mut outcomes = Vec::with_capacity(self.deliveries.len());
        for (destination, handle) in self.deliveries {
            outcomes.push((destination, handle.await));
        }
        outcomes
    }
}

/// Owns the delivery task group for all accepted events.
#[derive(Clone)]
pub struct Dispatcher {
    directory: Arc<dyn RecipientDirectory>,
    channels: ChannelRegistry,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        channels: ChannelRegistry,
        max_concurrent_deliveries: usize,
    ) -> Self {
        Self {
            directory,
            channels,
            permits: Arc::new(Semaphore::new(max_concurrent_deliveries)),
            tracker: TaskTracker::new(),
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Launch deliveries for `event` and return without waiting for them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, event: Event) -> DispatchHandle {
        let dispatch_id = Uuid::new_v4();

        let Some(program_name) = self.directory.program_name(&event.program_id) else {
            warn!(
                dispatch_id = %dispatch_id,
                program_id = %event.program_id,
                "Program vanished from directory after validation, nothing dispatched"
            );
            return DispatchHandle::empty(dispatch_id);
        };

        let message = Arc::new(MessageComposer::compose(
            &program_name,
            &event.start_time,
            event.end_time.as_ref(),
        ));

        let mut handle = DispatchHandle::empty(dispatch_id);
        for recipient in self.directory.recipients_for(&event.program_id) {
            let Some(channel) = self.channels.get(recipient.notification_type) else {
                debug!(
                    dispatch_id = %dispatch_id,
                    destination = %recipient.destination,
                    notification_type = %recipient.notification_type,
                    "No channel for notification type, recipient skipped"
                );
                handle.skipped += 1;
                continue;
            };

            let span = info_span!(
                "delivery",
                dispatch_id = %dispatch_id,
                destination = %recipient.destination,
                channel = %recipient.notification_type,
            );
            let task = Self::deliver(
                Arc::clone(&self.permits),
                Arc::clone(&self.stats),
                channel,
                recipient.destination.clone(),
                Arc::clone(&message),
            );
            let join = self.tracker.spawn(task.instrument(span));
            handle.deliveries.push((recipient.destination, join));
        }

        self.stats
            .launched
            .fetch_add(handle.launched() as u64, Ordering::Relaxed);
        self.stats
            .skipped
            .fetch_add(handle.skipped as u64, Ordering::Relaxed);

        info!(
            dispatch_id = %dispatch_id,
            program_id = %event.program_id,
            event_type = %event.event_type,
            launched = handle.launched(),
            skipped = handle.skipped,
            "Event dispatched"
        );

        handle
    }

    async fn deliver(
        permits: Arc<Semaphore>,
        stats: Arc<DispatchStats>,
        channel: Arc<dyn NotificationChannel>,
        destination: String,
        message: Arc<NotificationMessage>,
    ) -> DeliveryOutcome {
        let guard = OutcomeGuard::new(stats);
        let outcome = match permits.acquire_owned().await {
            Ok(_permit) => match channel.send(&destination, &message).await {
                Ok(delivered) => {
                    debug!(detail = %delivered.detail, "Delivery succeeded");
                    DeliveryOutcome::Delivered
                }
                Err(e) => {
                    warn!(error = %e, "Delivery failed");
                    DeliveryOutcome::Failed(e.to_string())
                }
            },
            Err(_) => DeliveryOutcome::Failed("delivery permits closed".to_string()),
        };

        guard.record(&outcome);
        outcome
    }

    /// Number of delivery tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Close the task group and wait for in-flight deliveries.
    pub async fn shutdown(&self) {
        self.tracker.close();
        info!(in_flight = self.tracker.len(), "Waiting for in-flight deliveries");
        self.tracker.wait().await;
        info!("All deliveries finished");
    }
}
