use async_trait::async_trait;
use thiserror::Error;

use herald_common::types::{NotificationMessage, NotificationType};

/// Provider acknowledgement for one accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub destination: String,
    /// Provider response text, if any
    pub detail: String,
}

/// A delivery that did not reach its destination.
///
/// Always scoped to a single destination; never fatal to anything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("invalid destination '{destination}': {reason}")]
    InvalidAddress { destination: String, reason: String },

    #[error("could not build message for '{destination}': {reason}")]
    Build { destination: String, reason: String },

    #[error("'{destination}' rejected by provider: {reason}")]
    Rejected { destination: String, reason: String },

    #[error("delivery to '{destination}' failed: {reason}")]
    Transport { destination: String, reason: String },
}

impl DeliveryError {
    pub fn destination(&self) -> &str {
        match self {
            DeliveryError::InvalidAddress { destination, .. }
            | DeliveryError::Build { destination, .. }
            | DeliveryError::Rejected { destination, .. }
            | DeliveryError::Transport { destination, .. } => destination,
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Recipient type this channel serves.
    fn notification_type(&self) -> NotificationType;

    /// Deliver `message` to `destination`.
    ///
    /// Implementations own any connection they open for the duration of the
    /// call and release it before returning, whatever the outcome.
    async fn send(
        &self,
        destination: &str,
        message: &NotificationMessage,
    ) -> Result<Delivered, DeliveryError>;
}
