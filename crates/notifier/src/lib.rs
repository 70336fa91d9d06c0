//! Notification channels.
//!
//! A channel takes one composed message and one destination and reports
//! whether the provider accepted it. Channels are registered per
//! [`NotificationType`](herald_common::types::NotificationType) in a
//! [`ChannelRegistry`]; recipient types without a registered channel are
//! simply not deliverable yet.
//!
//! - Email (SMTP over implicit TLS)

pub mod channel;
pub mod email;
pub mod registry;

pub use channel::{Delivered, DeliveryError, NotificationChannel};
pub use email::{EmailChannel, EmailConfig};
pub use registry::{ChannelRegistry, ChannelRegistryBuilder};
