use std::collections::HashMap;
use std::sync::Arc;

use herald_common::types::NotificationType;

use crate::channel::NotificationChannel;

/// Channels available for delivery, keyed by recipient notification type.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<NotificationType, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistry {
    pub fn builder() -> ChannelRegistryBuilder {
        ChannelRegistryBuilder::default()
    }

    /// Channel for `notification_type`, or `None` when that type is not implemented.
    pub fn get(&self, notification_type: NotificationType) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.get(&notification_type).cloned()
    }

    pub fn supports(&self, notification_type: NotificationType) -> bool {
        self.channels.contains_key(&notification_type)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.channels.keys().collect();
        types.sort();
        f.debug_struct("ChannelRegistry")
            .field("channels", &types)
            .finish()
    }
}

/// Builder for [`ChannelRegistry`].
#[derive(Default)]
pub struct ChannelRegistryBuilder {
    channels: HashMap<NotificationType, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistryBuilder {
    /// Register a channel under its own notification type, replacing any previous one.
    pub fn register(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        let notification_type = channel.notification_type();
        if self.channels.insert(notification_type, channel).is_some() {
            tracing::warn!(%notification_type, "Replacing previously registered channel");
        }
        self
    }

    pub fn build(self) -> ChannelRegistry {
        ChannelRegistry {
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Delivered, DeliveryError};
    use async_trait::async_trait;
    use herald_common::types::NotificationMessage;

    struct NullEmail;

    #[async_trait]
    impl NotificationChannel for NullEmail {
        fn notification_type(&self) -> NotificationType {
            NotificationType::Email
        }

        async fn send(
            &self,
            destination: &str,
            _message: &NotificationMessage,
        ) -> Result<Delivered, DeliveryError> {
            Ok(Delivered {
                destination: destination.to_string(),
                detail: String::new(),
            })
        }
    }

    #[test]
    fn test_empty_registry_supports_nothing() {
        let registry = ChannelRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.get(NotificationType::Email).is_none());
    }

    #[test]
    fn test_registered_channel_resolved_by_type() {
        let registry = ChannelRegistry::builder()
            .register(Arc::new(NullEmail))
            .build();
        assert_eq!(registry.len(), 1);
        assert!(registry.supports(NotificationType::Email));
        assert!(!registry.supports(NotificationType::Sms));
        assert!(registry.get(NotificationType::Email).is_some());
        assert_eq!(format!("{:?}", registry), "ChannelRegistry { channels: [Email] }");
    }
}
