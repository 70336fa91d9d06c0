//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_common::error::AppError;
use herald_engine::directory::RecipientDirectory;
use herald_engine::dispatcher::Dispatcher;
use herald_engine::validator::EventValidator;
use herald_notifier::{ChannelRegistry, EmailChannel, EmailConfig};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub validator: EventValidator,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(validator: EventValidator, dispatcher: Dispatcher) -> Self {
        Self {
            validator,
            dispatcher,
        }
    }

    /// Wire the production channels around `directory`.
    pub fn from_config(
        config: &AppConfig,
        directory: Arc<dyn RecipientDirectory>,
    ) -> Result<Self, AppError> {
        let email = EmailChannel::new(EmailConfig::from_app_config(config))?;
        let channels = ChannelRegistry::builder().register(Arc::new(email)).build();

        let validator = EventValidator::new(Arc::clone(&directory));
        let dispatcher = Dispatcher::new(directory, channels, config.max_concurrent_deliveries);

        Ok(Self::new(validator, dispatcher))
    }
}
