//! Recipient directory — who listens to which program.
//!
//! The directory is injected into both the validator (program membership)
//! and the dispatcher (program name + recipient lookup). `StaticDirectory`
//! is an in-memory table that stands in for a database-backed store.

use std::collections::BTreeMap;

use herald_common::types::{NotificationType, Recipient};

/// Read-only lookup of programs and their subscribers.
pub trait RecipientDirectory: Send + Sync {
    /// Human-readable name of `program_id`, if the program exists.
    fn program_name(&self, program_id: &str) -> Option<String>;

    /// All recipients subscribed to `program_id`, regardless of channel type.
    fn recipients_for(&self, program_id: &str) -> Vec<Recipient>;
}

/// In-memory program catalog and recipient table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    programs: BTreeMap<String, String>,
    recipients: Vec<Recipient>,
}

impl StaticDirectory {
    pub fn builder() -> StaticDirectoryBuilder {
        StaticDirectoryBuilder::default()
    }

    /// The built-in table the service ships with.
    pub fn seeded() -> Self {
        Self::builder()
            .program("1", "Capacity Bidding Program")
            .program("2", "Emergency Load Reduction Program")
            .recipient(Recipient::new(
                "grid-ops@example.com",
                NotificationType::Email,
                ["1", "2"],
            ))
            .recipient(Recipient::new(
                "facilities@example.com",
                NotificationType::Email,
                ["1"],
            ))
            .recipient(Recipient::new(
                "+15555550100",
                NotificationType::Sms,
                ["1"],
            ))
            .build()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

impl RecipientDirectory for StaticDirectory {
    fn program_name(&self, program_id: &str) -> Option<String> {
        self.programs.get(program_id).cloned()
    }

    fn recipients_for(&self, program_id: &str) -> Vec<Recipient> {
        self.recipients
            .iter()
            .filter(|r| r.subscribes_to(program_id))
            .cloned()
            .collect()
    }
}

/// Builder for [`StaticDirectory`].
#[derive(Debug, Default)]
pub struct StaticDirectoryBuilder {
    programs: BTreeMap<String, String>,
    recipients: Vec<Recipient>,
}

impl StaticDirectoryBuilder {
    pub fn program(mut self, program_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.programs.insert(program_id.into(), name.into());
        self
    }

    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    pub fn build(self) -> StaticDirectory {
        StaticDirectory {
            programs: self.programs,
            recipients: self.recipients,
        }
    }
}
