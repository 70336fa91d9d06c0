//! Message composer — renders the notification text for an event window.

use chrono::{DateTime, FixedOffset};

use herald_common::types::NotificationMessage;

/// Stateless renderer for notification messages.
pub struct MessageComposer;

impl MessageComposer {
    /// Render the subject and body for `program_name` over `[start, end]`.
    ///
    /// Dates and times are shown in each timestamp's own offset.
    pub fn compose(
        program_name: &str,
        start: &DateTime<FixedOffset>,
        end: Option<&DateTime<FixedOffset>>,
    ) -> NotificationMessage {
        let mut window = format!("starting on {}", Self::describe(start));
        if let Some(end) = end {
            window.push_str(&format!(", ending on {}", Self::describe(end)));
        }

        let body = format!(
            "Hello,\n\n\
             This is a notification for the {} program, {}.\n\n\
             This message was sent automatically; please do not reply.\n",
            program_name, window
        );

        NotificationMessage {
            subject: format!("{} event notification", program_name),
            body,
        }
    }

    /// `Monday September 23 at 1:00 PM`
    fn describe(ts: &DateTime<FixedOffset>) -> String {
        format!("{} at {}", ts.format("%A %B %-d"), ts.format("%-I:%M %p"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn test_start_only() {
        let message =
            MessageComposer::compose("Capacity Bidding Program", &ts("2024-09-23T13:00:00Z"), None);
        assert_eq!(message.subject, "Capacity Bidding Program event notification");
        assert!(message.body.starts_with("Hello,"));
        assert!(message.body.contains("Capacity Bidding Program"));
        assert!(
            message
                .body
                .contains("starting on Monday September 23 at 1:00 PM")
        );
        assert!(!message.body.contains("ending on"));
    }

    #[test]
    fn test_start_and_end() {
        let message = MessageComposer::compose(
            "Capacity Bidding Program",
            &ts("2024-09-23T13:00:00Z"),
            Some(&ts("2024-09-24T09:05:00Z")),
        );
        assert!(message.body.contains(
            "starting on Monday September 23 at 1:00 PM, ending on Tuesday September 24 at 9:05 AM"
        ));
    }

    #[test]
    fn test_renders_in_timestamp_offset() {
        // 20:00 UTC, shown as 1:00 PM in UTC-7.
        let message =
            MessageComposer::compose("Program", &ts("2024-09-23T13:00:00-07:00"), None);
        assert!(message.body.contains("starting on Monday September 23 at 1:00 PM"));
    }

    #[test]
    fn test_midnight_and_noon() {
        let message = MessageComposer::compose(
            "Program",
            &ts("2024-09-23T00:00:00Z"),
            Some(&ts("2024-09-23T12:30:00Z")),
        );
        assert!(message.body.contains("at 12:00 AM"));
        assert!(message.body.contains("at 12:30 PM"));
    }

    #[test]
    fn test_deterministic() {
        let start = ts("2024-09-23T13:00:00Z");
        let end = ts("2024-09-23T15:00:00Z");
        let first = MessageComposer::compose("Program", &start, Some(&end));
        let second = MessageComposer::compose("Program", &start, Some(&end));
        assert_eq!(first, second);
        assert_eq!(first.body.as_bytes(), second.body.as_bytes());
    }
}
