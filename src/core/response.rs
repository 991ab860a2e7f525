//! Terminal formatting for drug events and scheduled reminders
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added format_notification and human-readable durations
//! - 1.0.0: Initial release with event formatting

use crate::features::lookup::DrugEvent;
use crate::features::reminders::ScheduledNotification;

/// Longest field rendered before truncation
pub const DISPLAY_LIMIT: usize = 400;

const NOT_AVAILABLE: &str = "N/A";

/// Format one drug event as a block of `Label: value` lines
pub fn format_drug_event(event: &DrugEvent) -> String {
    let id = if event.id.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        event.id.clone()
    };

    format!(
        "Medicine: {}\nEvent ID: {}\nReaction: {}\nDrug: {}",
        event.source_drug,
        id,
        join_or_na(&event.reactions),
        join_or_na(&event.products)
    )
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        truncate_for_display(&items.join(", "))
    }
}

/// Format a reminder as `HH:MM <title> (in ...)` followed by its body
pub fn format_notification(notification: &ScheduledNotification) -> String {
    format!(
        "{} {} (in {})\n  {}",
        notification.fire_at.format("%Y-%m-%d %H:%M"),
        notification.title,
        format_duration(notification.fire_in_seconds),
        notification.body
    )
}

/// Truncate text to the display limit, adding ellipsis if needed
pub fn truncate_for_display(text: &str) -> String {
    if text.len() <= DISPLAY_LIMIT {
        text.to_string()
    } else {
        // Find a safe UTF-8 boundary
        let mut end = DISPLAY_LIMIT - 3; // Room for "..."
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// Format a duration in seconds into a human-readable string
pub fn format_duration(seconds: i64) -> String {
    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if seconds < 60 {
        format!("{} second{}", seconds, plural(seconds))
    } else if seconds < 3600 {
        let mins = seconds / 60;
        format!("{} minute{}", mins, plural(mins))
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!(
                "{} hour{} {} minute{}",
                hours,
                plural(hours),
                mins,
                plural(mins)
            )
        } else {
            format!("{} hour{}", hours, plural(hours))
        }
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!("{} day{} {} hour{}", days, plural(days), hours, plural(hours))
        } else {
            format!("{} day{}", days, plural(days))
        }
    }
}
