//! # Reminders Feature
//!
//! Medication reminder scheduling with local, timer-backed delivery.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.2.0: Exact-instant timers and single-slot re-arming
//! - 1.1.0: YAML reminder plans
//! - 1.0.0: Initial release

pub mod notifier;
pub mod plan;
pub mod schedule;
pub mod scheduler;

pub use notifier::{DeliveredNotification, LocalNotifier, NotificationSink, WallClock};
pub use plan::{PlanEntry, ReminderPlan};
pub use schedule::{compute_schedule, notification_for, ReminderSpec, ScheduledNotification};
pub use scheduler::{ReminderScheduler, ScheduleReport, ScheduledReminder};
