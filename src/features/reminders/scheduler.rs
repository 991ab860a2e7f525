//! # Feature: Reminder Scheduler
//!
//! Computes a medication schedule and hands each reminder to the
//! notification collaborator. One failed hour never stops the others.
//! Reminders are keyed by (drug, hour): once a replacement for a key has
//! been accepted the earlier notification is cancelled, so repeated runs
//! replace rather than pile up. A rejected replacement leaves the earlier
//! reminder in place.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.3.0: `rearm` for delivered reminders; cancel only after a replacement is accepted
//! - 1.2.0: Replace previously submitted reminders keyed by (drug, hour)
//! - 1.1.0: Per-hour failure isolation with ScheduleReport
//! - 1.0.0: Initial release

use crate::core::MedScanError;
use crate::features::reminders::notifier::{DeliveredNotification, NotificationSink};
use crate::features::reminders::schedule::{
    compute_schedule, notification_for, ReminderSpec, ScheduledNotification,
};
use chrono::{DateTime, Local, TimeZone};
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;

/// (lowercased drug name, target hour)
type ReminderKey = (String, u32);

fn make_key(drug_name: &str, hour: u32) -> ReminderKey {
    (drug_name.to_lowercase(), hour)
}

/// A reminder accepted by the notifier
#[derive(Debug, Clone)]
pub struct ScheduledReminder {
    pub id: String,
    pub notification: ScheduledNotification,
}

/// Outcome of one scheduling run
#[derive(Debug, Default)]
pub struct ScheduleReport {
    /// Accepted reminders in target-hour order
    pub scheduled: Vec<ScheduledReminder>,
    /// One `MedScanError::Scheduling` per hour that could not be submitted
    pub failures: Vec<MedScanError>,
    /// Earlier notifications cancelled because their key was rescheduled
    pub replaced: usize,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    sink: Arc<dyn NotificationSink>,
    submitted: Arc<DashMap<ReminderKey, String>>,
}

impl ReminderScheduler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        ReminderScheduler {
            sink,
            submitted: Arc::new(DashMap::new()),
        }
    }

    /// Schedule `spec` relative to the local wall clock
    pub async fn schedule(&self, spec: &ReminderSpec) -> ScheduleReport {
        let notifications = compute_schedule(spec, &Local::now());
        self.dispatch(spec, notifications).await
    }

    /// Submit precomputed notifications for `spec`, one at a time
    pub async fn dispatch(
        &self,
        spec: &ReminderSpec,
        notifications: Vec<ScheduledNotification>,
    ) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        for notification in notifications {
            let key = make_key(&spec.drug_name, notification.hour);

            match self.sink.schedule(&notification).await {
                Ok(id) => {
                    if let Some(previous) = self.submitted.insert(key, id.clone()) {
                        debug!(
                            "Replacing {} reminder at {:02}:00 ({previous})",
                            spec.drug_name, notification.hour
                        );
                        if previous != id && self.sink.cancel(&previous).await {
                            report.replaced += 1;
                        }
                    }
                    report.scheduled.push(ScheduledReminder { id, notification });
                }
                Err(e) => {
                    let failure = match e {
                        MedScanError::Scheduling { .. } => e,
                        other => MedScanError::Scheduling {
                            hour: notification.hour,
                            reason: other.to_string(),
                        },
                    };
                    error!("Failed to schedule {} reminder: {failure}", spec.drug_name);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            "Scheduled {} reminder(s) for {} ({} failed, {} replaced)",
            report.scheduled.len(),
            spec.drug_name,
            report.failures.len(),
            report.replaced
        );

        report
    }

    /// Queue the next daily occurrence of a reminder that has just fired.
    ///
    /// The next slot is taken after the later of `now` and the delivered
    /// `fire_at`, so a delivery observed before the slot's wall-clock time
    /// never lands on the same slot again.
    pub async fn rearm<Tz: TimeZone>(
        &self,
        spec: &ReminderSpec,
        delivered: &DeliveredNotification,
        now: &DateTime<Tz>,
    ) -> ScheduleReport {
        let fired = delivered.fire_at.with_timezone(&now.timezone());
        let after = if fired > *now { fired } else { now.clone() };
        let notifications: Vec<ScheduledNotification> =
            notification_for(spec, delivered.hour, &after).into_iter().collect();

        self.dispatch(spec, notifications).await
    }

    /// Cancel every reminder submitted for `drug_name`
    pub async fn cancel_all(&self, drug_name: &str) -> usize {
        let drug = drug_name.to_lowercase();
        let keys: Vec<ReminderKey> = self
            .submitted
            .iter()
            .filter(|entry| entry.key().0 == drug)
            .map(|entry| entry.key().clone())
            .collect();

        let mut cancelled = 0;
        for key in keys {
            if let Some((_, id)) = self.submitted.remove(&key) {
                if self.sink.cancel(&id).await {
                    cancelled += 1;
                }
            }
        }

        info!("Cancelled {cancelled} reminder(s) for {drug_name}");
        cancelled
    }

    /// Drop every pending reminder ("pill taken")
    pub async fn dismiss_all(&self) -> usize {
        self.submitted.clear();
        self.sink.dismiss_all().await
    }

    /// Number of (drug, hour) keys currently tracked
    pub fn tracked(&self) -> usize {
        self.submitted.len()
    }
}
