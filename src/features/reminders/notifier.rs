//! # Feature: Local Notifications
//!
//! Notification collaborator contract plus an in-process implementation that
//! turns every scheduled reminder into a tokio timer. Delivered reminders are
//! logged and optionally forwarded on a channel.
//!
//! Timers follow the exact `fire_at` instant read against a wall clock.
//! `fire_in_seconds` is truncated to whole seconds, so sleeping on it alone
//! would fire early.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.2.0: Deadlines computed from `fire_at` with an injectable wall clock
//! - 1.1.0: Added dismiss_all for the "pill taken" action
//! - 1.0.0: Initial release with timer-backed delivery and cancellation

use crate::core::MedScanError;
use crate::features::reminders::schedule::ScheduledNotification;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Notification scheduler collaborator
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Submit a notification, returning an id usable with `cancel`
    async fn schedule(&self, notification: &ScheduledNotification) -> Result<String, MedScanError>;

    /// Cancel a pending notification. Returns false if it was unknown or already delivered.
    async fn cancel(&self, id: &str) -> bool;

    /// Cancel every pending notification, returning how many were dropped
    async fn dismiss_all(&self) -> usize;
}

/// Wall-clock source used to turn `fire_at` into a timer deadline
pub type WallClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A reminder that reached its fire time
#[derive(Debug, Clone)]
pub struct DeliveredNotification {
    pub id: String,
    pub drug_name: String,
    pub hour: u32,
    pub title: String,
    pub body: String,
    /// The slot this delivery was scheduled for
    pub fire_at: DateTime<FixedOffset>,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct LocalNotifier {
    pending: Arc<DashMap<String, JoinHandle<()>>>,
    delivered: Option<mpsc::UnboundedSender<DeliveredNotification>>,
    clock: WallClock,
}

impl Default for LocalNotifier {
    fn default() -> Self {
        LocalNotifier {
            pending: Arc::new(DashMap::new()),
            delivered: None,
            clock: Arc::new(Utc::now),
        }
    }
}

impl LocalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: WallClock) -> Self {
        self.clock = clock;
        self
    }

    /// Forward every delivered notification to the returned receiver
    pub fn with_delivery_channel(mut self) -> (Self, mpsc::UnboundedReceiver<DeliveredNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.delivered = Some(sender);
        (self, receiver)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl NotificationSink for LocalNotifier {
    async fn schedule(&self, notification: &ScheduledNotification) -> Result<String, MedScanError> {
        if notification.fire_in_seconds < 0 {
            return Err(MedScanError::Scheduling {
                hour: notification.hour,
                reason: format!("negative delay {}s", notification.fire_in_seconds),
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let remaining = notification.fire_at.with_timezone(&Utc) - (self.clock)();
        let deadline = Instant::now() + remaining.to_std().unwrap_or(Duration::ZERO);
        let pending = self.pending.clone();
        let delivered = self.delivered.clone();
        let clock = self.clock.clone();
        let task_id = id.clone();
        let drug_name = notification.drug_name.clone();
        let hour = notification.hour;
        let fire_at = notification.fire_at;
        let title = notification.title.clone();
        let body = notification.body.clone();
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            // Wait until the handle is in `pending` so removal below always finds it
            if registered_rx.await.is_err() {
                return;
            }
            tokio::time::sleep_until(deadline).await;
            pending.remove(&task_id);

            info!("🔔 {title} - {body}");

            if let Some(sender) = delivered {
                let message = DeliveredNotification {
                    id: task_id,
                    drug_name,
                    hour,
                    title,
                    body,
                    fire_at,
                    delivered_at: clock(),
                };
                if sender.send(message).is_err() {
                    debug!("Delivery listener gone");
                }
            }
        });

        self.pending.insert(id.clone(), handle);
        let _ = registered_tx.send(());

        debug!(
            "Scheduled {id} for {} ({}s)",
            notification.fire_at, notification.fire_in_seconds
        );
        Ok(id)
    }

    async fn cancel(&self, id: &str) -> bool {
        match self.pending.remove(id) {
            Some((_, handle)) => {
                handle.abort();
                debug!("Cancelled notification {id}");
                true
            }
            None => {
                debug!("Cannot cancel {id}: not pending");
                false
            }
        }
    }

    async fn dismiss_all(&self) -> usize {
        let ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        let mut dismissed = 0;

        for id in ids {
            if let Some((_, handle)) = self.pending.remove(&id) {
                handle.abort();
                dismissed += 1;
            }
        }

        info!("Dismissed {dismissed} pending notification(s)");
        dismissed
    }
}
