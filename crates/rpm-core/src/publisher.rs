//! Best-effort alert notification.
//!
//! The stored `Alert` is the durable artifact; notifications are a side
//! channel. `AlertPublisher::publish` never returns an error: an absent
//! channel is a no-op and a delivery failure is logged and reported as a
//! `Delivery::Failed` value.

use std::sync::Arc;

use tracing::{debug, warn};

use rpm_contracts::error::PipelineError;

use crate::traits::NotificationChannel;

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No channel is configured.
    Skipped,
    Delivered,
    Failed(PipelineError),
}

#[derive(Clone, Default)]
pub struct AlertPublisher {
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl AlertPublisher {
    pub fn new(channel: Option<Arc<dyn NotificationChannel>>) -> Self {
        Self { channel }
    }

    /// A publisher with no channel; every publish is skipped.
    pub fn disabled() -> Self {
        Self { channel: None }
    }

    pub fn is_configured(&self) -> bool {
        self.channel.is_some()
    }

    pub fn publish(&self, subject: &str, message: &str) -> Delivery {
        let Some(channel) = &self.channel else {
            debug!(subject = %subject, "no notification channel configured; skipping");
            return Delivery::Skipped;
        };

        match channel.publish(subject, message) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                warn!(subject = %subject, error = %e, "alert notification failed");
                let reason = match e {
                    PipelineError::Notification { reason } => reason,
                    other => other.to_string(),
                };
                Delivery::Failed(PipelineError::Notification { reason })
            }
        }
    }
}
