//! A notification channel that keeps what it was asked to send.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use rpm_contracts::error::{PipelineError, PipelineResult};
use rpm_core::traits::NotificationChannel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub subject: String,
    pub message: String,
}

/// Records every published notification under a named topic.
#[derive(Debug)]
pub struct RecordingChannel {
    topic: String,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingChannel {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl NotificationChannel for RecordingChannel {
    fn publish(&self, subject: &str, message: &str) -> PipelineResult<()> {
        let mut sent = self.sent.lock().map_err(|e| PipelineError::Notification {
            reason: format!("outbox lock poisoned: {}", e),
        })?;
        info!(topic = %self.topic, subject = %subject, "notification published");
        sent.push(Notification {
            topic: self.topic.clone(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
