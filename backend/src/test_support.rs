//! Test doubles shared by unit tests across the crate.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::OutgoingMessage;
use crate::domain::ports::{BotNotifier, BotNotifierError};

/// Clock frozen at a given instant that tests can move forward.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock() += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose every delivery fails after recording.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl BotNotifier for RecordingNotifier {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), BotNotifierError> {
        match self.sent.lock() {
            Ok(mut guard) => guard.push(message.clone()),
            Err(poisoned) => poisoned.into_inner().push(message.clone()),
        }
        if self.fail {
            return Err(BotNotifierError::api("Forbidden: bot was blocked by the user"));
        }
        Ok(())
    }
}
