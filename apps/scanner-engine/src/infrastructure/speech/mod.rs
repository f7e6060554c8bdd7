//! Speech Device Adapters
//!
//! The real text-to-speech engine is a collaborator concern; the engine
//! binary ships with a paced adapter that logs each utterance and
//! simulates reading time, which is enough to exercise the full squawk
//! pipeline end to end.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::application::ports::{SpeechError, SpeechOutcome, SpeechPort};

/// Pacing parameters for the simulated device.
#[derive(Debug, Clone, Copy)]
pub struct PacedSpeechConfig {
    /// Fixed lead-in per utterance.
    pub base: Duration,
    /// Additional time per character of text.
    pub per_char: Duration,
    /// Hard cap on a single utterance.
    pub max: Duration,
}

impl Default for PacedSpeechConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(400),
            per_char: Duration::from_millis(45),
            max: Duration::from_secs(15),
        }
    }
}

/// Speech adapter that logs the utterance and sleeps for a text-length
/// derived duration. `stop` interrupts the current utterance.
#[derive(Debug, Default)]
pub struct PacedSpeech {
    config: PacedSpeechConfig,
    interrupt: Notify,
}

impl PacedSpeech {
    /// Create an adapter with the given pacing.
    #[must_use]
    pub fn new(config: PacedSpeechConfig) -> Self {
        Self {
            config,
            interrupt: Notify::new(),
        }
    }

    fn utterance_duration(&self, text: &str) -> Duration {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        (self.config.base + self.config.per_char * chars).min(self.config.max)
    }
}

#[async_trait]
impl SpeechPort for PacedSpeech {
    async fn speak(&self, text: &str) -> Result<SpeechOutcome, SpeechError> {
        let duration = self.utterance_duration(text);
        tracing::info!(ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), %text, "speaking");

        tokio::select! {
            () = tokio::time::sleep(duration) => Ok(SpeechOutcome::Completed),
            () = self.interrupt.notified() => Ok(SpeechOutcome::Stopped),
        }
    }

    async fn stop(&self) {
        self.interrupt.notify_waiters();
    }
}
