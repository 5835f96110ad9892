//! Launch splash: a fixed-duration screen with rotating status messages.

use std::time::Duration;

use portal_types::config::SplashConfig;

const FALLBACK_MESSAGE: &str = "Loading...";

#[derive(Debug, Clone)]
pub struct SplashScreen {
    messages: Vec<String>,
    interval: Duration,
    duration: Duration,
}

impl SplashScreen {
    pub fn from_config(config: &SplashConfig) -> Self {
        Self {
            messages: config.messages.clone(),
            interval: config.message_interval(),
            duration: config.duration(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Message showing `elapsed` into the splash. Stays on the last message
    /// once the list is exhausted.
    pub fn message_at(&self, elapsed: Duration) -> &str {
        if self.messages.is_empty() {
            return FALLBACK_MESSAGE;
        }
        let step = if self.interval.is_zero() {
            0
        } else {
            (elapsed.as_millis() / self.interval.as_millis()) as usize
        };
        &self.messages[step.min(self.messages.len() - 1)]
    }

    pub fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Points at which the visible message changes, starting at zero.
    pub fn schedule(&self) -> Vec<(Duration, &str)> {
        let mut out = vec![(Duration::ZERO, self.message_at(Duration::ZERO))];
        if self.interval.is_zero() {
            return out;
        }
        let mut at = self.interval;
        for msg in self.messages.iter().skip(1) {
            if at >= self.duration {
                break;
            }
            out.push((at, msg.as_str()));
            at += self.interval;
        }
        out
    }

    /// Run the splash to completion. `sleep` blocks for the given time and
    /// `show` displays a message.
    pub fn run(&self, mut sleep: impl FnMut(Duration), mut show: impl FnMut(&str)) {
        let mut now = Duration::ZERO;
        for (at, message) in self.schedule() {
            if at > now {
                sleep(at - now);
                now = at;
            }
            show(message);
        }
        if self.duration > now {
            sleep(self.duration - now);
        }
        log::debug!("Splash finished after {:?}", self.duration);
    }
}
