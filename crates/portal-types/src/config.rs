//! Shell configuration loaded from `portal.toml`.
//!
//! Every field has a default so an empty file (or no file at all) yields a
//! working shell pointed at [`DEFAULT_BASE_URL`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PortalError, Result};

/// Remote application loaded when no config overrides it.
pub const DEFAULT_BASE_URL: &str = "https://jambgenius.vercel.app";

/// Top-level shell configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Remote web application URL.
    pub base_url: String,
    /// Display name used in the offline document and notifications.
    pub app_name: String,
    /// User agent reported by the browsing surface and downloads.
    pub user_agent: String,
    /// Version string returned by `getAppVersion()`.
    pub app_version: String,
    /// Custom URL scheme intercepted as a deep link (without `://`).
    pub deep_link_scheme: String,
    /// Host fragments that stay inside the shell. Anything else opens
    /// in the external handler.
    pub allowed_hosts: Vec<String>,
    /// URL schemes always delegated to the external handler.
    pub external_schemes: Vec<String>,
    /// Window global set to `true` after each load so the page can tell it
    /// runs inside the shell.
    pub in_app_global: String,
    /// URL opened externally by `openSignIn()`.
    pub sign_in_url: String,
    /// Key-value store location. `None` keeps session data in memory.
    pub store_path: Option<PathBuf>,
    pub splash: SplashConfig,
    pub progress: ProgressConfig,
    pub notifications: NotificationConfig,
    pub probe: ProbeConfig,
    /// Directory the headless desktop surface writes rendered documents to.
    pub document_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_name: "JambGenius".to_string(),
            user_agent: "JambGeniusApp/1.1 Android".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            deep_link_scheme: "app".to_string(),
            allowed_hosts: vec![
                "jambgenius".to_string(),
                "vercel.app".to_string(),
                "google.com".to_string(),
                "gstatic.com".to_string(),
                "firebaseapp.com".to_string(),
                "paystack".to_string(),
            ],
            external_schemes: vec![
                "tel".to_string(),
                "mailto".to_string(),
                "whatsapp".to_string(),
            ],
            in_app_global: "isJambGeniusApp".to_string(),
            sign_in_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            store_path: None,
            splash: SplashConfig::default(),
            progress: ProgressConfig::default(),
            notifications: NotificationConfig::default(),
            probe: ProbeConfig::default(),
            document_dir: None,
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded shell config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| PortalError::Config(format!("base_url {:?}: {e}", self.base_url)))?;
        if self.deep_link_scheme.is_empty() || self.deep_link_scheme.contains(':') {
            return Err(PortalError::Config(format!(
                "deep_link_scheme must be a bare scheme name, got {:?}",
                self.deep_link_scheme
            )));
        }
        if !is_js_identifier(&self.in_app_global) {
            return Err(PortalError::Config(format!(
                "in_app_global must be a script identifier, got {:?}",
                self.in_app_global
            )));
        }
        Ok(())
    }
}

/// Whether `name` can follow `window.` in page script.
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Splash screen timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplashConfig {
    /// Time before the main screen is shown, in milliseconds.
    pub duration_ms: u64,
    /// Interval between loading message changes, in milliseconds.
    pub message_interval_ms: u64,
    pub messages: Vec<String>,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            message_interval_ms: 600,
            messages: vec![
                "Loading...".to_string(),
                "Preparing your study materials...".to_string(),
                "Getting things ready...".to_string(),
                "Almost there...".to_string(),
            ],
        }
    }
}

impl SplashConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn message_interval(&self) -> Duration {
        Duration::from_millis(self.message_interval_ms)
    }
}

/// Loading indicator behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Delay before hiding the indicator once progress hits 100%.
    pub hide_delay_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { hide_delay_ms: 200 }
    }
}

impl ProgressConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}

/// Push notification channel settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
    /// Body used when the payload carries none.
    pub default_body: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_id: "jambgenius_notifications".to_string(),
            channel_name: "JambGenius Notifications".to_string(),
            channel_description: "Notifications for study reminders, messages, and alerts"
                .to_string(),
            default_body: "New notification".to_string(),
        }
    }
}

/// Desktop reachability probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    /// How often the watcher thread re-probes, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "1.1.1.1".to_string(),
            port: 443,
            timeout_ms: 1500,
            poll_interval_ms: 3000,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
