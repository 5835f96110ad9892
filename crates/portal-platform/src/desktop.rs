//! Headless desktop implementation of the platform services.
//!
//! Screen chrome is reported through the log, notifications are logged,
//! downloads are handed to the desktop's URL opener.

use std::collections::HashSet;
use std::process::Command;

use portal_types::error::{PortalError, Result};
use portal_types::event::{Permission, PermissionRequest, ShellEvent};
use portal_types::looper::MainHandle;

use crate::services::{
    ChannelSpec, DownloadJob, DownloadService, ExternalHandler, Notification,
    NotificationService, PermissionService, Platform, UiService,
};

/// Default platform for desktop development runs.
#[derive(Debug, Default)]
pub struct DesktopPlatform {
    denied: HashSet<Permission>,
    download_receiver: Option<MainHandle>,
    channels: HashSet<String>,
    offline_banner: bool,
    refresh_enabled: bool,
    finished: bool,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer future requests for `permission` with "denied".
    pub fn deny(&mut self, permission: Permission) {
        self.denied.insert(permission);
    }

    pub fn offline_banner_visible(&self) -> bool {
        self.offline_banner
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl PermissionService for DesktopPlatform {
    fn is_granted(&self, permission: Permission) -> bool {
        !self.denied.contains(&permission)
    }

    fn request(&mut self, request: PermissionRequest, handle: &MainHandle) -> Result<()> {
        let granted = request
            .permissions()
            .iter()
            .map(|p| self.is_granted(*p))
            .collect();
        if !handle.post(ShellEvent::PermissionResult { request, granted }) {
            return Err(PortalError::Platform("main looper is gone".into()));
        }
        Ok(())
    }
}

impl DownloadService for DesktopPlatform {
    fn enqueue(&mut self, job: &DownloadJob) -> Result<()> {
        Err(PortalError::Download(format!(
            "no download manager for {}",
            job.file_name
        )))
    }

    fn register_completion_receiver(&mut self, handle: MainHandle) -> Result<()> {
        if self.download_receiver.is_none() {
            self.download_receiver = Some(handle);
        }
        Ok(())
    }

    fn unregister_completion_receiver(&mut self) -> Result<()> {
        self.download_receiver
            .take()
            .map(|_| ())
            .ok_or(PortalError::NotRegistered("download receiver"))
    }
}

/// The desktop URL opener for `url`. The URL is passed as one argument to
/// the opener itself, never through a command interpreter.
pub(crate) fn opener_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("rundll32");
        c.arg("url.dll,FileProtocolHandler");
        c
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url);
    cmd
}

impl ExternalHandler for DesktopPlatform {
    fn open_external(&mut self, url: &str) -> Result<()> {
        let status = opener_command(url).status()?;
        if status.success() {
            log::info!("Opened externally: {url}");
            Ok(())
        } else {
            Err(PortalError::Platform(format!(
                "external handler exited with {status}"
            )))
        }
    }
}

impl UiService for DesktopPlatform {
    fn show_toast(&mut self, message: &str) {
        log::info!("[toast] {message}");
    }

    fn set_offline_banner(&mut self, visible: bool) {
        if self.offline_banner != visible {
            log::info!("[banner] offline banner {}", if visible { "shown" } else { "hidden" });
        }
        self.offline_banner = visible;
    }

    fn show_progress(&mut self, percent: u8) {
        log::debug!("[progress] {percent}%");
    }

    fn hide_progress(&mut self) {
        log::debug!("[progress] hidden");
    }

    fn set_refreshing(&mut self, refreshing: bool) {
        log::debug!("[refresh] refreshing={refreshing}");
    }

    fn set_refresh_enabled(&mut self, enabled: bool) {
        self.refresh_enabled = enabled;
    }

    fn finish_screen(&mut self) {
        log::info!("Main screen finished");
        self.finished = true;
    }
}

impl NotificationService for DesktopPlatform {
    fn ensure_channel(&mut self, channel: &ChannelSpec) -> Result<()> {
        if self.channels.insert(channel.id.clone()) {
            log::debug!("Created notification channel {}", channel.id);
        }
        Ok(())
    }

    fn notify(&mut self, id: i32, notification: &Notification) -> Result<()> {
        if !self.channels.contains(&notification.channel_id) {
            return Err(PortalError::Platform(format!(
                "unknown notification channel {}",
                notification.channel_id
            )));
        }
        log::info!(
            "[notification #{id}] {} - {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

impl Platform for DesktopPlatform {}
