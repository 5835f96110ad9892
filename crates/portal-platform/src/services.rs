//! Platform service traits.

use portal_types::error::Result;
use portal_types::event::{Permission, PermissionRequest};
use portal_types::looper::MainHandle;

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Transport a network is carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    Bluetooth,
    Vpn,
}

impl Transport {
    /// Whether this transport alone counts as usable internet.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Wifi | Self::Cellular | Self::Ethernet)
    }
}

/// Capabilities of the active network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkCapabilities {
    pub transports: Vec<Transport>,
}

impl NetworkCapabilities {
    pub fn with_transports(transports: &[Transport]) -> Self {
        Self {
            transports: transports.to_vec(),
        }
    }

    /// At least one of WiFi, cellular, or wired transport is present.
    ///
    /// This checks transport capability, not actual reachability of any
    /// host.
    pub fn has_usable_internet(&self) -> bool {
        self.transports.iter().any(|t| t.is_usable())
    }
}

/// Point-in-time connectivity query. Shared with the script thread.
pub trait ConnectivityProbe: Send + Sync {
    /// Capabilities of the active network, or `None` if there is none.
    fn active_capabilities(&self) -> Option<NetworkCapabilities>;

    /// Synchronous "has usable internet" check.
    fn has_connection(&self) -> bool {
        self.active_capabilities()
            .is_some_and(|caps| caps.has_usable_internet())
    }
}

/// Registration for asynchronous connectivity change callbacks.
///
/// Implementations post [`ShellEvent::NetworkAvailable`] and
/// [`ShellEvent::NetworkLost`] through the handle.
///
/// [`ShellEvent::NetworkAvailable`]: portal_types::event::ShellEvent::NetworkAvailable
/// [`ShellEvent::NetworkLost`]: portal_types::event::ShellEvent::NetworkLost
pub trait ConnectivityService {
    /// Start delivering change events. Registering twice is a no-op.
    fn register_network_callback(&mut self, handle: MainHandle) -> Result<()>;

    /// Stop delivering change events. Returns
    /// [`PortalError::NotRegistered`](portal_types::error::PortalError::NotRegistered)
    /// when nothing is registered.
    fn unregister_network_callback(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// OS runtime permissions.
pub trait PermissionService {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Ask the OS for every permission `request` needs. The answer arrives
    /// later as a `ShellEvent::PermissionResult` posted through `handle`.
    fn request(&mut self, request: PermissionRequest, handle: &MainHandle) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

/// A download ready to hand to the platform download manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub user_agent: String,
}

impl DownloadJob {
    pub fn description(&self) -> String {
        format!("Downloading {}", self.file_name)
    }
}

/// Platform download manager.
pub trait DownloadService {
    fn enqueue(&mut self, job: &DownloadJob) -> Result<()>;

    /// Start posting `ShellEvent::DownloadComplete`. Registering twice is a
    /// no-op.
    fn register_completion_receiver(&mut self, handle: MainHandle) -> Result<()>;

    /// Returns `PortalError::NotRegistered` when nothing is registered.
    fn unregister_completion_receiver(&mut self) -> Result<()>;
}

/// Hands a URL to whatever the OS uses for it (browser, dialer, mail).
pub trait ExternalHandler {
    fn open_external(&mut self, url: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Screen chrome
// ---------------------------------------------------------------------------

/// Native UI around the browsing surface.
pub trait UiService {
    /// Transient user-visible message.
    fn show_toast(&mut self, message: &str);

    fn set_offline_banner(&mut self, visible: bool);

    /// Show the loading indicator at `percent`.
    fn show_progress(&mut self, percent: u8);

    fn hide_progress(&mut self);

    /// Spinner of the pull-to-refresh gesture.
    fn set_refreshing(&mut self, refreshing: bool);

    /// Whether the pull-to-refresh gesture may start.
    fn set_refresh_enabled(&mut self, enabled: bool);

    /// Close the main screen (back pressed with no history).
    fn finish_screen(&mut self);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Notification channel definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A notification ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    /// Use the expanded big-text layout.
    pub big_text: bool,
    /// Extras handed to the main screen when the notification is tapped.
    pub extras: Vec<(String, String)>,
}

impl Notification {
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Platform notification manager.
pub trait NotificationService {
    /// Create the channel if it does not exist yet.
    fn ensure_channel(&mut self, channel: &ChannelSpec) -> Result<()>;

    fn notify(&mut self, id: i32, notification: &Notification) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Unified platform trait
// ---------------------------------------------------------------------------

/// Aggregate trait for the services the controller drives directly.
pub trait Platform:
    PermissionService + DownloadService + ExternalHandler + UiService + NotificationService
{
}
