//! Events delivered to the shell's main looper.
//!
//! Platform callbacks (network changes, page load notifications, permission
//! answers, bridge requests from the script thread) are all translated into
//! a [`ShellEvent`] and posted to the looper before any shell state changes.

/// Whether the device currently has a usable internet transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn from_usable(usable: bool) -> Self {
        if usable { Self::Online } else { Self::Offline }
    }

    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Progress of the main navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoadState {
    Loading,
    Loaded,
    Failed,
}

/// Cause reported by the browsing surface for a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// DNS lookup failed.
    HostLookup,
    /// TCP connect refused or unreachable.
    Connect,
    Timeout,
    /// Read or write failure mid-transfer.
    Io,
    /// The surface could not classify the failure.
    Unknown,
    BadUrl,
    Ssl,
    Authentication,
    FileNotFound,
    TooManyRequests,
    UnsupportedScheme,
    /// Platform-specific error code with no mapping.
    Other(i32),
}

/// An OS permission the page may ask for through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadExternalStorage,
    Camera,
    RecordAudio,
}

/// A permission-gated bridge capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionRequest {
    ImagePicker,
    VoiceRecord,
}

impl PermissionRequest {
    /// Permissions that must all be granted for this capability.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Self::ImagePicker => &[Permission::ReadExternalStorage, Permission::Camera],
            Self::VoiceRecord => &[Permission::RecordAudio],
        }
    }
}

/// A download started by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub content_disposition: Option<String>,
    pub mime_type: Option<String>,
}

/// Bridge work that must run on the main looper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    ShowToast(String),
    SetAuthToken(String),
    RequestPermission(PermissionRequest),
    OpenSignIn,
    RetryConnection,
}

/// Everything the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// The OS reports a network with internet capability.
    NetworkAvailable,
    /// The OS reports the network is gone.
    NetworkLost,
    PageStarted { url: String },
    PageFinished { url: String },
    /// Load progress in percent (0-100).
    Progress(u8),
    LoadError {
        url: String,
        main_frame: bool,
        kind: LoadErrorKind,
    },
    /// The surface is about to navigate; the controller decides where it goes.
    NavigationRequested { url: String },
    DownloadRequested(DownloadRequest),
    DownloadComplete,
    /// Answer to an asynchronous permission request, one flag per
    /// permission in [`PermissionRequest::permissions`] order.
    PermissionResult {
        request: PermissionRequest,
        granted: Vec<bool>,
    },
    ScrollChanged { y: i32 },
    RefreshGesture,
    BackPressed,
    Bridge(UiRequest),
    /// Deferred hide of the loading indicator.
    HideProgress,
    Resume,
    Pause,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_from_usable() {
        assert_eq!(ConnectivityState::from_usable(true), ConnectivityState::Online);
        assert_eq!(ConnectivityState::from_usable(false), ConnectivityState::Offline);
        assert!(ConnectivityState::Online.is_online());
        assert_eq!(ConnectivityState::Offline.to_string(), "offline");
    }

    #[test]
    fn image_picker_needs_storage_and_camera() {
        assert_eq!(
            PermissionRequest::ImagePicker.permissions(),
            &[Permission::ReadExternalStorage, Permission::Camera]
        );
        assert_eq!(PermissionRequest::VoiceRecord.permissions(), &[Permission::RecordAudio]);
    }
}
