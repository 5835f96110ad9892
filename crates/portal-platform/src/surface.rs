//! Browsing surface abstraction and the script calls made into the page.

use portal_types::config::is_js_identifier;

/// Bridge object for session storage, connectivity and general UI calls.
pub const APP_BRIDGE_OBJECT: &str = "AndroidApp";

/// Bridge object for sign-in, auth tokens and permission-gated pickers.
pub const AUTH_BRIDGE_OBJECT: &str = "AndroidAuth";

/// Base URL used when loading locally generated documents. Load events for
/// this URL belong to the offline document, not to the remote application.
pub const OFFLINE_DOCUMENT_URL: &str = "about:offline";

/// A call from native code into page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCallback {
    /// Tells the page it runs inside the shell by setting the named
    /// window global.
    InAppMarker(String),
    /// Hands the cached user blob back to the page after a load.
    RestoreOfflineSession(String),
    /// Token extracted from a deep link.
    AuthCallback(String),
    SetAuthToken(String),
    ImagePermissionGranted,
    VoicePermissionGranted,
    PermissionDenied,
}

impl PageCallback {
    /// Script source for this call. String arguments are emitted as JSON
    /// string literals.
    pub fn to_script(&self) -> String {
        match self {
            Self::InAppMarker(global) => format!(
                "localStorage.setItem('isInApp', 'true'); \
                 {} = true; \
                 console.log('In-app shell detected');",
                window_global(global)
            ),
            Self::RestoreOfflineSession(blob) => format!(
                "if (window.{APP_BRIDGE_OBJECT} && typeof window.restoreOfflineSession === 'function') \
                 {{ window.restoreOfflineSession({}); }}",
                js_string(blob)
            ),
            Self::AuthCallback(token) => format!(
                "window.handleAuthCallback && window.handleAuthCallback({})",
                js_string(token)
            ),
            Self::SetAuthToken(token) => format!("window.authToken = {};", js_string(token)),
            Self::ImagePermissionGranted => {
                "window.onImagePermissionGranted && window.onImagePermissionGranted()".to_string()
            },
            Self::VoicePermissionGranted => {
                "window.onVoicePermissionGranted && window.onVoicePermissionGranted()".to_string()
            },
            Self::PermissionDenied => {
                "window.onPermissionDenied && window.onPermissionDenied()".to_string()
            },
        }
    }
}

/// Script expression for the window global `name`.
fn window_global(name: &str) -> String {
    if is_js_identifier(name) {
        format!("window.{name}")
    } else {
        format!("window[{}]", js_string(name))
    }
}

/// Encode `s` as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    // Serializing a &str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// The embedded renderer showing the remote application.
///
/// Load progress is reported back asynchronously as `PageStarted`,
/// `Progress`, `PageFinished` and `LoadError` events.
pub trait BrowsingSurface {
    fn load_url(&mut self, url: &str);

    /// Show a locally generated document. Its load events carry `base_url`.
    fn load_html(&mut self, html: &str, base_url: &str);

    /// Re-issue the current navigation.
    fn reload(&mut self);

    fn run_script(&mut self, script: &str);

    /// Deliver a callback into page script.
    fn invoke(&mut self, callback: &PageCallback) {
        self.run_script(&callback.to_script());
    }

    fn can_go_back(&self) -> bool;

    fn go_back(&mut self);

    fn on_resume(&mut self) {}

    fn on_pause(&mut self) {}
}
