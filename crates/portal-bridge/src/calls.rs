//! The script-callable bridge object.
//!
//! Calls arrive on the page's script thread. Storage reads and writes and
//! connectivity checks are answered in place; anything that touches the
//! screen or calls back into the page is posted to the main looper.

use std::sync::Arc;

use portal_platform::{APP_BRIDGE_OBJECT, AUTH_BRIDGE_OBJECT, ConnectivityProbe};
use portal_types::event::{PermissionRequest, ShellEvent, UiRequest};
use portal_types::looper::MainHandle;

use crate::session::SessionCache;

/// Version reported when none is configured.
const FALLBACK_VERSION: &str = "1.0.0";

/// A method invoked on the bridge object from page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    SaveSession(String),
    GetSession,
    SaveCachedUser(String),
    GetCachedUser,
    ClearSession,
    IsOnline,
    GetAppVersion,
    ShowToast(String),
    SetAuthToken(String),
    RequestImagePicker,
    RequestVoiceRecord,
    OpenSignIn,
    RetryConnection,
}

impl BridgeCall {
    /// Map a method called on `object` and its string arguments to a call.
    ///
    /// Unknown methods, methods the object does not expose and missing
    /// arguments yield `None`.
    pub fn from_method(object: BridgeObject, name: &str, args: &[String]) -> Option<Self> {
        if !object.methods().contains(&name) {
            return None;
        }
        let arg = || args.first().cloned();
        Some(match name {
            "saveSession" | "saveUserSession" => Self::SaveSession(arg()?),
            "getSession" | "getUserSession" => Self::GetSession,
            "saveCachedUser" => Self::SaveCachedUser(arg()?),
            "getCachedUser" => Self::GetCachedUser,
            "clearSession" => Self::ClearSession,
            "isOnline" | "isInternetAvailable" => Self::IsOnline,
            "getAppVersion" => Self::GetAppVersion,
            "showToast" => Self::ShowToast(arg()?),
            "setAuthToken" => Self::SetAuthToken(arg()?),
            "requestImagePicker" => Self::RequestImagePicker,
            "requestVoiceRecord" => Self::RequestVoiceRecord,
            "openSignIn" | "openGoogleSignIn" => Self::OpenSignIn,
            "retryConnection" => Self::RetryConnection,
            _ => return None,
        })
    }
}

/// The two objects page script sees on `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeObject {
    /// Session storage, connectivity, toasts and offline retry.
    App,
    /// Sign-in, auth tokens and permission-gated pickers.
    Auth,
}

const APP_METHODS: &[&str] = &[
    "saveSession",
    "saveUserSession",
    "getSession",
    "getUserSession",
    "saveCachedUser",
    "getCachedUser",
    "clearSession",
    "isOnline",
    "getAppVersion",
    "showToast",
    "retryConnection",
];

const AUTH_METHODS: &[&str] = &[
    "setAuthToken",
    "requestImagePicker",
    "requestVoiceRecord",
    "isInternetAvailable",
    "openSignIn",
    "openGoogleSignIn",
];

impl BridgeObject {
    pub const ALL: [Self; 2] = [Self::App, Self::Auth];

    /// Global name under which the object is installed.
    pub fn name(self) -> &'static str {
        match self {
            Self::App => APP_BRIDGE_OBJECT,
            Self::Auth => AUTH_BRIDGE_OBJECT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.name() == name)
    }

    pub fn methods(self) -> &'static [&'static str] {
        match self {
            Self::App => APP_METHODS,
            Self::Auth => AUTH_METHODS,
        }
    }

    /// The object that exposes `method`, if any.
    pub fn exposing(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.methods().contains(&method))
    }
}

/// Synchronous answer returned to page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeReply {
    Unit,
    Text(String),
    Bool(bool),
}

impl BridgeReply {
    /// JavaScript literal for this value.
    pub fn to_js(&self) -> String {
        match self {
            Self::Unit => "undefined".to_string(),
            Self::Text(s) => portal_platform::js_string(s),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// The bridge object exposed to the page. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct JsBridge {
    cache: SessionCache,
    probe: Arc<dyn ConnectivityProbe>,
    main: MainHandle,
    app_version: String,
}

impl JsBridge {
    pub fn new(
        cache: SessionCache,
        probe: Arc<dyn ConnectivityProbe>,
        main: MainHandle,
        app_version: &str,
    ) -> Self {
        Self {
            cache,
            probe,
            main,
            app_version: app_version.to_string(),
        }
    }

    /// Handle one call from page script.
    pub fn dispatch(&self, call: BridgeCall) -> BridgeReply {
        match call {
            BridgeCall::SaveSession(blob) => {
                self.cache.save_session(&blob);
                BridgeReply::Unit
            },
            BridgeCall::GetSession => BridgeReply::Text(self.cache.session()),
            BridgeCall::SaveCachedUser(blob) => {
                self.cache.save_cached_user(&blob);
                BridgeReply::Unit
            },
            BridgeCall::GetCachedUser => BridgeReply::Text(self.cache.cached_user()),
            BridgeCall::ClearSession => {
                self.cache.clear();
                BridgeReply::Unit
            },
            BridgeCall::IsOnline => BridgeReply::Bool(self.probe.has_connection()),
            BridgeCall::GetAppVersion => BridgeReply::Text(self.version()),
            BridgeCall::ShowToast(message) => self.post(UiRequest::ShowToast(message)),
            BridgeCall::SetAuthToken(token) => self.post(UiRequest::SetAuthToken(token)),
            BridgeCall::RequestImagePicker => {
                self.post(UiRequest::RequestPermission(PermissionRequest::ImagePicker))
            },
            BridgeCall::RequestVoiceRecord => {
                self.post(UiRequest::RequestPermission(PermissionRequest::VoiceRecord))
            },
            BridgeCall::OpenSignIn => self.post(UiRequest::OpenSignIn),
            BridgeCall::RetryConnection => self.post(UiRequest::RetryConnection),
        }
    }

    /// Dispatch by object and script method name. Unknown methods answer
    /// `undefined`.
    pub fn dispatch_method(
        &self,
        object: BridgeObject,
        name: &str,
        args: &[String],
    ) -> BridgeReply {
        match BridgeCall::from_method(object, name, args) {
            Some(call) => self.dispatch(call),
            None => {
                log::warn!(
                    "Unknown bridge method {}.{name} ({} args)",
                    object.name(),
                    args.len()
                );
                BridgeReply::Unit
            },
        }
    }

    fn version(&self) -> String {
        if self.app_version.is_empty() {
            FALLBACK_VERSION.to_string()
        } else {
            self.app_version.clone()
        }
    }

    fn post(&self, request: UiRequest) -> BridgeReply {
        if !self.main.post(ShellEvent::Bridge(request)) {
            log::debug!("Bridge call after main looper shut down; dropped");
        }
        BridgeReply::Unit
    }
}
