//! Platform service abstractions for PORTAL.
//!
//! The controller never touches an OS API directly. Everything it needs
//! from the host (the browsing surface, connectivity, runtime permissions,
//! the download manager, notifications, screen chrome) goes through the
//! traits defined here. [`DesktopPlatform`] is a headless implementation for
//! development runs.

mod desktop;
mod services;
mod surface;

pub use desktop::DesktopPlatform;
pub use services::*;
pub use surface::{
    APP_BRIDGE_OBJECT, AUTH_BRIDGE_OBJECT, BrowsingSurface, OFFLINE_DOCUMENT_URL, PageCallback,
    js_string,
};
