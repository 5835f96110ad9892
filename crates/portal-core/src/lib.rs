//! Connectivity and page-lifecycle controller for the PORTAL web shell.
//!
//! The [`ShellController`] decides what the browsing surface shows: the
//! remote application when it loads, or a locally rendered offline
//! document when the main navigation fails for connectivity reasons. Around
//! it sit the smaller pieces a complete shell needs: navigation routing,
//! download hand-off, push notifications and the launch splash.

pub mod classify;
pub mod controller;
pub mod download;
pub mod lifecycle;
pub mod offline_page;
pub mod push;
pub mod routing;
pub mod scope;
pub mod splash;

pub use controller::{Flow, ReloadOutcome, ShellController, ShellServices};
pub use lifecycle::Lifecycle;
pub use offline_page::OfflinePage;
pub use push::{PushHandler, PushMessage};
pub use routing::{NavigationPolicy, Route};
pub use splash::SplashScreen;
