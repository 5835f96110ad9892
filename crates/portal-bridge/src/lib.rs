//! Native/web bridge.
//!
//! - [`JsBridge`]: the synchronous call surface page script sees.
//! - [`SessionCache`]: the persisted session and cached-user blobs.
//! - [`DeepLink`]: token extraction from custom-scheme links.

mod calls;
mod deep_link;
mod session;

pub use calls::{BridgeCall, BridgeObject, BridgeReply, JsBridge};
pub use deep_link::{DeepLink, is_deep_link};
pub use session::{CachedUser, KEY_CACHED_USER, KEY_USER_SESSION, SessionCache};
