//! Network observation: edge-triggered connectivity state, a TCP probe for
//! desktop hosts, and a watcher thread that posts connectivity callbacks to
//! the main looper.

mod observer;
mod probe;
mod watcher;

pub use observer::{ConnectivityEdge, NetworkObserver};
pub use probe::TcpProbe;
pub use watcher::ConnectivityWatcher;
