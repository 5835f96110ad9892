//! Registrations held while the main screen is in the foreground.

use portal_platform::{ConnectivityService, DownloadService};
use portal_types::error::PortalError;
use portal_types::looper::MainHandle;

/// Tracks which callbacks were registered so exactly those are released.
///
/// Release is tolerant: a registration the platform no longer knows about
/// is logged and skipped.
#[derive(Debug, Default)]
pub struct ForegroundScope {
    network: bool,
    downloads: bool,
}

impl ForegroundScope {
    /// Register the network callback and the download-completion receiver.
    /// A failed registration is logged and left out of the scope.
    pub fn acquire<C, D>(connectivity: &mut C, downloads: &mut D, handle: &MainHandle) -> Self
    where
        C: ConnectivityService + ?Sized,
        D: DownloadService + ?Sized,
    {
        let network = match connectivity.register_network_callback(handle.clone()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Network callback registration failed: {e}");
                false
            },
        };
        let downloads = match downloads.register_completion_receiver(handle.clone()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Download receiver registration failed: {e}");
                false
            },
        };
        log::debug!("Foreground scope acquired (network={network}, downloads={downloads})");
        Self { network, downloads }
    }

    pub fn holds_network(&self) -> bool {
        self.network
    }

    pub fn holds_downloads(&self) -> bool {
        self.downloads
    }

    /// Unregister everything this scope registered.
    pub fn release<C, D>(self, connectivity: &mut C, downloads: &mut D)
    where
        C: ConnectivityService + ?Sized,
        D: DownloadService + ?Sized,
    {
        if self.network {
            tolerate("network callback", connectivity.unregister_network_callback());
        }
        if self.downloads {
            tolerate("download receiver", downloads.unregister_completion_receiver());
        }
        log::debug!("Foreground scope released");
    }
}

fn tolerate(what: &str, result: portal_types::error::Result<()>) {
    match result {
        Ok(()) => {},
        Err(e @ PortalError::NotRegistered(_)) => log::debug!("{what} already gone: {e}"),
        Err(e) => log::warn!("Failed to release {what}: {e}"),
    }
}
