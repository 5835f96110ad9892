//! Background thread that turns probe results into network callbacks.
//!
//! Stands in for the OS connectivity callback on hosts that have none. The
//! thread only posts to the main looper; it never touches shell state.
//! Unregistering signals the thread and returns at once; a probe still in
//! progress finishes on its own and its result is discarded.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use portal_platform::{ConnectivityProbe, ConnectivityService};
use portal_types::error::{PortalError, Result};
use portal_types::event::ShellEvent;
use portal_types::looper::MainHandle;

struct Worker {
    stop: Sender<()>,
}

/// Whether the owner asked the thread to stop (or went away).
fn stop_requested(stop: &Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(TryRecvError::Empty))
}

/// Polls a [`ConnectivityProbe`] and posts changes as network callbacks.
pub struct ConnectivityWatcher {
    probe: Arc<dyn ConnectivityProbe>,
    interval: Duration,
    worker: Option<Worker>,
}

impl ConnectivityWatcher {
    pub fn new(probe: Arc<dyn ConnectivityProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            worker: None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.worker.is_some()
    }
}

impl ConnectivityService for ConnectivityWatcher {
    fn register_network_callback(&mut self, handle: MainHandle) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let (stop, stop_rx) = mpsc::channel::<()>();
        let probe = Arc::clone(&self.probe);
        let interval = self.interval;
        std::thread::Builder::new()
            .name("connectivity-watcher".to_string())
            .spawn(move || {
                let mut last = probe.has_connection();
                if stop_requested(&stop_rx) {
                    return;
                }
                // A fresh registration reports an already available network.
                if last && !handle.post(ShellEvent::NetworkAvailable) {
                    return;
                }
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {},
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let now = probe.has_connection();
                    if stop_requested(&stop_rx) {
                        break;
                    }
                    if now == last {
                        continue;
                    }
                    last = now;
                    let event = if now {
                        ShellEvent::NetworkAvailable
                    } else {
                        ShellEvent::NetworkLost
                    };
                    if !handle.post(event) {
                        break;
                    }
                }
                log::debug!("Connectivity watcher stopped");
            })?;
        log::debug!("Connectivity watcher started ({:?} interval)", self.interval);
        self.worker = Some(Worker { stop });
        Ok(())
    }

    fn unregister_network_callback(&mut self) -> Result<()> {
        let worker = self
            .worker
            .take()
            .ok_or(PortalError::NotRegistered("network callback"))?;
        // The thread may already have exited on its own.
        let _ = worker.stop.send(());
        Ok(())
    }
}

impl Drop for ConnectivityWatcher {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.unregister_network_callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    use portal_platform::{NetworkCapabilities, Transport};
    use portal_types::looper::Looper;

    struct Switch(AtomicBool);

    impl ConnectivityProbe for Switch {
        fn active_capabilities(&self) -> Option<NetworkCapabilities> {
            self.0
                .load(Ordering::SeqCst)
                .then(|| NetworkCapabilities::with_transports(&[Transport::Wifi]))
        }
    }

    fn wait_for(looper: &mut Looper, want: &ShellEvent) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if looper.wait(Duration::from_millis(50)).as_ref() == Some(want) {
                return true;
            }
        }
        false
    }

    #[test]
    fn unregister_without_register_is_not_registered() {
        let probe = Arc::new(Switch(AtomicBool::new(false)));
        let mut watcher = ConnectivityWatcher::new(probe, Duration::from_millis(10));
        let err = watcher.unregister_network_callback().unwrap_err();
        assert!(err.is_not_registered());
    }

    #[test]
    fn register_is_idempotent_and_unregister_twice_is_reported() {
        let looper = Looper::new();
        let probe = Arc::new(Switch(AtomicBool::new(false)));
        let mut watcher = ConnectivityWatcher::new(probe, Duration::from_millis(10));
        watcher.register_network_callback(looper.handle()).unwrap();
        watcher.register_network_callback(looper.handle()).unwrap();
        assert!(watcher.is_registered());
        watcher.unregister_network_callback().unwrap();
        assert!(!watcher.is_registered());
        assert!(watcher.unregister_network_callback().unwrap_err().is_not_registered());
    }

    #[test]
    fn initial_availability_is_reported() {
        let mut looper = Looper::new();
        let probe = Arc::new(Switch(AtomicBool::new(true)));
        let mut watcher = ConnectivityWatcher::new(probe, Duration::from_millis(10));
        watcher.register_network_callback(looper.handle()).unwrap();
        assert!(wait_for(&mut looper, &ShellEvent::NetworkAvailable));
    }

    #[test]
    fn changes_are_posted() {
        let mut looper = Looper::new();
        let probe = Arc::new(Switch(AtomicBool::new(false)));
        let mut watcher =
            ConnectivityWatcher::new(Arc::clone(&probe) as Arc<dyn ConnectivityProbe>, Duration::from_millis(10));
        watcher.register_network_callback(looper.handle()).unwrap();

        probe.0.store(true, Ordering::SeqCst);
        assert!(wait_for(&mut looper, &ShellEvent::NetworkAvailable));

        probe.0.store(false, Ordering::SeqCst);
        assert!(wait_for(&mut looper, &ShellEvent::NetworkLost));
        watcher.unregister_network_callback().unwrap();
    }

    struct SlowProbe {
        delay: Duration,
    }

    impl ConnectivityProbe for SlowProbe {
        fn active_capabilities(&self) -> Option<NetworkCapabilities> {
            std::thread::sleep(self.delay);
            Some(NetworkCapabilities::with_transports(&[Transport::Ethernet]))
        }
    }

    #[test]
    fn unregister_does_not_wait_for_probe() {
        let mut looper = Looper::new();
        let probe = Arc::new(SlowProbe {
            delay: Duration::from_millis(400),
        });
        let mut watcher = ConnectivityWatcher::new(probe, Duration::from_millis(10));
        watcher.register_network_callback(looper.handle()).unwrap();

        let started = Instant::now();
        watcher.unregister_network_callback().unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));

        // The probe in progress completes, but its result is not posted.
        assert!(!wait_for(&mut looper, &ShellEvent::NetworkAvailable));
    }

    #[test]
    fn drop_stops_thread() {
        let looper = Looper::new();
        let probe = Arc::new(Switch(AtomicBool::new(false)));
        let mut watcher = ConnectivityWatcher::new(probe, Duration::from_millis(10));
        watcher.register_network_callback(looper.handle()).unwrap();
        drop(watcher);
    }
}
