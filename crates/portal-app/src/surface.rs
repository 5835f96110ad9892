//! Headless browsing surface for desktop runs.
//!
//! There is no renderer. A navigation is "loaded" when a TCP connection to
//! the page's host succeeds; the result is reported back to the looper as
//! the same page events a real surface would emit. Locally generated
//! documents are written to disk so they can be opened in a browser.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use portal_net::TcpProbe;
use portal_platform::{BrowsingSurface, ConnectivityProbe};
use portal_types::event::{LoadErrorKind, ShellEvent};
use portal_types::looper::MainHandle;
use url::Url;

const DOCUMENT_FILE: &str = "offline.html";

pub struct HeadlessSurface {
    handle: MainHandle,
    timeout: Duration,
    document_dir: Option<PathBuf>,
    history: Vec<String>,
    /// Bumped on every navigation; a load thread stops reporting once the
    /// value no longer matches the one it started with.
    generation: Arc<AtomicU64>,
}

impl HeadlessSurface {
    pub fn new(handle: MainHandle, timeout: Duration, document_dir: Option<PathBuf>) -> Self {
        Self {
            handle,
            timeout,
            document_dir,
            history: Vec::new(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn navigate(&self, url: &str) {
        let handle = self.handle.clone();
        let timeout = self.timeout;
        let url = url.to_string();
        let current = Arc::clone(&self.generation);
        let generation = current.fetch_add(1, Ordering::SeqCst) + 1;
        let spawned = std::thread::Builder::new()
            .name("page-load".to_string())
            .spawn(move || report(&handle, simulate_load(&url, timeout), &current, generation));
        if let Err(e) = spawned {
            log::warn!("Could not start page load thread: {e}");
        }
    }

    fn write_document(&self, html: &str) -> Option<PathBuf> {
        let dir = self.document_dir.as_ref()?;
        let path = dir.join(DOCUMENT_FILE);
        let written = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, html));
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                log::warn!("Could not write {}: {e}", path.display());
                None
            },
        }
    }
}

/// Post `events` until a newer navigation replaces `generation`.
fn report(handle: &MainHandle, events: Vec<ShellEvent>, current: &AtomicU64, generation: u64) {
    for event in events {
        if current.load(Ordering::SeqCst) != generation {
            log::debug!("[surface] superseded load stopped reporting");
            break;
        }
        if !handle.post(event) {
            break;
        }
    }
}

/// Events a page load of `url` produces, in order.
fn simulate_load(url: &str, timeout: Duration) -> Vec<ShellEvent> {
    let started = ShellEvent::PageStarted {
        url: url.to_string(),
    };
    let error = |kind| ShellEvent::LoadError {
        url: url.to_string(),
        main_frame: true,
        kind,
    };
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return vec![started, error(LoadErrorKind::BadUrl)],
    };
    let (Some(host), Some(port)) = (parsed.host_str(), parsed.port_or_known_default()) else {
        return vec![started, error(LoadErrorKind::UnsupportedScheme)];
    };
    if !TcpProbe::new(host, port, timeout).has_connection() {
        return vec![started, error(LoadErrorKind::Connect)];
    }
    vec![
        started,
        ShellEvent::Progress(100),
        ShellEvent::PageFinished {
            url: url.to_string(),
        },
    ]
}

impl BrowsingSurface for HeadlessSurface {
    fn load_url(&mut self, url: &str) {
        log::info!("[surface] loading {url}");
        if self.history.last().map(String::as_str) != Some(url) {
            self.history.push(url.to_string());
        }
        self.navigate(url);
    }

    fn load_html(&mut self, html: &str, base_url: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.write_document(html) {
            Some(path) => log::info!("[surface] document for {base_url} at {}", path.display()),
            None => log::info!("[surface] document for {base_url} ({} bytes)", html.len()),
        }
        self.handle.post(ShellEvent::PageStarted {
            url: base_url.to_string(),
        });
        self.handle.post(ShellEvent::PageFinished {
            url: base_url.to_string(),
        });
    }

    fn reload(&mut self) {
        if let Some(url) = self.history.last().cloned() {
            log::info!("[surface] reloading {url}");
            self.navigate(&url);
        }
    }

    fn run_script(&mut self, script: &str) {
        log::debug!("[script] {script}");
    }

    fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    fn go_back(&mut self) {
        self.history.pop();
        if let Some(url) = self.history.last().cloned() {
            log::info!("[surface] back to {url}");
            self.navigate(&url);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;
    use std::time::Instant;

    use portal_types::looper::Looper;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[test]
    fn reachable_host_loads() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/");
        let events = simulate_load(&url, TIMEOUT);
        assert_eq!(events.first(), Some(&ShellEvent::PageStarted { url: url.clone() }));
        assert_eq!(events.last(), Some(&ShellEvent::PageFinished { url }));
    }

    #[test]
    fn unreachable_host_fails_with_connect() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/");
        let events = simulate_load(&url, TIMEOUT);
        assert!(matches!(
            events.last(),
            Some(ShellEvent::LoadError {
                kind: LoadErrorKind::Connect,
                main_frame: true,
                ..
            })
        ));
    }

    #[test]
    fn malformed_url_is_bad_url() {
        let events = simulate_load("not a url", TIMEOUT);
        assert!(matches!(
            events.last(),
            Some(ShellEvent::LoadError {
                kind: LoadErrorKind::BadUrl,
                ..
            })
        ));
    }

    #[test]
    fn documents_are_written_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut looper = Looper::new();
        let mut surface =
            HeadlessSurface::new(looper.handle(), TIMEOUT, Some(dir.path().to_path_buf()));
        surface.load_html("<p>offline</p>", "about:offline");
        let written = std::fs::read_to_string(dir.path().join(DOCUMENT_FILE)).unwrap();
        assert_eq!(written, "<p>offline</p>");
        let now = Instant::now();
        assert_eq!(
            looper.poll(now),
            Some(ShellEvent::PageStarted {
                url: "about:offline".into()
            })
        );
        assert_eq!(
            looper.poll(now),
            Some(ShellEvent::PageFinished {
                url: "about:offline".into()
            })
        );
    }

    #[test]
    fn history_supports_back() {
        let looper = Looper::new();
        let mut surface = HeadlessSurface::new(looper.handle(), TIMEOUT, None);
        assert!(!surface.can_go_back());
        surface.load_url("not a url/a");
        surface.load_url("not a url/b");
        assert!(surface.can_go_back());
        surface.go_back();
        assert_eq!(surface.history.last().map(String::as_str), Some("not a url/a"));
        assert!(!surface.can_go_back());
    }

    #[test]
    fn superseded_load_reports_nothing() {
        let mut looper = Looper::new();
        let handle = looper.handle();
        let current = AtomicU64::new(2);
        let events = simulate_load("not a url", TIMEOUT);
        report(&handle, events.clone(), &current, 1);
        assert_eq!(looper.poll(Instant::now()), None);

        report(&handle, events, &current, 2);
        assert_eq!(
            looper.poll(Instant::now()),
            Some(ShellEvent::PageStarted {
                url: "not a url".into()
            })
        );
    }

    #[test]
    fn each_navigation_bumps_generation() {
        let looper = Looper::new();
        let mut surface = HeadlessSurface::new(looper.handle(), TIMEOUT, None);
        surface.load_url("not a url/a");
        surface.load_url("not a url/b");
        surface.load_html("<p>offline</p>", "about:offline");
        assert_eq!(surface.generation.load(Ordering::SeqCst), 3);
    }
}
