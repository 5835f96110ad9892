//! The connectivity and page-lifecycle controller.
//!
//! Owns the main [`Looper`]. Every platform callback arrives as a
//! [`ShellEvent`] and is handled here on the looper thread; nothing else
//! mutates lifecycle or connectivity state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use portal_bridge::{DeepLink, JsBridge, SessionCache};
use portal_net::{ConnectivityEdge, NetworkObserver};
use portal_platform::{
    BrowsingSurface, ConnectivityProbe, ConnectivityService, ExternalHandler,
    OFFLINE_DOCUMENT_URL, PageCallback, PermissionService, Platform, UiService,
};
use portal_store::SharedStore;
use portal_types::config::ShellConfig;
use portal_types::error::PortalError;
use portal_types::event::{
    ConnectivityState, PageLoadState, PermissionRequest, ShellEvent, UiRequest,
};
use portal_types::looper::{Looper, MainHandle, TaskId};

use crate::classify::{self, ErrorAction};
use crate::download::{self, DownloadOutcome, MSG_DOWNLOAD_COMPLETE};
use crate::lifecycle::{Lifecycle, Superseded, same_page};
use crate::offline_page::OfflinePage;
use crate::push::{EXTRA_DEEP_LINK, EXTRA_NOTIFICATION_TYPE};
use crate::routing::{NavigationPolicy, Route};
use crate::scope::ForegroundScope;

pub const MSG_NO_CONNECTION: &str = "No internet connection";
pub const MSG_STILL_OFFLINE: &str = "Still offline. Please check your connection.";
pub const MSG_BACK_ONLINE: &str = "Back online! Refreshing...";

/// Upper bound for one blocking wait in [`ShellController::run`].
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Host services the controller drives.
pub struct ShellServices {
    pub platform: Box<dyn Platform>,
    pub surface: Box<dyn BrowsingSurface>,
    pub connectivity: Box<dyn ConnectivityService>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub store: SharedStore,
}

/// Whether the event loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A navigation was issued.
    Reloading,
    /// No usable connection; nothing was issued.
    NoConnection,
}

pub struct ShellController {
    config: ShellConfig,
    policy: NavigationPolicy,
    looper: Looper,
    platform: Box<dyn Platform>,
    surface: Box<dyn BrowsingSurface>,
    connectivity: Box<dyn ConnectivityService>,
    probe: Arc<dyn ConnectivityProbe>,
    cache: SessionCache,
    observer: NetworkObserver,
    lifecycle: Lifecycle,
    superseded: Superseded,
    scope: Option<ForegroundScope>,
    refresh_enabled: bool,
    progress_hide: Option<TaskId>,
    offline_renders: u32,
}

impl ShellController {
    /// Build a controller draining `looper`. Hand out `looper.handle()`
    /// to services that post events before this is called.
    pub fn new(config: ShellConfig, looper: Looper, services: ShellServices) -> Self {
        let ShellServices {
            platform,
            surface,
            connectivity,
            probe,
            store,
        } = services;
        let observer =
            NetworkObserver::with_state(ConnectivityState::from_usable(probe.has_connection()));
        Self {
            policy: NavigationPolicy::from_config(&config),
            config,
            looper,
            platform,
            surface,
            connectivity,
            probe,
            cache: SessionCache::new(store),
            observer,
            lifecycle: Lifecycle::Fresh,
            superseded: Superseded::default(),
            scope: None,
            refresh_enabled: true,
            progress_hide: None,
            offline_renders: 0,
        }
    }

    // -- accessors --------------------------------------------------------

    /// Handle for posting events from other threads.
    pub fn handle(&self) -> MainHandle {
        self.looper.handle()
    }

    /// Bridge object to expose to page script.
    pub fn bridge(&self) -> JsBridge {
        JsBridge::new(
            self.cache.clone(),
            Arc::clone(&self.probe),
            self.looper.handle(),
            &self.config.app_version,
        )
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn page_load_state(&self) -> Option<PageLoadState> {
        self.lifecycle.page_load_state()
    }

    pub fn connectivity_state(&self) -> Option<ConnectivityState> {
        self.observer.state()
    }

    /// Times the offline document has been rendered.
    pub fn offline_renders(&self) -> u32 {
        self.offline_renders
    }

    pub fn is_foreground(&self) -> bool {
        self.scope.is_some()
    }

    pub fn pending_tasks(&self) -> usize {
        self.looper.pending_delayed()
    }

    // -- screen lifecycle -------------------------------------------------

    /// Initial load: the remote app when connected, else the offline page.
    pub fn start(&mut self) {
        self.platform.set_refresh_enabled(self.refresh_enabled);
        let base = self.config.base_url.clone();
        if self.probe_connection() {
            log::info!("Loading {base}");
            self.load(&base);
        } else {
            log::info!("No connection at startup; showing offline page");
            self.show_offline(Some(&base));
        }
    }

    /// Screen became visible: register the foreground callbacks.
    pub fn on_start(&mut self) {
        if self.scope.is_some() {
            return;
        }
        let handle = self.looper.handle();
        self.scope = Some(ForegroundScope::acquire(
            self.connectivity.as_mut(),
            self.platform.as_mut(),
            &handle,
        ));
    }

    /// Screen hidden: release whatever `on_start` registered.
    pub fn on_stop(&mut self) {
        self.release_scope();
    }

    pub fn on_resume(&mut self) {
        self.surface.on_resume();
        if let Some(edge) = self.observer.refresh(self.probe.as_ref()) {
            self.apply_edge(edge);
        }
    }

    pub fn on_pause(&mut self) {
        self.surface.on_pause();
    }

    /// Final teardown. Pending delayed work is dropped.
    pub fn destroy(&mut self) {
        self.looper.cancel_all();
        self.progress_hide = None;
        self.release_scope();
        log::debug!("Shell controller destroyed");
    }

    fn release_scope(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.release(self.connectivity.as_mut(), self.platform.as_mut());
        }
    }

    // -- page loading -----------------------------------------------------

    /// Begin a fresh navigation. Ends any failure episode.
    pub fn load(&mut self, url: &str) {
        self.begin_navigation(url);
        self.surface.load_url(url);
    }

    /// Track `url` as the current navigation. A different navigation still
    /// in flight is superseded: its late events are dropped.
    fn begin_navigation(&mut self, url: &str) {
        if let Some(previous) = self.lifecycle.in_flight().map(str::to_string)
            && !same_page(&previous, url)
        {
            log::debug!("Navigation to {previous} superseded by {url}");
            self.superseded.record(&previous);
        }
        self.superseded.forget(url);
        self.lifecycle.begin(url);
    }

    /// Events for a replaced navigation that is not the current one.
    fn is_stale(&self, url: &str) -> bool {
        self.superseded.contains(url)
            && !self.lifecycle.url().is_some_and(|current| same_page(current, url))
    }

    /// Re-issue the current navigation if there is a connection.
    ///
    /// Without one, nothing is sent to the surface and the lifecycle is
    /// left alone; the user gets a toast and the offline banner.
    pub fn reload(&mut self) -> ReloadOutcome {
        if !self.probe_connection() {
            self.platform.set_refreshing(false);
            self.platform.set_offline_banner(true);
            self.platform.show_toast(MSG_NO_CONNECTION);
            return ReloadOutcome::NoConnection;
        }
        self.reissue();
        ReloadOutcome::Reloading
    }

    /// Explicit "Try Again" from the banner or the offline document.
    pub fn retry(&mut self) -> ReloadOutcome {
        if !self.probe_connection() {
            self.platform.show_toast(MSG_STILL_OFFLINE);
            return ReloadOutcome::NoConnection;
        }
        self.platform.set_offline_banner(false);
        self.reissue();
        ReloadOutcome::Reloading
    }

    fn reissue(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Loading { .. } | Lifecycle::Loaded { .. }) {
            self.surface.reload();
        } else {
            let url = self.recovery_url();
            self.load(&url);
        }
    }

    /// Where to go when leaving the offline page.
    fn recovery_url(&self) -> String {
        self.lifecycle
            .url()
            .filter(|u| *u != OFFLINE_DOCUMENT_URL)
            .unwrap_or(&self.config.base_url)
            .to_string()
    }

    /// Point-in-time check. Re-baselines the observer without acting on
    /// the edge; edges are handled when the callback for them arrives.
    fn probe_connection(&mut self) -> bool {
        let usable = self.probe.has_connection();
        let state = ConnectivityState::from_usable(usable);
        if self.observer.observe(state).is_some() {
            log::debug!("Probe re-baselined connectivity to {state}");
        }
        usable
    }

    fn show_offline(&mut self, failed_url: Option<&str>) {
        if !self.lifecycle.fail(failed_url) {
            log::debug!("Offline page already showing");
            return;
        }
        self.cancel_progress_hide();
        self.platform.hide_progress();
        self.platform.set_refreshing(false);
        self.platform.set_offline_banner(true);

        let page = OfflinePage::from_cache(&self.config.app_name, &self.cache);
        self.surface.load_html(&page.render(), OFFLINE_DOCUMENT_URL);
        self.offline_renders += 1;
        log::info!(
            "Showing offline page (personalized: {}, session: {})",
            page.user_name.is_some(),
            page.has_session
        );
    }

    fn on_page_loaded(&mut self, url: &str) {
        log::info!("Page loaded: {url}");
        self.surface
            .invoke(&PageCallback::InAppMarker(self.config.in_app_global.clone()));
        let cached = self.cache.cached_user();
        if !cached.is_empty() {
            self.surface.invoke(&PageCallback::RestoreOfflineSession(cached));
        }
    }

    fn cancel_progress_hide(&mut self) {
        if let Some(id) = self.progress_hide.take() {
            self.looper.cancel(id);
        }
    }

    // -- connectivity -----------------------------------------------------

    fn apply_edge(&mut self, edge: ConnectivityEdge) {
        match edge {
            ConnectivityEdge::BecameAvailable => {
                log::info!("Network available");
                self.platform.set_offline_banner(false);
                if matches!(self.lifecycle, Lifecycle::Offline { ever_loaded: true, .. }) {
                    self.platform.show_toast(MSG_BACK_ONLINE);
                    let url = self.recovery_url();
                    self.load(&url);
                }
            },
            ConnectivityEdge::BecameUnavailable => {
                log::info!("Network lost");
                self.platform.set_offline_banner(true);
            },
        }
    }

    // -- navigation -------------------------------------------------------

    /// Route a navigation the page (or a notification) asked for.
    pub fn navigate(&mut self, url: &str) {
        match self.policy.route(url) {
            Route::DeepLink => self.handle_deep_link(url),
            Route::External => self.open_external(url),
            Route::InShell => self.load(url),
        }
    }

    fn handle_deep_link(&mut self, url: &str) {
        match DeepLink::parse(url, &self.config.deep_link_scheme) {
            Some(link) => {
                log::info!("Deep link for {:?} carried a token", link.target);
                self.surface.invoke(&PageCallback::AuthCallback(link.token));
            },
            None => log::debug!("Deep link without token dropped"),
        }
    }

    fn open_external(&mut self, url: &str) {
        if let Err(e) = self.platform.open_external(url) {
            log::warn!("Could not open {url} externally: {e}");
        }
    }

    /// Launch extras from a tapped notification.
    pub fn open_from_notification(&mut self, extras: &[(String, String)]) {
        let get = |key: &str| {
            extras
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        if let Some(kind) = get(EXTRA_NOTIFICATION_TYPE) {
            log::info!("Opened from {kind} notification");
        }
        if let Some(link) = get(EXTRA_DEEP_LINK).map(str::to_string) {
            self.navigate(&link);
        }
    }

    fn go_back(&mut self) {
        if self.surface.can_go_back() {
            self.surface.go_back();
        } else {
            self.platform.finish_screen();
        }
    }

    // -- permissions ------------------------------------------------------

    fn request_permission(&mut self, request: PermissionRequest) {
        let granted = request
            .permissions()
            .iter()
            .all(|p| self.platform.is_granted(*p));
        if granted {
            self.deliver_permission(request, true);
            return;
        }
        let handle = self.looper.handle();
        if let Err(e) = self.platform.request(request, &handle) {
            log::warn!("Permission request for {request:?} failed: {e}");
            self.deliver_permission(request, false);
        }
    }

    fn deliver_permission(&mut self, request: PermissionRequest, granted: bool) {
        let callback = match (granted, request) {
            (true, PermissionRequest::ImagePicker) => PageCallback::ImagePermissionGranted,
            (true, PermissionRequest::VoiceRecord) => PageCallback::VoicePermissionGranted,
            (false, _) => {
                log::info!("{}", PortalError::PermissionDenied(format!("{request:?}")));
                PageCallback::PermissionDenied
            },
        };
        self.surface.invoke(&callback);
    }

    // -- event dispatch ---------------------------------------------------

    pub fn handle_event(&mut self, event: ShellEvent) -> Flow {
        match event {
            ShellEvent::NetworkAvailable => {
                if let Some(edge) = self.observer.observe(ConnectivityState::Online) {
                    self.apply_edge(edge);
                }
            },
            ShellEvent::NetworkLost => {
                if let Some(edge) = self.observer.observe(ConnectivityState::Offline) {
                    self.apply_edge(edge);
                }
            },
            ShellEvent::PageStarted { url } => {
                if self.is_stale(&url) {
                    log::debug!("Ignoring start of superseded load {url}");
                } else if url != OFFLINE_DOCUMENT_URL {
                    self.begin_navigation(&url);
                    self.cancel_progress_hide();
                    self.platform.show_progress(0);
                }
            },
            ShellEvent::PageFinished { url } => {
                if url == OFFLINE_DOCUMENT_URL {
                    return Flow::Continue;
                }
                if self.is_stale(&url) {
                    log::debug!("Ignoring completion of superseded load {url}");
                    return Flow::Continue;
                }
                self.cancel_progress_hide();
                self.platform.hide_progress();
                self.platform.set_refreshing(false);
                if self.lifecycle.finish(&url) {
                    self.on_page_loaded(&url);
                } else {
                    log::debug!("Ignoring completion of failed load {url}");
                }
            },
            ShellEvent::Progress(percent) => {
                let percent = percent.min(100);
                self.platform.show_progress(percent);
                if percent == 100 {
                    self.cancel_progress_hide();
                    let delay = self.config.progress.hide_delay();
                    let id = self.looper.post_delayed(ShellEvent::HideProgress, delay);
                    self.progress_hide = Some(id);
                }
            },
            ShellEvent::HideProgress => {
                self.progress_hide = None;
                self.platform.hide_progress();
            },
            ShellEvent::LoadError {
                url,
                main_frame,
                kind,
            } => match classify::classify(main_frame, kind) {
                ErrorAction::Ignore => log::debug!("Sub-frame load error {kind:?} for {url}"),
                _ if self.is_stale(&url) => {
                    log::debug!("Ignoring {kind:?} from superseded load {url}");
                },
                ErrorAction::ShowOffline => {
                    log::warn!("{}", classify::load_failure(&url, kind));
                    self.show_offline(Some(&url));
                },
                ErrorAction::LeaveToSurface => {
                    log::warn!("{}", classify::load_failure(&url, kind));
                    self.platform.set_refreshing(false);
                },
            },
            ShellEvent::NavigationRequested { url } => self.navigate(&url),
            ShellEvent::DownloadRequested(request) => {
                let outcome = download::start_download(
                    self.platform.as_mut(),
                    &request,
                    &self.config.user_agent,
                );
                if outcome == DownloadOutcome::Failed {
                    log::warn!("Download of {} abandoned", request.url);
                }
            },
            ShellEvent::DownloadComplete => self.platform.show_toast(MSG_DOWNLOAD_COMPLETE),
            ShellEvent::PermissionResult { request, granted } => {
                // An empty answer means the prompt was dismissed.
                let all = !granted.is_empty() && granted.iter().all(|g| *g);
                self.deliver_permission(request, all);
            },
            ShellEvent::ScrollChanged { y } => {
                let enabled = y == 0;
                if enabled != self.refresh_enabled {
                    self.refresh_enabled = enabled;
                    self.platform.set_refresh_enabled(enabled);
                }
            },
            ShellEvent::RefreshGesture => {
                if self.refresh_enabled {
                    self.reload();
                } else {
                    self.platform.set_refreshing(false);
                }
            },
            ShellEvent::BackPressed => self.go_back(),
            ShellEvent::Bridge(request) => self.handle_bridge(request),
            ShellEvent::Resume => self.on_resume(),
            ShellEvent::Pause => self.on_pause(),
            ShellEvent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn handle_bridge(&mut self, request: UiRequest) {
        match request {
            UiRequest::ShowToast(message) => self.platform.show_toast(&message),
            UiRequest::SetAuthToken(token) => {
                self.surface.invoke(&PageCallback::SetAuthToken(token));
            },
            UiRequest::RequestPermission(request) => self.request_permission(request),
            UiRequest::OpenSignIn => {
                let url = self.config.sign_in_url.clone();
                self.open_external(&url);
            },
            UiRequest::RetryConnection => {
                self.retry();
            },
        }
    }

    /// Handle every event ready at `now` without blocking.
    pub fn dispatch_pending(&mut self, now: Instant) -> Flow {
        while let Some(event) = self.looper.poll(now) {
            if self.handle_event(event) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Block on the looper until a `Quit` event arrives.
    pub fn run(&mut self) {
        loop {
            if let Some(event) = self.looper.wait(IDLE_WAIT)
                && self.handle_event(event) == Flow::Quit
            {
                break;
            }
        }
        log::info!("Event loop stopped");
    }
}

impl Drop for ShellController {
    fn drop(&mut self) {
        self.release_scope();
    }
}
