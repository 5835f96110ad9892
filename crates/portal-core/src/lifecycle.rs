//! Page lifecycle state machine.
//!
//! One value replaces the separate "offline page shown", "page loaded" and
//! "offline" flags, so combinations like "loaded while showing the offline
//! page" cannot be represented.

use std::collections::VecDeque;

use portal_types::event::PageLoadState;
use url::Url;

/// How many replaced navigations are remembered.
const MAX_SUPERSEDED: usize = 8;

/// Where the main navigation stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing requested yet.
    Fresh,
    /// A navigation to `url` is in flight.
    Loading { url: String, ever_loaded: bool },
    /// The remote application finished loading `url`.
    Loaded { url: String },
    /// The offline document is showing for the current failure episode.
    Offline {
        failed_url: Option<String>,
        ever_loaded: bool,
    },
}

impl Lifecycle {
    /// Derived load state. `None` before the first navigation.
    pub fn page_load_state(&self) -> Option<PageLoadState> {
        match self {
            Self::Fresh => None,
            Self::Loading { .. } => Some(PageLoadState::Loading),
            Self::Loaded { .. } => Some(PageLoadState::Loaded),
            Self::Offline { .. } => Some(PageLoadState::Failed),
        }
    }

    /// The offline document has been rendered for this failure episode.
    pub fn offline_shown(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }

    /// A remote page finished loading at least once during this screen.
    pub fn ever_loaded(&self) -> bool {
        match self {
            Self::Fresh => false,
            Self::Loading { ever_loaded, .. } | Self::Offline { ever_loaded, .. } => *ever_loaded,
            Self::Loaded { .. } => true,
        }
    }

    /// URL of the current or last attempted navigation.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fresh => None,
            Self::Loading { url, .. } | Self::Loaded { url } => Some(url),
            Self::Offline { failed_url, .. } => failed_url.as_deref(),
        }
    }

    /// URL of the navigation still waiting for an outcome.
    pub fn in_flight(&self) -> Option<&str> {
        match self {
            Self::Loading { url, .. } => Some(url),
            _ => None,
        }
    }

    /// A navigation to `url` begins. Ends any failure episode.
    pub fn begin(&mut self, url: &str) {
        *self = Self::Loading {
            url: url.to_string(),
            ever_loaded: self.ever_loaded(),
        };
    }

    /// The surface finished `url`. Returns `true` when this is a successful
    /// main navigation; completions while the offline document shows are the
    /// tail of the failed load and are ignored.
    pub fn finish(&mut self, url: &str) -> bool {
        match self {
            Self::Offline { .. } => false,
            Self::Fresh | Self::Loading { .. } | Self::Loaded { .. } => {
                *self = Self::Loaded {
                    url: url.to_string(),
                };
                true
            },
        }
    }

    /// Enter the offline state. Returns `false` if already there.
    pub fn fail(&mut self, failed_url: Option<&str>) -> bool {
        if self.offline_shown() {
            return false;
        }
        *self = Self::Offline {
            failed_url: failed_url.map(str::to_string),
            ever_loaded: self.ever_loaded(),
        };
        true
    }
}

/// Whether two URLs name the same document. Fragments are ignored and
/// parseable URLs compare in normalized form (`https://a.test` equals
/// `https://a.test/`).
pub fn same_page(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        },
        _ => false,
    }
}

/// Navigations that were replaced by a newer one before reporting an
/// outcome. Late events for them must not touch the lifecycle.
#[derive(Debug, Default)]
pub struct Superseded {
    urls: VecDeque<String>,
}

impl Superseded {
    pub fn record(&mut self, url: &str) {
        if self.contains(url) {
            return;
        }
        if self.urls.len() == MAX_SUPERSEDED {
            self.urls.pop_front();
        }
        self.urls.push_back(url.to_string());
    }

    /// `url` was requested again; its events are current once more.
    pub fn forget(&mut self, url: &str) {
        self.urls.retain(|u| !same_page(u, url));
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| same_page(u, url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
