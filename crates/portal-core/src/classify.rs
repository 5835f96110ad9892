//! Load error classification.

use portal_types::error::PortalError;
use portal_types::event::LoadErrorKind;

/// What the controller does with a load error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Sub-frame failure; the main page is unaffected.
    Ignore,
    /// Connectivity-style failure of the main navigation.
    ShowOffline,
    /// Main navigation failed for a reason the offline page cannot fix.
    LeaveToSurface,
}

/// Connectivity-style failures the offline document can stand in for.
pub fn is_connectivity_failure(kind: LoadErrorKind) -> bool {
    matches!(
        kind,
        LoadErrorKind::HostLookup
            | LoadErrorKind::Connect
            | LoadErrorKind::Timeout
            | LoadErrorKind::Io
            | LoadErrorKind::Unknown
    )
}

pub fn classify(main_frame: bool, kind: LoadErrorKind) -> ErrorAction {
    if !main_frame {
        ErrorAction::Ignore
    } else if is_connectivity_failure(kind) {
        ErrorAction::ShowOffline
    } else {
        ErrorAction::LeaveToSurface
    }
}

/// The error a main-frame failure of `url` stands for.
pub fn load_failure(url: &str, kind: LoadErrorKind) -> PortalError {
    if is_connectivity_failure(kind) {
        PortalError::Connectivity(format!("{kind:?} loading {url}"))
    } else {
        PortalError::ContentLoad(format!("{kind:?} loading {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_kinds_show_offline() {
        for kind in [
            LoadErrorKind::HostLookup,
            LoadErrorKind::Connect,
            LoadErrorKind::Timeout,
            LoadErrorKind::Io,
            LoadErrorKind::Unknown,
        ] {
            assert_eq!(classify(true, kind), ErrorAction::ShowOffline, "{kind:?}");
        }
    }

    #[test]
    fn other_kinds_are_left_to_surface() {
        for kind in [
            LoadErrorKind::BadUrl,
            LoadErrorKind::Ssl,
            LoadErrorKind::Authentication,
            LoadErrorKind::FileNotFound,
            LoadErrorKind::TooManyRequests,
            LoadErrorKind::UnsupportedScheme,
            LoadErrorKind::Other(-42),
        ] {
            assert_eq!(classify(true, kind), ErrorAction::LeaveToSurface, "{kind:?}");
        }
    }

    #[test]
    fn sub_frame_errors_are_ignored() {
        assert_eq!(classify(false, LoadErrorKind::HostLookup), ErrorAction::Ignore);
        assert_eq!(classify(false, LoadErrorKind::Ssl), ErrorAction::Ignore);
    }

    #[test]
    fn failures_map_to_taxonomy() {
        let e = load_failure("https://a.test/", LoadErrorKind::Timeout);
        assert!(matches!(e, PortalError::Connectivity(_)));
        assert_eq!(format!("{e}"), "connectivity error: Timeout loading https://a.test/");
        let e = load_failure("https://a.test/", LoadErrorKind::Ssl);
        assert!(matches!(e, PortalError::ContentLoad(_)));
    }
}
