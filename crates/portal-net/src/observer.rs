//! Edge-triggered connectivity tracking.

use portal_platform::{ConnectivityProbe, NetworkCapabilities};
use portal_types::event::ConnectivityState;

/// A connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEdge {
    BecameAvailable,
    BecameUnavailable,
}

/// Remembers the last connectivity state and reports only changes.
///
/// Feeding the same state twice yields no edge the second time, so
/// duplicate platform callbacks never reach the controller.
#[derive(Debug, Clone, Default)]
pub struct NetworkObserver {
    state: Option<ConnectivityState>,
}

impl NetworkObserver {
    /// Observer with no known state; the first observation is an edge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer seeded with a known state; only a different state is an edge.
    pub fn with_state(state: ConnectivityState) -> Self {
        Self { state: Some(state) }
    }

    pub fn state(&self) -> Option<ConnectivityState> {
        self.state
    }

    /// Last observed state is online. Unknown counts as offline.
    pub fn is_online(&self) -> bool {
        self.state == Some(ConnectivityState::Online)
    }

    /// Record `state` and return the edge it causes, if any.
    pub fn observe(&mut self, state: ConnectivityState) -> Option<ConnectivityEdge> {
        if self.state == Some(state) {
            return None;
        }
        log::debug!(
            "Connectivity {} -> {state}",
            self.state.map_or_else(|| "unknown".to_string(), |s| s.to_string())
        );
        self.state = Some(state);
        Some(match state {
            ConnectivityState::Online => ConnectivityEdge::BecameAvailable,
            ConnectivityState::Offline => ConnectivityEdge::BecameUnavailable,
        })
    }

    /// Record the capabilities of the active network (`None` = no network).
    pub fn observe_capabilities(
        &mut self,
        caps: Option<&NetworkCapabilities>,
    ) -> Option<ConnectivityEdge> {
        let usable = caps.is_some_and(|c| c.has_usable_internet());
        self.observe(ConnectivityState::from_usable(usable))
    }

    /// Re-check with an explicit probe.
    pub fn refresh(&mut self, probe: &dyn ConnectivityProbe) -> Option<ConnectivityEdge> {
        self.observe_capabilities(probe.active_capabilities().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use portal_platform::Transport;
    use proptest::prelude::*;

    use portal_types::event::ConnectivityState::{Offline, Online};

    #[test]
    fn first_observation_is_an_edge() {
        let mut obs = NetworkObserver::new();
        assert_eq!(obs.state(), None);
        assert!(!obs.is_online());
        assert_eq!(obs.observe(Online), Some(ConnectivityEdge::BecameAvailable));
        assert!(obs.is_online());
    }

    #[test]
    fn repeated_state_is_not_an_edge() {
        let mut obs = NetworkObserver::with_state(Online);
        assert_eq!(obs.observe(Online), None);
        assert_eq!(obs.observe(Offline), Some(ConnectivityEdge::BecameUnavailable));
        assert_eq!(obs.observe(Offline), None);
        assert_eq!(obs.observe(Online), Some(ConnectivityEdge::BecameAvailable));
    }

    #[test]
    fn capabilities_without_usable_transport_are_offline() {
        let mut obs = NetworkObserver::with_state(Online);
        let vpn = NetworkCapabilities::with_transports(&[Transport::Vpn]);
        assert_eq!(
            obs.observe_capabilities(Some(&vpn)),
            Some(ConnectivityEdge::BecameUnavailable)
        );
        assert_eq!(obs.observe_capabilities(None), None);
    }

    struct Flaky(bool);

    impl ConnectivityProbe for Flaky {
        fn active_capabilities(&self) -> Option<NetworkCapabilities> {
            self.0
                .then(|| NetworkCapabilities::with_transports(&[Transport::Wifi]))
        }
    }

    #[test]
    fn refresh_uses_probe() {
        let mut obs = NetworkObserver::with_state(Offline);
        assert_eq!(obs.refresh(&Flaky(true)), Some(ConnectivityEdge::BecameAvailable));
        assert_eq!(obs.refresh(&Flaky(true)), None);
    }

    proptest! {
        #[test]
        fn one_edge_per_change(initial in any::<bool>(), seq in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut obs = NetworkObserver::with_state(ConnectivityState::from_usable(initial));
            let mut prev = initial;
            let mut expected = 0usize;
            let mut fired = 0usize;
            for usable in seq {
                let edge = obs.observe(ConnectivityState::from_usable(usable));
                if usable != prev {
                    expected += 1;
                    let want = if usable {
                        ConnectivityEdge::BecameAvailable
                    } else {
                        ConnectivityEdge::BecameUnavailable
                    };
                    prop_assert_eq!(edge, Some(want));
                } else {
                    prop_assert_eq!(edge, None);
                }
                fired += usize::from(edge.is_some());
                prev = usable;
            }
            prop_assert_eq!(fired, expected);
        }
    }
}
