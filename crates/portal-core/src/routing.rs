//! Where a navigation requested by the page should go.

use portal_bridge::is_deep_link;
use portal_types::config::ShellConfig;
use url::Url;

/// Schemes the browsing surface renders itself.
const SURFACE_SCHEMES: &[&str] = &["about", "data", "blob", "javascript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Custom-scheme link handled by the deep-link handler.
    DeepLink,
    /// Handed to the OS (dialer, mail client, browser).
    External,
    /// Loaded inside the browsing surface.
    InShell,
}

#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    deep_link_scheme: String,
    external_schemes: Vec<String>,
    allowed_hosts: Vec<String>,
}

impl NavigationPolicy {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            deep_link_scheme: config.deep_link_scheme.clone(),
            external_schemes: config
                .external_schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn route(&self, url: &str) -> Route {
        if is_deep_link(url, &self.deep_link_scheme) {
            return Route::DeepLink;
        }
        let scheme = url
            .split_once(':')
            .map(|(s, _)| s.to_ascii_lowercase())
            .unwrap_or_default();
        if self.external_schemes.iter().any(|s| *s == scheme) {
            return Route::External;
        }
        if SURFACE_SCHEMES.contains(&scheme.as_str()) {
            return Route::InShell;
        }
        if scheme != "http" && scheme != "https" {
            return Route::External;
        }
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                // The surface reports the failure through its own load error.
                log::debug!("Unparsable navigation {url:?}: {e}");
                return Route::InShell;
            },
        };
        if parsed.host_str().is_some_and(|host| self.host_allowed(host)) {
            Route::InShell
        } else {
            Route::External
        }
    }

    /// Host contains one of the allowed fragments.
    fn host_allowed(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|h| host.contains(h.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NavigationPolicy {
        NavigationPolicy::from_config(&ShellConfig::default())
    }

    #[test]
    fn deep_links_are_intercepted() {
        assert_eq!(policy().route("app://auth?token=abc"), Route::DeepLink);
    }

    #[test]
    fn contact_schemes_go_external() {
        let p = policy();
        assert_eq!(p.route("tel:+2348000000000"), Route::External);
        assert_eq!(p.route("mailto:help@example.org"), Route::External);
        assert_eq!(p.route("WhatsApp://send?text=hi"), Route::External);
    }

    #[test]
    fn allowed_hosts_stay_in_shell() {
        let p = policy();
        assert_eq!(p.route("https://jambgenius.vercel.app/exam"), Route::InShell);
        assert_eq!(p.route("https://accounts.google.com/signin"), Route::InShell);
        assert_eq!(p.route("https://checkout.paystack.com/x"), Route::InShell);
        assert_eq!(p.route("https://www.gstatic.com/firebasejs/app.js"), Route::InShell);
    }

    #[test]
    fn foreign_hosts_go_external() {
        let p = policy();
        assert_eq!(p.route("https://example.org/"), Route::External);
        // Fragment in the query does not count.
        assert_eq!(p.route("https://example.org/?next=jambgenius"), Route::External);
    }

    #[test]
    fn surface_schemes_stay_in_shell() {
        let p = policy();
        assert_eq!(p.route("about:blank"), Route::InShell);
        assert_eq!(p.route("data:text/html,hi"), Route::InShell);
    }

    #[test]
    fn other_app_schemes_go_external() {
        let p = policy();
        assert_eq!(p.route("market://details?id=x"), Route::External);
        assert_eq!(p.route("intent://scan/#Intent;end"), Route::External);
    }

    #[test]
    fn custom_config_is_respected() {
        let config = ShellConfig {
            deep_link_scheme: "study".into(),
            allowed_hosts: vec!["example.org".into()],
            external_schemes: vec!["sms".into()],
            ..ShellConfig::default()
        };
        let p = NavigationPolicy::from_config(&config);
        assert_eq!(p.route("study://auth?token=1"), Route::DeepLink);
        assert_eq!(p.route("app://auth?token=1"), Route::External);
        assert_eq!(p.route("sms:123"), Route::External);
        assert_eq!(p.route("tel:123"), Route::External);
        assert_eq!(p.route("https://example.org/a"), Route::InShell);
    }
}
