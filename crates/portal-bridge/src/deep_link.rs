//! Deep links of the form `<scheme>://<path>?token=<opaque>`.

use url::Url;

/// A parsed deep link carrying an auth token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    /// Host part of the link (`auth` in `app://auth?token=...`).
    pub target: String,
    pub token: String,
}

/// Whether `url` uses the deep-link `scheme`. Cheap prefix check, no parse.
pub fn is_deep_link(url: &str, scheme: &str) -> bool {
    url.len() > scheme.len() + 3
        && url
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        && url[scheme.len()..].starts_with("://")
}

impl DeepLink {
    /// Parse a deep link. Malformed links, other schemes, and links without
    /// a non-empty `token` parameter yield `None`.
    pub fn parse(url: &str, scheme: &str) -> Option<Self> {
        if !is_deep_link(url, scheme) {
            return None;
        }
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                log::debug!("Dropping malformed deep link {url:?}: {e}");
                return None;
            },
        };
        let token = parsed
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|t| !t.is_empty())?;
        Some(Self {
            target: parsed.host_str().unwrap_or_default().to_string(),
            token,
        })
    }
}
