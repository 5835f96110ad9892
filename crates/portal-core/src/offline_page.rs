//! The self-contained offline document.
//!
//! Rendered locally (no network access) whenever the main navigation fails
//! with a connectivity-style error. Personalized from the cached user blob.

use portal_bridge::SessionCache;
use portal_platform::APP_BRIDGE_OBJECT;

const STYLE: &str = r#"<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
  min-height: 100vh; display: flex; align-items: center; justify-content: center;
  padding: 20px; color: #333;
}
.container {
  background: white; border-radius: 20px; padding: 40px 30px; max-width: 400px;
  width: 100%; box-shadow: 0 20px 60px rgba(0,0,0,0.3); text-align: center;
}
.icon { font-size: 64px; margin-bottom: 16px; }
h1 { font-size: 26px; color: #667eea; margin-bottom: 8px; }
.greeting { font-size: 18px; color: #764ba2; font-weight: 600; margin-bottom: 8px; }
.subtitle { color: #666; font-size: 15px; margin-bottom: 24px; line-height: 1.5; }
.status-card { background: #fff3cd; border-radius: 12px; padding: 16px; margin-bottom: 24px; }
.status-card h3 { color: #856404; font-size: 16px; margin-bottom: 4px; }
.status-card p { color: #856404; font-size: 14px; }
.features { text-align: left; margin-bottom: 24px; }
.features h3 { font-size: 16px; margin-bottom: 12px; color: #333; }
.features li { list-style: none; padding: 8px 0; color: #555; font-size: 14px; }
.btn {
  display: block; width: 100%; padding: 14px; border: none; border-radius: 12px;
  font-size: 16px; font-weight: 600; cursor: pointer; margin-bottom: 12px;
}
.btn-primary { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; }
.btn-secondary { background: #f0f0f0; color: #333; }
.btn:disabled { opacity: 0.6; }
.loading { display: none; margin-top: 12px; color: #667eea; font-size: 14px; }
.tip { margin-top: 16px; font-size: 13px; color: #999; }
</style>"#;

const SCRIPT: &str = r#"<script>
function retryConnection() {
  var btn = document.getElementById('retryBtn');
  btn.textContent = 'Checking...';
  btn.disabled = true;
  if (window.__BRIDGE__ && window.__BRIDGE__.retryConnection) {
    window.__BRIDGE__.retryConnection();
    setTimeout(function () { btn.textContent = 'Try Again'; btn.disabled = false; }, 1500);
  } else {
    setTimeout(function () { location.reload(); }, 500);
  }
}
function startOfflinePractice() {
  var loading = document.getElementById('loading');
  if (loading) { loading.style.display = 'block'; }
  setTimeout(function () { location.reload(); }, 1500);
}
</script>"#;

const FEATURES: &[&str] = &[
    "Practice questions you have already opened",
    "Review your saved progress",
    "Study notes cached on this device",
];

/// Inputs for one rendering of the offline document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfflinePage {
    pub app_name: String,
    /// Display name from the cached user blob, already trimmed.
    pub user_name: Option<String>,
    /// A cached user blob exists, so offline practice is offered.
    pub has_session: bool,
}

impl OfflinePage {
    /// Personalize from whatever the session cache holds right now.
    pub fn from_cache(app_name: &str, cache: &SessionCache) -> Self {
        let profile = cache.cached_profile();
        Self {
            app_name: app_name.to_string(),
            user_name: profile
                .as_ref()
                .and_then(|p| p.display_name())
                .map(str::to_string),
            has_session: cache.has_cached_user(),
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(6 * 1024);
        html.push_str("<!DOCTYPE html>\n<html lang='en'>\n<head>\n");
        html.push_str("<meta charset='UTF-8'>\n");
        html.push_str(
            "<meta name='viewport' content='width=device-width, initial-scale=1.0'>\n",
        );
        html.push_str(&format!(
            "<title>{} - Offline</title>\n",
            escape_html(&self.app_name)
        ));
        html.push_str(STYLE);
        html.push_str("\n</head>\n<body>\n<div class='container'>\n");
        html.push_str("<div class='icon'>\u{1F4DA}</div>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.app_name)));

        if let Some(name) = &self.user_name {
            html.push_str(&format!(
                "<p class='greeting'>Welcome back, {}!</p>\n",
                escape_html(name)
            ));
        }

        html.push_str(
            "<div class='status-card'>\n<h3>You're Offline</h3>\n\
             <p>Check your internet connection to access all features</p>\n</div>\n",
        );

        if self.has_session {
            html.push_str("<div class='features'>\n<h3>Available offline</h3>\n<ul>\n");
            for feature in FEATURES {
                html.push_str(&format!("<li>\u{2713} {feature}</li>\n"));
            }
            html.push_str("</ul>\n</div>\n");
            html.push_str(
                "<button class='btn btn-primary' onclick='startOfflinePractice()'>\
                 Practice Offline</button>\n",
            );
        } else {
            html.push_str(
                "<p class='subtitle'>Sign in when you're online to access offline features</p>\n",
            );
        }

        let retry_class = if self.has_session {
            "btn btn-secondary"
        } else {
            "btn btn-primary"
        };
        html.push_str(&format!(
            "<button id='retryBtn' class='{retry_class}' onclick='retryConnection()'>\
             Try Again</button>\n"
        ));
        html.push_str("<div id='loading' class='loading'>Loading offline content...</div>\n");
        html.push_str(
            "<p class='tip'>Tip: Turn on WiFi or mobile data to continue learning</p>\n",
        );
        html.push_str("</div>\n");
        html.push_str(&SCRIPT.replace("__BRIDGE__", APP_BRIDGE_OBJECT));
        html.push_str("\n</body>\n</html>\n");
        html
    }
}

/// Escape text for an HTML text node or single/double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use portal_store::SharedStore;

    fn page(user: Option<&str>, session: bool) -> String {
        OfflinePage {
            app_name: "JambGenius".into(),
            user_name: user.map(str::to_string),
            has_session: session,
        }
        .render()
    }

    #[test]
    fn greets_cached_user() {
        let html = page(Some("Ada"), true);
        assert!(html.contains("<p class='greeting'>Welcome back, Ada!</p>"));
        assert!(html.contains("Practice Offline"));
        assert!(!html.contains("Sign in when you're online"));
    }

    #[test]
    fn anonymous_page_prompts_sign_in() {
        let html = page(None, false);
        assert!(!html.contains("class='greeting'"));
        assert!(!html.contains("Practice Offline"));
        assert!(html.contains(
            "<p class='subtitle'>Sign in when you're online to access offline features</p>"
        ));
    }

    #[test]
    fn always_has_status_and_retry() {
        for html in [page(None, false), page(Some("Ada"), true)] {
            assert!(html.contains("You're Offline"));
            assert!(html.contains("Try Again"));
            assert!(html.contains("window.AndroidApp.retryConnection()"));
            assert!(html.contains("location.reload()"));
            assert!(!html.contains("__BRIDGE__"));
        }
    }

    #[test]
    fn user_name_is_escaped() {
        let html = page(Some("<script>alert('x')</script>"), true);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("Welcome back, &lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;!"));
    }

    #[test]
    fn from_cache_reads_profile() {
        let cache = SessionCache::new(SharedStore::in_memory());
        let anon = OfflinePage::from_cache("App", &cache);
        assert_eq!(anon.user_name, None);
        assert!(!anon.has_session);

        cache.save_cached_user(r#"{"displayName":"  Grace  "}"#);
        let named = OfflinePage::from_cache("App", &cache);
        assert_eq!(named.user_name.as_deref(), Some("Grace"));
        assert!(named.has_session);
    }

    #[test]
    fn unparsable_profile_still_counts_as_session() {
        let cache = SessionCache::new(SharedStore::in_memory());
        cache.save_cached_user("not json");
        let p = OfflinePage::from_cache("App", &cache);
        assert_eq!(p.user_name, None);
        assert!(p.has_session);
        let html = p.render();
        assert!(html.contains("Practice Offline"));
        assert!(!html.contains("class='greeting'"));
    }

    #[test]
    fn escape_html_passes_plain_text() {
        assert_eq!(escape_html("Ada Lovelace"), "Ada Lovelace");
        assert_eq!(escape_html("a&b"), "a&amp;b");
    }
}
