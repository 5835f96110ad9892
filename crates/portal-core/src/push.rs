//! Push message handling.
//!
//! Turns an incoming push payload into a posted notification whose extras
//! carry the deep link and message type back to the main screen when the
//! notification is tapped.

use std::collections::HashMap;

use portal_platform::{ChannelSpec, Notification, NotificationService};
use portal_store::SharedStore;
use portal_types::config::ShellConfig;
use portal_types::error::Result;
use serde::Deserialize;

/// Store key for the latest push registration token.
pub const KEY_PUSH_TOKEN: &str = "push_token";

pub const EXTRA_DEEP_LINK: &str = "deepLink";
pub const EXTRA_NOTIFICATION_TYPE: &str = "notificationType";

/// Bodies longer than this use the expanded layout.
const BIG_TEXT_THRESHOLD: usize = 100;

/// Notification block of a push payload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PushNotificationBody {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// An incoming push message. Either part may be absent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PushMessage {
    pub notification: Option<PushNotificationBody>,
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn title(&self) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(|n| n.title.as_deref())
            .or_else(|| self.data.get("title").map(String::as_str))
            .filter(|t| !t.trim().is_empty())
    }

    fn body(&self) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(|n| n.body.as_deref())
            .or_else(|| self.data.get("body").map(String::as_str))
            .filter(|b| !b.trim().is_empty())
    }

    fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Builds and posts notifications for push messages.
#[derive(Debug)]
pub struct PushHandler {
    channel: ChannelSpec,
    default_title: String,
    default_body: String,
    next_id: i32,
}

impl PushHandler {
    pub fn from_config(config: &ShellConfig) -> Self {
        let n = &config.notifications;
        Self {
            channel: ChannelSpec {
                id: n.channel_id.clone(),
                name: n.channel_name.clone(),
                description: n.channel_description.clone(),
            },
            default_title: config.app_name.clone(),
            default_body: n.default_body.clone(),
            next_id: 1,
        }
    }

    pub fn channel(&self) -> &ChannelSpec {
        &self.channel
    }

    /// The notification `message` would produce.
    pub fn build(&self, message: &PushMessage) -> Notification {
        let title = message.title().unwrap_or(&self.default_title).to_string();
        let body = message.body().unwrap_or(&self.default_body).to_string();
        let mut extras = Vec::new();
        if let Some(link) = message.data_value("deepLink") {
            extras.push((EXTRA_DEEP_LINK.to_string(), link.to_string()));
        }
        if let Some(kind) = message.data_value("type") {
            extras.push((EXTRA_NOTIFICATION_TYPE.to_string(), kind.to_string()));
        }
        Notification {
            channel_id: self.channel.id.clone(),
            big_text: body.chars().count() > BIG_TEXT_THRESHOLD,
            title,
            body,
            extras,
        }
    }

    /// Post a notification for `message`, creating the channel first.
    pub fn on_message(
        &mut self,
        notifications: &mut dyn NotificationService,
        message: &PushMessage,
    ) -> Result<Notification> {
        log::debug!(
            "Push message received (notification block: {}, {} data keys)",
            message.notification.is_some(),
            message.data.len()
        );
        let notification = self.build(message);
        notifications.ensure_channel(&self.channel)?;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        notifications.notify(id, &notification)?;
        Ok(notification)
    }

    /// Record a new registration token.
    pub fn on_new_token(&self, store: &SharedStore, token: &str) {
        log::info!("Push token refreshed: {}", mask_token(token));
        store.put_string(KEY_PUSH_TOKEN, token);
    }
}

fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    if prefix.len() < token.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use portal_types::error::PortalError;

    #[derive(Default)]
    struct Recorder {
        channels: Vec<String>,
        posted: Vec<(i32, Notification)>,
    }

    impl NotificationService for Recorder {
        fn ensure_channel(&mut self, channel: &ChannelSpec) -> Result<()> {
            if !self.channels.contains(&channel.id) {
                self.channels.push(channel.id.clone());
            }
            Ok(())
        }

        fn notify(&mut self, id: i32, notification: &Notification) -> Result<()> {
            if !self.channels.contains(&notification.channel_id) {
                return Err(PortalError::Platform("no channel".into()));
            }
            self.posted.push((id, notification.clone()));
            Ok(())
        }
    }

    fn handler() -> PushHandler {
        PushHandler::from_config(&ShellConfig::default())
    }

    #[test]
    fn full_message_is_posted() {
        let msg = PushMessage::from_json(
            r#"{
                "notification": {"title": "New mock exam", "body": "Physics is ready"},
                "data": {"deepLink": "https://jambgenius.vercel.app/exam/7", "type": "exam"}
            }"#,
        )
        .unwrap();
        let mut rec = Recorder::default();
        let n = handler().on_message(&mut rec, &msg).unwrap();
        assert_eq!(n.title, "New mock exam");
        assert_eq!(n.body, "Physics is ready");
        assert!(!n.big_text);
        assert_eq!(n.extra(EXTRA_DEEP_LINK), Some("https://jambgenius.vercel.app/exam/7"));
        assert_eq!(n.extra(EXTRA_NOTIFICATION_TYPE), Some("exam"));
        assert_eq!(rec.channels, vec!["jambgenius_notifications".to_string()]);
        assert_eq!(rec.posted.len(), 1);
    }

    #[test]
    fn missing_parts_use_defaults() {
        let msg = PushMessage::from_json("{}").unwrap();
        let n = handler().build(&msg);
        assert_eq!(n.title, "JambGenius");
        assert_eq!(n.body, "New notification");
        assert!(n.extras.is_empty());

        let msg = PushMessage::from_json(r#"{"notification": {"title": null}}"#).unwrap();
        assert_eq!(handler().build(&msg).title, "JambGenius");
    }

    #[test]
    fn unknown_notification_fields_are_ignored() {
        let msg = PushMessage::from_json(
            r#"{"notification": {"title": "Hi", "click_action": "OPEN_EXAM", "icon": "x"}}"#,
        )
        .unwrap();
        assert_eq!(handler().build(&msg).title, "Hi");
    }

    #[test]
    fn data_only_message_uses_data_fields() {
        let msg =
            PushMessage::from_json(r#"{"data": {"title": "Reminder", "body": "Study time"}}"#)
                .unwrap();
        let n = handler().build(&msg);
        assert_eq!(n.title, "Reminder");
        assert_eq!(n.body, "Study time");
    }

    #[test]
    fn long_body_uses_big_text() {
        let body = "x".repeat(101);
        let msg = PushMessage {
            notification: Some(PushNotificationBody {
                body: Some(body.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(handler().build(&msg).big_text);

        let msg = PushMessage {
            notification: Some(PushNotificationBody {
                body: Some("x".repeat(100)),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!handler().build(&msg).big_text);
    }

    #[test]
    fn empty_extras_are_skipped() {
        let msg = PushMessage::from_json(r#"{"data": {"deepLink": "", "type": "news"}}"#).unwrap();
        let n = handler().build(&msg);
        assert_eq!(n.extra(EXTRA_DEEP_LINK), None);
        assert_eq!(n.extra(EXTRA_NOTIFICATION_TYPE), Some("news"));
    }

    #[test]
    fn ids_increase() {
        let mut rec = Recorder::default();
        let mut h = handler();
        h.on_message(&mut rec, &PushMessage::default()).unwrap();
        h.on_message(&mut rec, &PushMessage::default()).unwrap();
        assert_eq!(rec.posted[0].0 + 1, rec.posted[1].0);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(PushMessage::from_json("[1,2"), Err(PortalError::Json(_))));
    }

    #[test]
    fn new_token_is_stored() {
        let store = SharedStore::in_memory();
        handler().on_new_token(&store, "abcdefghijklmnop");
        assert_eq!(store.get_string(KEY_PUSH_TOKEN), "abcdefghijklmnop");
        assert_eq!(mask_token("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(mask_token("abc"), "abc");
    }
}
