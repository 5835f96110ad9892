//! Development console: stdin lines become shell events.
//!
//! Runs on its own thread. Like page script, it only talks to the main
//! looper through a [`MainHandle`] and to the store through the bridge.

use std::io::BufRead;

use portal_bridge::{BridgeObject, JsBridge};
use portal_core::{PushHandler, PushMessage};
use portal_platform::{DesktopPlatform, Notification};
use portal_store::SharedStore;
use portal_types::event::{DownloadRequest, ShellEvent, UiRequest};
use portal_types::looper::MainHandle;

pub const HELP: &str = "\
commands:
  reload              pull-to-refresh
  retry               offline page \"Try Again\"
  back                back button
  scroll <y>          report the content scroll offset
  open <url>          navigate (deep links and external URLs are routed)
  download <url>      start a download
  call [obj.]<method> [arg]
                      invoke a bridge method as page script would
                      (obj is AndroidApp or AndroidAuth)
  push <json>         deliver a push message
  tap                 tap the last notification
  token <value>       deliver a new push token
  pause | resume      screen visibility
  quit                exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(ShellEvent),
    Call { method: String, args: Vec<String> },
    Push(String),
    Tap,
    Token(String),
    Help,
}

/// Parse one console line. Blank and unknown lines yield `None`.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let event = |e| Some(Command::Event(e));
    match word {
        "" => None,
        "reload" => event(ShellEvent::RefreshGesture),
        "retry" => event(ShellEvent::Bridge(UiRequest::RetryConnection)),
        "back" => event(ShellEvent::BackPressed),
        "pause" => event(ShellEvent::Pause),
        "resume" => event(ShellEvent::Resume),
        "quit" | "exit" => event(ShellEvent::Quit),
        "scroll" => event(ShellEvent::ScrollChanged {
            y: rest.parse().ok()?,
        }),
        "open" if !rest.is_empty() => event(ShellEvent::NavigationRequested { url: rest.into() }),
        "download" if !rest.is_empty() => {
            event(ShellEvent::DownloadRequested(DownloadRequest {
                url: rest.into(),
                content_disposition: None,
                mime_type: None,
            }))
        },
        "call" if !rest.is_empty() => {
            let (method, arg) = match rest.split_once(char::is_whitespace) {
                Some((m, a)) => (m, vec![a.trim().to_string()]),
                None => (rest, Vec::new()),
            };
            Some(Command::Call {
                method: method.to_string(),
                args: arg,
            })
        },
        "push" if !rest.is_empty() => Some(Command::Push(rest.into())),
        "tap" => Some(Command::Tap),
        "token" if !rest.is_empty() => Some(Command::Token(rest.into())),
        "help" | "?" => Some(Command::Help),
        _ if line.contains("://") => {
            event(ShellEvent::NavigationRequested { url: line.into() })
        },
        _ => None,
    }
}

/// State owned by the console thread.
pub struct Console {
    handle: MainHandle,
    bridge: JsBridge,
    store: SharedStore,
    push: PushHandler,
    notifier: DesktopPlatform,
    last_notification: Option<Notification>,
}

impl Console {
    pub fn new(
        handle: MainHandle,
        bridge: JsBridge,
        store: SharedStore,
        push: PushHandler,
    ) -> Self {
        Self {
            handle,
            bridge,
            store,
            push,
            notifier: DesktopPlatform::new(),
            last_notification: None,
        }
    }

    /// Read stdin until EOF or `quit`. EOF also stops the shell.
    pub fn run(mut self) {
        println!("{HELP}");
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::warn!("Console read failed: {e}");
                    break;
                },
            };
            if !self.execute(&line) {
                return;
            }
        }
        self.handle.post(ShellEvent::Quit);
    }

    /// Run one line. Returns `false` once the shell should stop.
    fn execute(&mut self, line: &str) -> bool {
        let Some(command) = parse(line) else {
            if !line.trim().is_empty() {
                println!("unknown command; try `help`");
            }
            return true;
        };
        match command {
            Command::Event(event) => {
                let quit = event == ShellEvent::Quit;
                return self.handle.post(event) && !quit;
            },
            Command::Call { method, args } => {
                let (object, name) = match method.split_once('.') {
                    Some((object, name)) => (BridgeObject::from_name(object), name),
                    None => (BridgeObject::exposing(&method), method.as_str()),
                };
                match object {
                    Some(object) => {
                        let reply = self.bridge.dispatch_method(object, name, &args);
                        println!("{}.{name} -> {}", object.name(), reply.to_js());
                    },
                    None => println!("no bridge object exposes {method}"),
                }
            },
            Command::Push(json) => self.deliver_push(&json),
            Command::Tap => match self.last_notification.take() {
                Some(n) => match n.extra(portal_core::push::EXTRA_DEEP_LINK) {
                    Some(link) => {
                        self.handle.post(ShellEvent::NavigationRequested {
                            url: link.to_string(),
                        });
                    },
                    None => println!("notification has no deep link"),
                },
                None => println!("no notification to tap"),
            },
            Command::Token(token) => self.push.on_new_token(&self.store, &token),
            Command::Help => println!("{HELP}"),
        }
        true
    }

    fn deliver_push(&mut self, json: &str) {
        let message = match PushMessage::from_json(json) {
            Ok(m) => m,
            Err(e) => {
                println!("bad push payload: {e}");
                return;
            },
        };
        match self.push.on_message(&mut self.notifier, &message) {
            Ok(n) => self.last_notification = Some(n),
            Err(e) => log::warn!("Could not post notification: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse("reload"), Some(Command::Event(ShellEvent::RefreshGesture)));
        assert_eq!(parse("  back "), Some(Command::Event(ShellEvent::BackPressed)));
        assert_eq!(parse("exit"), Some(Command::Event(ShellEvent::Quit)));
        assert_eq!(
            parse("scroll 0"),
            Some(Command::Event(ShellEvent::ScrollChanged { y: 0 }))
        );
        assert_eq!(parse("scroll up"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("dance"), None);
    }

    #[test]
    fn bare_urls_navigate() {
        assert_eq!(
            parse("app://auth?token=abc123"),
            Some(Command::Event(ShellEvent::NavigationRequested {
                url: "app://auth?token=abc123".into()
            }))
        );
    }

    #[test]
    fn bridge_calls_keep_argument_whole() {
        assert_eq!(
            parse(r#"call saveCachedUser {"displayName": "Ada"}"#),
            Some(Command::Call {
                method: "saveCachedUser".into(),
                args: vec![r#"{"displayName": "Ada"}"#.into()],
            })
        );
        assert_eq!(
            parse("call getSession"),
            Some(Command::Call {
                method: "getSession".into(),
                args: Vec::new(),
            })
        );
        assert_eq!(
            parse("call AndroidAuth.setAuthToken tok"),
            Some(Command::Call {
                method: "AndroidAuth.setAuthToken".into(),
                args: vec!["tok".into()],
            })
        );
    }

    #[test]
    fn commands_needing_arguments_reject_bare_word() {
        assert_eq!(parse("open"), None);
        assert_eq!(parse("push"), None);
        assert_eq!(parse("download"), None);
    }
}
