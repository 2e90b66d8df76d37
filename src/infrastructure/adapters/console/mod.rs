//! Console adapter for development/testing
//!
//! Stands in for the encrypted messaging session: outbound messages are
//! printed, and each stdin line `<SENDER> <text>` is delivered as an inbound
//! message. Lines whose text starts with `!` produce other event kinds:
//!
//! ```text
//! X1 !rename aa01 Team
//! X1 !members aa01 X1,Y2,ME000000
//! X1 !group aa01 hello group
//! X1 !left aa01
//! X1 !typing
//! ```

use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{
    new_message_id, GroupId, GroupMemberLeft, GroupMembershipChange, GroupRename,
    GroupTextMessage, Identity, InboundEvent, MediaMessage, OutboundMessage, Received,
    TextMessage, TypingNotification,
};
use crate::domain::traits::{IdentityVault, InboundReceiver, OutboundSender, Session};

/// Console session and identity vault for local development.
///
/// Identity files are plain JSON; the passphrase is only checked for presence.
pub struct ConsoleSession {
    capacity: usize,
}

impl ConsoleSession {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl Default for ConsoleSession {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Render an outbound message the way the console shows it
pub fn render_outbound(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::Text { to, text, .. } => format!("[OUT] {} <- {}", to, text),
        OutboundMessage::GroupText { group, text, .. } => {
            format!("[OUT] group [{}] {} <- {}", group.id, group.name, text)
        }
        OutboundMessage::DeliveryReceipt { to, message_id, kind, .. } => {
            format!("[OUT] {} <- {} receipt for [{:x}]", to, kind, message_id)
        }
    }
}

fn parse_group(sender: &str, raw: Option<&str>) -> Result<GroupId, Received> {
    let raw = raw.unwrap_or_default();
    raw.parse().map_err(|e| {
        Received::Error(format!("invalid group id {:?} from {}: {}", raw, sender, e))
    })
}

/// Turn one console line into an inbound item; blank lines yield nothing
pub fn parse_line(line: &str) -> Option<Received> {
    let line = line.trim();
    let (sender, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    let sender = sender.to_string();

    let Some(command) = rest.strip_prefix('!') else {
        return Some(InboundEvent::Text(TextMessage::new(sender, rest)).into());
    };

    let mut parts = command.splitn(3, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let group = parts.next();
    let tail = parts.next().unwrap_or_default().trim().to_string();

    let event = match verb {
        "rename" => match parse_group(&sender, group) {
            Ok(group_id) => InboundEvent::GroupRename(GroupRename { sender, group_id, name: tail }),
            Err(e) => return Some(e),
        },
        "members" => match parse_group(&sender, group) {
            Ok(group_id) => InboundEvent::GroupMembers(GroupMembershipChange {
                sender,
                group_id,
                members: tail
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect(),
            }),
            Err(e) => return Some(e),
        },
        "group" => match parse_group(&sender, group) {
            Ok(group_id) => InboundEvent::GroupText(GroupTextMessage {
                id: new_message_id(),
                creator: sender.clone(),
                sender,
                group_id,
                text: tail,
            }),
            Err(e) => return Some(e),
        },
        "left" => match parse_group(&sender, group) {
            Ok(group_id) => InboundEvent::GroupMemberLeft(GroupMemberLeft { sender, group_id }),
            Err(e) => return Some(e),
        },
        "typing" => InboundEvent::Typing(TypingNotification { sender, active: true }),
        "image" => InboundEvent::Image(MediaMessage { id: new_message_id(), sender }),
        "audio" => InboundEvent::Audio(MediaMessage { id: new_message_id(), sender }),
        _ => InboundEvent::Unknown {
            sender,
            content: serde_json::json!({ "command": command }),
        },
    };
    Some(event.into())
}

#[async_trait]
impl Session for ConsoleSession {
    async fn start(&self, identity: &Identity) -> Result<(OutboundSender, InboundReceiver), BotError> {
        tracing::info!("Starting console session for {} (dev mode)", identity);
        let (out_tx, mut out_rx) = mpsc::channel::<OutboundMessage>(self.capacity);
        let (in_tx, in_rx) = mpsc::channel::<Received>(self.capacity);

        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                println!("{}", render_outbound(&message));
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(received) = parse_line(&line) {
                            if in_tx.send(received).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = in_tx.send(Received::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            tracing::info!("Console input closed");
        });

        Ok((out_tx, in_rx))
    }
}

#[async_trait]
impl IdentityVault for ConsoleSession {
    async fn create(&self) -> Result<Identity, BotError> {
        let raw = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        let identity = Identity::new(&raw[..8]);
        tracing::info!("Created console identity {}", identity);
        Ok(identity)
    }

    async fn load(&self, path: &Path, passphrase: &str) -> Result<Identity, BotError> {
        if passphrase.is_empty() {
            return Err(BotError::InvalidInput("identity passphrase is empty".to_string()));
        }
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| BotError::Session(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| BotError::Session(format!("decoding {}: {}", path.display(), e)))
    }

    async fn save(&self, identity: &Identity, path: &Path, passphrase: &str) -> Result<(), BotError> {
        if passphrase.is_empty() {
            return Err(BotError::InvalidInput("identity passphrase is empty".to_string()));
        }
        let data = serde_json::to_vec_pretty(identity)
            .map_err(|e| BotError::Internal(e.to_string()))?;
        tokio::fs::write(path, data)
            .await
            .map_err(|e| BotError::Session(format!("writing {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(line: &str) -> InboundEvent {
        match parse_line(line) {
            Some(Received::Message(event)) => event,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn plain_line_is_text() {
        match event("A1B2C3D4 hello there") {
            InboundEvent::Text(msg) => {
                assert_eq!(msg.sender, "A1B2C3D4");
                assert_eq!(msg.text, "hello there");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blank_or_bare_sender_is_ignored() {
        assert!(parse_line("   ").is_none());
        assert!(parse_line("A1B2C3D4").is_none());
    }

    #[test]
    fn group_commands_parse() {
        assert_eq!(
            event("X1 !rename aa01 The Team"),
            InboundEvent::GroupRename(GroupRename {
                sender: "X1".into(),
                group_id: GroupId::new(vec![0xaa, 0x01]),
                name: "The Team".into(),
            })
        );
        assert_eq!(
            event("X1 !members aa01 X1, Y2,ME000000"),
            InboundEvent::GroupMembers(GroupMembershipChange {
                sender: "X1".into(),
                group_id: GroupId::new(vec![0xaa, 0x01]),
                members: vec!["X1".into(), "Y2".into(), "ME000000".into()],
            })
        );
        assert!(matches!(event("X1 !left aa01"), InboundEvent::GroupMemberLeft(_)));
        assert!(matches!(event("X1 !group aa01 hi"), InboundEvent::GroupText(_)));
        assert!(matches!(event("X1 !typing"), InboundEvent::Typing(_)));
        assert!(matches!(event("X1 !poll what"), InboundEvent::Unknown { .. }));
    }

    #[test]
    fn bad_group_id_is_a_receive_error() {
        assert!(matches!(parse_line("X1 !rename nothex Team"), Some(Received::Error(_))));
    }

    #[tokio::test]
    async fn vault_round_trips_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threema.id");
        let vault = ConsoleSession::default();

        let identity = vault.create().await.unwrap();
        assert_eq!(identity.id.len(), 8);
        vault.save(&identity, &path, "secret").await.unwrap();
        assert_eq!(vault.load(&path, "secret").await.unwrap(), identity);
        assert!(vault.load(&path, "").await.is_err());
    }
}
