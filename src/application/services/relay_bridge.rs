use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::application::messaging::Outbox;
use crate::application::services::ContactResolver;
use crate::domain::entities::{GroupId, MessageId};
use crate::infrastructure::storage::GroupDirectory;

/// Default pause before a group send
pub const DEFAULT_GROUP_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Translates external send requests into session sends.
///
/// Any number of request handlers may call into the bridge at once; all of
/// them funnel into the single outbound channel behind the [`Outbox`].
pub struct RelayBridge {
    resolver: Arc<ContactResolver>,
    groups: Arc<GroupDirectory>,
    outbox: Outbox,
    group_settle_delay: Duration,
}

impl RelayBridge {
    pub fn new(resolver: Arc<ContactResolver>, groups: Arc<GroupDirectory>, outbox: Outbox) -> Self {
        Self {
            resolver,
            groups,
            outbox,
            group_settle_delay: DEFAULT_GROUP_SETTLE_DELAY,
        }
    }

    /// Pause inserted before each group send. The session's rekeying path
    /// races with sends that follow some events immediately.
    pub fn with_group_settle_delay(mut self, delay: Duration) -> Self {
        self.group_settle_delay = delay;
        self
    }

    /// Send `text` to a contact, provisioning it from the directory on first use.
    ///
    /// Returns once the outbound channel has accepted the message.
    pub async fn relay_direct(&self, to: &str, text: &str) -> Result<MessageId, BotError> {
        check_text(text)?;
        let contact = self.resolver.resolve(to).await?;
        let id = self.outbox.send_text(&contact.id, text).await?;
        tracing::info!("{} → {}: {}", self.outbox.own_id(), contact.id, text);
        Ok(id)
    }

    /// Send `text` to a known group, addressed by its hex identifier
    pub async fn relay_group(&self, to: &str, text: &str) -> Result<MessageId, BotError> {
        check_text(text)?;
        let group_id: GroupId = to
            .parse()
            .map_err(|e| BotError::InvalidInput(format!("group identifier {:?}: {}", to, e)))?;
        let group = self
            .groups
            .find_by_id(&group_id)
            .await
            .ok_or_else(|| BotError::NotFound(format!("no such group [{}]", group_id)))?;

        tokio::time::sleep(self.group_settle_delay).await;
        let id = self.outbox.send_group_text(&group, text).await?;
        tracing::info!("{} → group [{}] {}: {}", self.outbox.own_id(), group.id, group.name, text);
        Ok(id)
    }
}

fn check_text(text: &str) -> Result<(), BotError> {
    if text.is_empty() {
        return Err(BotError::InvalidInput("message text is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Contact, Group, OutboundMessage};
    use crate::domain::traits::ContactLookup;
    use crate::infrastructure::storage::AddressBook;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    /// Knows every identifier and names it after itself
    #[derive(Default)]
    struct EchoDirectory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContactLookup for EchoDirectory {
        async fn lookup_contact(&self, id: &str) -> Result<Contact, BotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Contact::new(id, id.to_lowercase()))
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        bridge: Arc<RelayBridge>,
        contacts: Arc<AddressBook>,
        groups: Arc<GroupDirectory>,
        directory: Arc<EchoDirectory>,
        rx: mpsc::Receiver<OutboundMessage>,
    }

    fn fixture(capacity: usize) -> Fixture {
        let dir = tempdir().unwrap();
        let contacts = Arc::new(AddressBook::new(dir.path().join("address.book")));
        let groups = Arc::new(GroupDirectory::new(dir.path().join("group.directory")));
        let directory = Arc::new(EchoDirectory::default());
        let resolver = Arc::new(ContactResolver::new(contacts.clone(), directory.clone()));
        let (tx, rx) = mpsc::channel(capacity);
        let bridge = RelayBridge::new(resolver, groups.clone(), Outbox::new("ME000000", tx))
            .with_group_settle_delay(Duration::from_millis(5));
        Fixture {
            _dir: dir,
            bridge: Arc::new(bridge),
            contacts,
            groups,
            directory,
            rx,
        }
    }

    #[tokio::test]
    async fn relay_direct_enqueues_text() {
        let mut fx = fixture(4);
        fx.bridge.relay_direct("A1B2C3D4", "ping").await.unwrap();

        match fx.rx.recv().await.unwrap() {
            OutboundMessage::Text { to, text, .. } => {
                assert_eq!(to, "A1B2C3D4");
                assert_eq!(text, "ping");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn concurrent_direct_relays_enqueue_exactly_once_each() {
        let mut fx = fixture(64);
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let bridge = fx.bridge.clone();
                tokio::spawn(async move { bridge.relay_direct(&format!("ID{:06}", i), "hi").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        drop(fx.bridge);

        let mut seen = HashSet::new();
        while let Some(msg) = fx.rx.recv().await {
            assert!(seen.insert(msg.recipient()), "duplicate for {}", msg.recipient());
        }
        assert_eq!(seen.len(), 32);
    }

    #[tokio::test]
    async fn relay_group_unknown_group_is_not_found() {
        let fx = fixture(4);
        let err = fx.bridge.relay_group("aa", "hi").await.unwrap_err();
        assert!(matches!(err, BotError::NotFound(_)));
    }

    #[tokio::test]
    async fn relay_group_rejects_bad_identifier() {
        let fx = fixture(4);
        let err = fx.bridge.relay_group("not-hex", "hi").await.unwrap_err();
        assert!(matches!(err, BotError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn relay_group_waits_then_enqueues() {
        let mut fx = fixture(4);
        let group = Group::new(GroupId::new(vec![0xaa]), "X1")
            .with_name("Team")
            .with_members(vec!["X1".into(), "ME000000".into()]);
        fx.groups.upsert(group.clone()).await.unwrap();

        let started = tokio::time::Instant::now();
        fx.bridge.relay_group("AA", "hello team").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));

        match fx.rx.recv().await.unwrap() {
            OutboundMessage::GroupText { group: sent, text, .. } => {
                assert_eq!(sent, group);
                assert_eq!(text, "hello team");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_lookup() {
        let mut fx = fixture(4);

        let err = fx.bridge.relay_direct("A1B2C3D4", "").await.unwrap_err();
        assert!(matches!(err, BotError::InvalidInput(_)));
        let err = fx.bridge.relay_group("aa", "").await.unwrap_err();
        assert!(matches!(err, BotError::InvalidInput(_)));

        assert_eq!(fx.directory.calls.load(Ordering::SeqCst), 0);
        assert!(fx.contacts.is_empty().await);
        assert!(fx.rx.try_recv().is_err());
    }
}
