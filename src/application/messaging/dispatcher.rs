//! Event dispatcher - Routes inbound session messages to their reactions

use serde::{Deserialize, Serialize};

use super::outbox::Outbox;
use crate::application::errors::BotError;
use crate::application::services::GroupReconciler;
use crate::domain::entities::{GroupTextMessage, InboundEvent, ReceiptKind, Received, TextMessage};
use crate::domain::traits::InboundReceiver;

/// How the relay answers a direct text message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyPolicy {
    /// Delivered and read receipts only
    AckOnly,
    /// A block-quoted echo of the text, then both receipts
    #[default]
    AckAndQuote,
}

/// What to do with a group text for a group the directory does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownGroupPolicy {
    /// Log and carry on
    #[default]
    Skip,
    /// Stop the dispatcher; the directory is out of sync
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherOptions {
    pub reply: ReplyPolicy,
    pub quote_suffix: String,
    pub unknown_group: UnknownGroupPolicy,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            reply: ReplyPolicy::default(),
            quote_suffix: "Exactly!".to_string(),
            unknown_group: UnknownGroupPolicy::default(),
        }
    }
}

/// Single consumer of the inbound channel
pub struct EventDispatcher {
    own_id: String,
    outbox: Outbox,
    reconciler: GroupReconciler,
    options: DispatcherOptions,
}

impl EventDispatcher {
    pub fn new(outbox: Outbox, reconciler: GroupReconciler, options: DispatcherOptions) -> Self {
        Self {
            own_id: outbox.own_id().to_string(),
            outbox,
            reconciler,
            options,
        }
    }

    /// Drain `inbound` until the session closes it.
    ///
    /// Per-message failures are logged and skipped; only a fatal desync
    /// (under [`UnknownGroupPolicy::Fatal`]) ends the loop early.
    pub async fn run(&self, mut inbound: InboundReceiver) -> Result<(), BotError> {
        tracing::info!("Starting inbound dispatch loop...");
        while let Some(received) = inbound.recv().await {
            match self.handle(received).await {
                Ok(()) => {}
                Err(e @ BotError::Desync(_)) => {
                    tracing::error!("{}", e);
                    return Err(e);
                }
                Err(e) => tracing::warn!("Failed to handle inbound message: {}", e),
            }
        }
        tracing::info!("Inbound channel closed, dispatcher stopped");
        Ok(())
    }

    /// React to one received item
    pub async fn handle(&self, received: Received) -> Result<(), BotError> {
        let event = match received {
            Received::Message(event) => event,
            Received::Error(e) => {
                tracing::warn!("Error receiving message: {}", e);
                return Ok(());
            }
        };
        tracing::debug!("Received {} from {}", event.kind(), event.sender());

        match event {
            InboundEvent::Text(msg) => self.on_text(msg).await,
            InboundEvent::GroupText(msg) => self.on_group_text(msg).await,
            InboundEvent::GroupRename(msg) => {
                self.reconciler.apply_rename(&msg).await;
                Ok(())
            }
            InboundEvent::GroupMembers(msg) => {
                self.reconciler.apply_members(&msg).await;
                Ok(())
            }
            InboundEvent::GroupMemberLeft(msg) => {
                self.reconciler.observe_member_left(&msg);
                Ok(())
            }
            InboundEvent::DeliveryReceipt(msg) => {
                tracing::debug!("Message [{:x}] {} by {}", msg.message_id, msg.kind, msg.sender);
                Ok(())
            }
            InboundEvent::Typing(msg) => {
                tracing::debug!("Typing notification from {}: {}", msg.sender, msg.active);
                Ok(())
            }
            InboundEvent::Image(_) | InboundEvent::Audio(_) => Ok(()),
            InboundEvent::Unknown { sender, content } => {
                tracing::warn!("Unknown message type from: {}, content: {}", sender, content);
                Ok(())
            }
        }
    }

    async fn on_text(&self, msg: TextMessage) -> Result<(), BotError> {
        // Our own reflections must never trigger another reply
        if msg.sender == self.own_id {
            tracing::debug!("Ignoring own message [{:x}]", msg.id);
            return Ok(());
        }
        tracing::info!("Message from {}: {}", msg.sender, msg.text);

        if self.options.reply == ReplyPolicy::AckAndQuote {
            let quote = format!("> {}: {}\n{}", msg.sender, msg.text, self.options.quote_suffix);
            self.outbox.send_text(&msg.sender, &quote).await?;
        }
        for kind in [ReceiptKind::Delivered, ReceiptKind::Read] {
            let receipt = self.outbox.delivery_receipt(&msg.sender, msg.id, kind)?;
            self.outbox.enqueue(receipt).await?;
        }
        Ok(())
    }

    async fn on_group_text(&self, msg: GroupTextMessage) -> Result<(), BotError> {
        match self.reconciler.find_by_id(&msg.group_id).await {
            Some(group) => {
                tracing::info!(
                    "{} for group [{}] {} created by [{}]: {}",
                    msg.sender,
                    group.id,
                    group.name,
                    msg.creator,
                    msg.text
                );
                Ok(())
            }
            None => match self.options.unknown_group {
                UnknownGroupPolicy::Skip => {
                    tracing::warn!(
                        "Skipping message from {} for unknown group [{}]",
                        msg.sender,
                        msg.group_id
                    );
                    Ok(())
                }
                UnknownGroupPolicy::Fatal => Err(BotError::Desync(format!(
                    "message from {} for unknown group [{}]",
                    msg.sender, msg.group_id
                ))),
            },
        }
    }
}
