//! Outbox - typed producer handle for the session's outbound channel

use crate::application::errors::BotError;
use crate::domain::entities::{new_message_id, Group, MessageId, OutboundMessage, ReceiptKind};
use crate::domain::traits::OutboundSender;

/// Cloneable handle that builds outbound messages from the local identity
/// and enqueues them on the single outbound channel.
///
/// Every send waits for channel capacity, so callers inherit the session's
/// backpressure.
#[derive(Clone)]
pub struct Outbox {
    own_id: String,
    tx: OutboundSender,
}

impl Outbox {
    pub fn new(own_id: impl Into<String>, tx: OutboundSender) -> Self {
        Self {
            own_id: own_id.into(),
            tx,
        }
    }

    pub fn own_id(&self) -> &str {
        &self.own_id
    }

    /// Enqueue a text message for a single contact
    pub async fn send_text(&self, to: &str, text: &str) -> Result<MessageId, BotError> {
        if to.trim().is_empty() {
            return Err(BotError::InvalidInput("recipient is empty".to_string()));
        }
        if text.is_empty() {
            return Err(BotError::InvalidInput("message text is empty".to_string()));
        }
        let id = new_message_id();
        self.enqueue(OutboundMessage::Text {
            id,
            from: self.own_id.clone(),
            to: to.to_string(),
            text: text.to_string(),
        })
        .await?;
        Ok(id)
    }

    /// Enqueue a text message for every member of `group`
    pub async fn send_group_text(&self, group: &Group, text: &str) -> Result<MessageId, BotError> {
        if text.is_empty() {
            return Err(BotError::InvalidInput("message text is empty".to_string()));
        }
        let id = new_message_id();
        self.enqueue(OutboundMessage::GroupText {
            id,
            from: self.own_id.clone(),
            group: group.clone(),
            text: text.to_string(),
        })
        .await?;
        Ok(id)
    }

    /// Build a delivery receipt for `message_id`, addressed to `to`
    pub fn delivery_receipt(
        &self,
        to: &str,
        message_id: MessageId,
        kind: ReceiptKind,
    ) -> Result<OutboundMessage, BotError> {
        if to.trim().is_empty() {
            return Err(BotError::InvalidInput("receipt recipient is empty".to_string()));
        }
        Ok(OutboundMessage::DeliveryReceipt {
            id: new_message_id(),
            from: self.own_id.clone(),
            to: to.to_string(),
            message_id,
            kind,
        })
    }

    pub async fn enqueue(&self, message: OutboundMessage) -> Result<(), BotError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| BotError::ChannelClosed)
    }
}
