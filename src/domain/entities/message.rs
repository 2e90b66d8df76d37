use std::fmt;

use super::{Group, GroupId};

/// Session-level message identifier
pub type MessageId = u64;

/// Fresh random message identifier
pub fn new_message_id() -> MessageId {
    uuid::Uuid::new_v4().as_u64_pair().0
}

/// Kind of delivery receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    Delivered,
    Read,
}

impl ReceiptKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReceiptKind::Delivered => "delivered",
            ReceiptKind::Read => "read",
        }
    }
}

impl fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMessage {
    pub id: MessageId,
    pub sender: String,
    pub text: String,
}

impl TextMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            sender: sender.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTextMessage {
    pub id: MessageId,
    pub sender: String,
    pub group_id: GroupId,
    pub creator: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRename {
    pub sender: String,
    pub group_id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMembershipChange {
    pub sender: String,
    pub group_id: GroupId,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMemberLeft {
    pub sender: String,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub sender: String,
    pub message_id: MessageId,
    pub kind: ReceiptKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypingNotification {
    pub sender: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaMessage {
    pub id: MessageId,
    pub sender: String,
}

/// Message variants delivered by the session
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Text(TextMessage),
    GroupText(GroupTextMessage),
    GroupRename(GroupRename),
    GroupMembers(GroupMembershipChange),
    GroupMemberLeft(GroupMemberLeft),
    DeliveryReceipt(DeliveryReceipt),
    Typing(TypingNotification),
    Image(MediaMessage),
    Audio(MediaMessage),
    /// A variant the session decoded but this relay has no model for
    Unknown {
        sender: String,
        content: serde_json::Value,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &str {
        match self {
            InboundEvent::Text(m) => &m.sender,
            InboundEvent::GroupText(m) => &m.sender,
            InboundEvent::GroupRename(m) => &m.sender,
            InboundEvent::GroupMembers(m) => &m.sender,
            InboundEvent::GroupMemberLeft(m) => &m.sender,
            InboundEvent::DeliveryReceipt(m) => &m.sender,
            InboundEvent::Typing(m) => &m.sender,
            InboundEvent::Image(m) | InboundEvent::Audio(m) => &m.sender,
            InboundEvent::Unknown { sender, .. } => sender,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            InboundEvent::Text(_) => "text",
            InboundEvent::GroupText(_) => "group-text",
            InboundEvent::GroupRename(_) => "group-rename",
            InboundEvent::GroupMembers(_) => "group-members",
            InboundEvent::GroupMemberLeft(_) => "group-member-left",
            InboundEvent::DeliveryReceipt(_) => "delivery-receipt",
            InboundEvent::Typing(_) => "typing",
            InboundEvent::Image(_) => "image",
            InboundEvent::Audio(_) => "audio",
            InboundEvent::Unknown { .. } => "unknown",
        }
    }
}

/// One item taken off the inbound channel
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Message(InboundEvent),
    /// The session failed to receive or decode an item
    Error(String),
}

impl From<InboundEvent> for Received {
    fn from(event: InboundEvent) -> Self {
        Received::Message(event)
    }
}

/// Items handed to the session's send loop
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text {
        id: MessageId,
        from: String,
        to: String,
        text: String,
    },
    GroupText {
        id: MessageId,
        from: String,
        group: Group,
        text: String,
    },
    DeliveryReceipt {
        id: MessageId,
        from: String,
        to: String,
        message_id: MessageId,
        kind: ReceiptKind,
    },
}

impl OutboundMessage {
    /// Recipient as shown in logs: a contact id or a hex group id
    pub fn recipient(&self) -> String {
        match self {
            OutboundMessage::Text { to, .. } | OutboundMessage::DeliveryReceipt { to, .. } => {
                to.clone()
            }
            OutboundMessage::GroupText { group, .. } => group.id.to_string(),
        }
    }
}
