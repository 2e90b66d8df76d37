//! Domain entities - Core relay objects with no infrastructure dependencies

pub mod identity;
pub mod contact;
pub mod group;
pub mod message;
pub mod alert;

pub use identity::Identity;
pub use contact::Contact;
pub use group::{Group, GroupId};
pub use message::{
    new_message_id, DeliveryReceipt, GroupMemberLeft, GroupMembershipChange, GroupRename,
    GroupTextMessage, InboundEvent, MediaMessage, MessageId, OutboundMessage, ReceiptKind,
    Received, TextMessage, TypingNotification,
};
pub use alert::{Alert, AlertAnnotations, AlertmanagerMessage};
