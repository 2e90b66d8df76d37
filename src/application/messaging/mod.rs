//! Message handling - Outbound channel access and inbound dispatch

pub mod dispatcher;
pub mod outbox;

pub use dispatcher::{DispatcherOptions, EventDispatcher, ReplyPolicy, UnknownGroupPolicy};
pub use outbox::Outbox;
