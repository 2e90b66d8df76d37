use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Identity, OutboundMessage, Received};

/// Producer side of the single outbound channel
pub type OutboundSender = mpsc::Sender<OutboundMessage>;

/// Consumer side of the inbound channel
pub type InboundReceiver = mpsc::Receiver<Received>;

/// Session trait - abstraction over the encrypted messaging session
///
/// The session owns handshake, framing and encryption. It consumes the
/// outbound channel with its own send loop and feeds the inbound channel
/// until the connection ends, at which point the inbound channel closes.
#[async_trait]
pub trait Session: Send + Sync {
    async fn start(&self, identity: &Identity) -> Result<(OutboundSender, InboundReceiver), BotError>;
}

/// Identity vault trait - creation and passphrase-protected storage of the
/// relay's own identity
#[async_trait]
pub trait IdentityVault: Send + Sync {
    /// Register a brand new identity with the network
    async fn create(&self) -> Result<Identity, BotError>;

    async fn load(&self, path: &Path, passphrase: &str) -> Result<Identity, BotError>;

    async fn save(&self, identity: &Identity, path: &Path, passphrase: &str) -> Result<(), BotError>;
}
