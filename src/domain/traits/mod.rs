//! Domain traits - Abstractions for external collaborators

pub mod directory;
pub mod session;

pub use directory::ContactLookup;
pub use session::{IdentityVault, InboundReceiver, OutboundSender, Session};
