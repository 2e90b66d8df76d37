//! Domain layer - Core relay objects and collaborator contracts
//! 
//! This layer contains:
//! - Entities: Identity, Contact, Group, inbound events and outbound messages
//! - Traits: Abstractions for the session, identity vault and directory lookup

pub mod entities;
pub mod traits;
