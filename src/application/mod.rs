//! Application layer - Use cases and relay logic
//! 
//! This layer contains:
//! - Services: Contact resolution, group reconciliation, the relay bridge
//! - Messaging: The outbox and the inbound event dispatcher
//! - Errors: Relay-specific errors

pub mod errors;
pub mod services;
pub mod messaging;
