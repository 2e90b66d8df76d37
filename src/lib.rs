//! Relay between an HTTP/JSON command surface and an end-to-end encrypted
//! messaging session, keeping local replicas of the address book and the
//! group directory.

pub mod domain;
pub mod application;
pub mod infrastructure;
