//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Address book and group directory persistence
//! - Adapters: HTTP surface, directory server client, console session

pub mod config;
pub mod storage;
pub mod adapters;
