//! Adapters - Session, directory and HTTP integrations

pub mod console;
pub mod directory;
pub mod http;

pub use console::ConsoleSession;
pub use directory::HttpDirectory;
pub use http::{build_router, serve, HttpState, JsonMessage};
