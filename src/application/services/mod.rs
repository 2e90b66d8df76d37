//! Application services - Contact resolution, group reconciliation, relaying

pub mod contact_resolver;
pub mod group_reconciler;
pub mod identity;
pub mod relay_bridge;

pub use contact_resolver::ContactResolver;
pub use group_reconciler::GroupReconciler;
pub use identity::bootstrap_identity;
pub use relay_bridge::{RelayBridge, DEFAULT_GROUP_SETTLE_DELAY};
