use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::entities::{Group, GroupId, GroupMemberLeft, GroupMembershipChange, GroupRename};
use crate::infrastructure::storage::GroupDirectory;

/// Applies group-management events to the local group directory.
///
/// A group is Unknown until the first rename or membership event names it,
/// and Known afterwards. Every mutation is saved immediately; a failed save
/// is logged and the in-memory state stays authoritative.
///
/// Membership events replace the stored member list outright. Updates to a
/// Known group are not merged, so a stale event can revert an earlier one.
pub struct GroupReconciler {
    own_id: String,
    groups: Arc<GroupDirectory>,
}

impl GroupReconciler {
    pub fn new(own_id: impl Into<String>, groups: Arc<GroupDirectory>) -> Self {
        Self {
            own_id: own_id.into(),
            groups,
        }
    }

    pub async fn find_by_id(&self, id: &GroupId) -> Option<Group> {
        self.groups.find_by_id(id).await
    }

    /// Rename a Known group, or create it with `[sender, own id]` as members
    pub async fn apply_rename(&self, event: &GroupRename) -> Group {
        tracing::info!("Group [{}] is now called {}", event.group_id, event.name);
        let own_id = self.own_id.clone();
        let result = self
            .groups
            .upsert_with(&event.group_id, |current| match current {
                Some(group) => group.clone().with_name(event.name.clone()),
                None => {
                    let mut members = vec![event.sender.clone()];
                    if event.sender != own_id {
                        members.push(own_id);
                    }
                    Group::new(event.group_id.clone(), event.sender.clone())
                        .with_name(event.name.clone())
                        .with_members(members)
                }
            })
            .await;
        self.settle(&event.group_id, result).await
    }

    /// Replace the member list of a group.
    ///
    /// On first sync of an Unknown group every occurrence of the own id is
    /// swapped for the event sender: we know we are a member but not who
    /// created the group. Known groups take the list as-is.
    pub async fn apply_members(&self, event: &GroupMembershipChange) -> Option<Group> {
        tracing::info!("Group [{}] member update", event.group_id);
        if event.members.is_empty() {
            tracing::warn!(
                "Ignoring empty member list for group [{}] from {}",
                event.group_id,
                event.sender
            );
            return None;
        }

        let own_id = self.own_id.clone();
        let result = self
            .groups
            .upsert_with(&event.group_id, |current| match current {
                Some(group) => group.clone().with_members(event.members.clone()),
                None => {
                    let members = event
                        .members
                        .iter()
                        .map(|m| if *m == own_id { event.sender.clone() } else { m.clone() })
                        .collect();
                    Group::new(event.group_id.clone(), event.sender.clone()).with_members(members)
                }
            })
            .await;
        let group = self.settle(&event.group_id, result).await;
        tracing::info!("Group [{}] now includes {:?}", group.id, group.members);
        Some(group)
    }

    /// Member-left events are observed but not applied
    pub fn observe_member_left(&self, event: &GroupMemberLeft) {
        tracing::debug!("Member [{}] left the group [{}]", event.sender, event.group_id);
    }

    async fn settle(&self, id: &GroupId, result: Result<Group, StorageError>) -> Group {
        match result {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(
                    "Saving group directory to {} failed: {}",
                    self.groups.path().display(),
                    e
                );
                // The in-memory update has already been applied
                self.groups
                    .find_by_id(id)
                    .await
                    .unwrap_or_else(|| Group::new(id.clone(), String::new()))
            }
        }
    }
}
