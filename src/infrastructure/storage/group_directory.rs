use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

use super::{read_snapshot, write_snapshot};
use crate::application::errors::StorageError;
use crate::domain::entities::{Group, GroupId};

/// Groups keyed by group identifier, mirrored to one JSON file
pub struct GroupDirectory {
    path: PathBuf,
    groups: RwLock<HashMap<GroupId, Group>>,
    write_lock: Mutex<()>,
}

impl GroupDirectory {
    /// Empty directory backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            groups: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Load from `path` if the file exists, otherwise start empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let directory = Self::new(path);
        if let Some(groups) = read_snapshot::<Vec<Group>>(&directory.path).await? {
            tracing::info!("Loaded {} groups from {}", groups.len(), directory.path.display());
            let mut map = directory.groups.write().await;
            for group in groups {
                map.insert(group.id.clone(), group);
            }
        }
        Ok(directory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn find_by_id(&self, id: &GroupId) -> Option<Group> {
        self.groups.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }

    /// All groups sorted by identifier
    pub async fn snapshot(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.read().await.values().cloned().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        groups
    }

    /// Insert `group`, or overwrite the entry with the same identifier, then persist
    pub async fn upsert(&self, group: Group) -> Result<(), StorageError> {
        let id = group.id.clone();
        self.upsert_with(&id, move |_| group).await.map(|_| ())
    }

    /// Read-modify-persist under the directory's write guard.
    ///
    /// `f` receives the current entry (if any) and returns its replacement,
    /// whose identifier is forced to `id`. The in-memory update is kept even
    /// when saving fails.
    pub async fn upsert_with<F>(&self, id: &GroupId, f: F) -> Result<Group, StorageError>
    where
        F: FnOnce(Option<&Group>) -> Group,
    {
        let _guard = self.write_lock.lock().await;
        let group = {
            let mut groups = self.groups.write().await;
            let mut group = f(groups.get(id));
            group.id = id.clone();
            groups.insert(id.clone(), group.clone());
            group
        };
        self.persist().await?;
        Ok(group)
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let snapshot = self.snapshot().await;
        write_snapshot(&self.path, &snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn team(id: u8) -> Group {
        Group::new(GroupId::new(vec![id, 0x01]), "X1")
            .with_name(format!("Team {}", id))
            .with_members(vec!["X1".to_string(), "ME000000".to_string()])
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("group.directory");

        let directory = GroupDirectory::open(&path).await.unwrap();
        directory.upsert(team(0xaa)).await.unwrap();
        directory.upsert(team(0xbb)).await.unwrap();

        let reloaded = GroupDirectory::open(&path).await.unwrap();
        assert_eq!(reloaded.snapshot().await, directory.snapshot().await);
        assert_eq!(reloaded.len().await, 2);
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_entry() {
        let dir = tempdir().unwrap();
        let directory = GroupDirectory::new(dir.path().join("group.directory"));

        directory.upsert(team(0xaa)).await.unwrap();
        directory.upsert(team(0xaa).with_name("Renamed")).await.unwrap();

        assert_eq!(directory.len().await, 1);
        let found = directory.find_by_id(&GroupId::new(vec![0xaa, 0x01])).await.unwrap();
        assert_eq!(found.name, "Renamed");
    }

    #[tokio::test]
    async fn upsert_with_sees_current_entry() {
        let dir = tempdir().unwrap();
        let directory = GroupDirectory::new(dir.path().join("group.directory"));
        let id = GroupId::new(vec![0xaa, 0x01]);

        let created = directory
            .upsert_with(&id, |current| {
                assert!(current.is_none());
                Group::new(GroupId::new(vec![0]), "X1")
            })
            .await
            .unwrap();
        assert_eq!(created.id, id);

        directory
            .upsert_with(&id, |current| {
                let current = current.expect("entry exists");
                current.clone().with_name("Team")
            })
            .await
            .unwrap();
        assert_eq!(directory.find_by_id(&id).await.unwrap().name, "Team");
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let directory = GroupDirectory::open(dir.path().join("nothing-here")).await.unwrap();
        assert!(directory.is_empty().await);
    }
}
