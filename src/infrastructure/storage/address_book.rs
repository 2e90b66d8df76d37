use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

use super::{read_snapshot, write_snapshot};
use crate::application::errors::StorageError;
use crate::domain::entities::Contact;

/// Contacts keyed by identifier, mirrored to one JSON file
pub struct AddressBook {
    path: PathBuf,
    contacts: RwLock<HashMap<String, Contact>>,
    write_lock: Mutex<()>,
}

impl AddressBook {
    /// Empty address book backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contacts: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Load from `path` if the file exists, otherwise start empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let book = Self::new(path);
        if let Some(contacts) = read_snapshot::<Vec<Contact>>(&book.path).await? {
            tracing::info!("Loaded {} contacts from {}", contacts.len(), book.path.display());
            let mut map = book.contacts.write().await;
            for contact in contacts {
                map.insert(contact.id.clone(), contact);
            }
        }
        Ok(book)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, id: &str) -> Option<Contact> {
        self.contacts.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.contacts.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }

    /// All contacts sorted by identifier
    pub async fn snapshot(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.read().await.values().cloned().collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        contacts
    }

    /// Insert a contact unless its identifier is already present, then persist.
    ///
    /// Returns `Ok(false)` without touching the file when the identifier was
    /// already known. On a save failure the contact stays in memory.
    pub async fn insert(&self, contact: Contact) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        {
            let mut contacts = self.contacts.write().await;
            if contacts.contains_key(&contact.id) {
                return Ok(false);
            }
            contacts.insert(contact.id.clone(), contact);
        }
        self.persist().await?;
        Ok(true)
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

    #[tokio::test]
    async fn insert_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("address.book");

        let book = AddressBook::open(&path).await.unwrap();
        assert!(book.is_empty().await);
        assert!(book.insert(Contact::new("A1B2C3D4", "Alice")).await.unwrap());
        assert!(path.exists());

        let reloaded = AddressBook::open(&path).await.unwrap();
        assert_eq!(reloaded.get("A1B2C3D4").await, Some(Contact::new("A1B2C3D4", "Alice")));
    }

    #[tokio::test]
    async fn insert_never_duplicates() {
        let dir = tempdir().unwrap();
        let book = AddressBook::new(dir.path().join("address.book"));

        assert!(book.insert(Contact::new("A1B2C3D4", "Alice")).await.unwrap());
        assert!(!book.insert(Contact::new("A1B2C3D4", "Mallory")).await.unwrap());
        assert_eq!(book.len().await, 1);
        assert_eq!(book.get("A1B2C3D4").await.unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn failed_save_keeps_memory() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("address.book");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        let book = AddressBook::new(&path);
        assert!(book.insert(Contact::new("ECHOECHO", "Echo")).await.is_err());
        assert!(book.contains("ECHOECHO").await);
    }
}
