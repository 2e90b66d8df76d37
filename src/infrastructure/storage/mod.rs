//! File-based snapshot storage for the address book and group directory
//!
//! Each directory keeps one authoritative in-memory copy and mirrors it to a
//! single JSON file that is rewritten wholesale after every mutation.

pub mod address_book;
pub mod group_directory;

pub use address_book::AddressBook;
pub use group_directory::GroupDirectory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::application::errors::StorageError;

/// Write `value` as pretty JSON, replacing the file via a sibling temp file
pub(crate) async fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, &data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read a JSON snapshot; `None` when the file does not exist yet
pub(crate) async fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&data)?))
}
