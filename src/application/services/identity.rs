use std::path::Path;

use crate::application::errors::BotError;
use crate::domain::entities::Identity;
use crate::domain::traits::IdentityVault;

/// Load the identity at `path`, or create and save a new one when the file is missing
pub async fn bootstrap_identity(
    vault: &dyn IdentityVault,
    path: &Path,
    passphrase: &str,
) -> Result<Identity, BotError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| BotError::Session(format!("checking {}: {}", path.display(), e)))?;
    if exists {
        tracing::info!("Loading ID from {}", path.display());
        return vault.load(path, passphrase).await;
    }

    let identity = vault.create().await?;
    tracing::info!("Saving ID to {}", path.display());
    vault.save(&identity, path, passphrase).await?;
    Ok(identity)
}
