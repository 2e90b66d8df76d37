use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::Contact;
use crate::domain::traits::ContactLookup;
use crate::infrastructure::storage::AddressBook;

/// Length of a network identifier
pub const IDENTIFIER_LEN: usize = 8;

/// Check that `id` is eight characters of `A-Z`, `0-9` or a leading `*`
pub fn validate_identifier(id: &str) -> Result<(), BotError> {
    let well_formed = id.len() == IDENTIFIER_LEN
        && id.char_indices().all(|(i, c)| {
            c.is_ascii_uppercase() || c.is_ascii_digit() || (i == 0 && c == '*')
        });
    if well_formed {
        Ok(())
    } else {
        Err(BotError::InvalidInput(format!("malformed contact identifier {:?}", id)))
    }
}

/// Resolves contact identifiers, provisioning unknown ones from the directory
pub struct ContactResolver {
    contacts: Arc<AddressBook>,
    lookup: Arc<dyn ContactLookup>,
    /// One guard per identifier currently being provisioned
    pending: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContactResolver {
    pub fn new(contacts: Arc<AddressBook>, lookup: Arc<dyn ContactLookup>) -> Self {
        Self {
            contacts,
            lookup,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Return the known contact for `id`, or fetch, store and return it.
    ///
    /// A directory failure fails the call. A save failure is logged and the
    /// contact is still returned from memory. Concurrent calls for the same
    /// identifier share one lookup; calls for different identifiers do not
    /// wait on each other.
    pub async fn resolve(&self, id: &str) -> Result<Contact, BotError> {
        validate_identifier(id)?;
        if let Some(contact) = self.contacts.get(id).await {
            return Ok(contact);
        }

        let slot = {
            let mut pending = self.pending.lock().await;
            pending.entry(id.to_string()).or_default().clone()
        };
        let result = {
            let _guard = slot.lock().await;
            self.provision(id).await
        };

        let mut pending = self.pending.lock().await;
        // The map and this call hold the only references once nobody waits
        let idle = pending
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) == 2);
        if idle {
            pending.remove(id);
        }
        result
    }

    async fn provision(&self, id: &str) -> Result<Contact, BotError> {
        // A racing caller may have finished while we waited
        if let Some(contact) = self.contacts.get(id).await {
            return Ok(contact);
        }

        tracing::info!("Looking up {} from directory server", id);
        let contact = self.lookup.lookup_contact(id).await?;
        if contact.id != id {
            return Err(BotError::Lookup {
                id: id.to_string(),
                reason: format!("directory answered for {}", contact.id),
            });
        }

        tracing::info!("Saving address book to {}", self.contacts.path().display());
        if let Err(e) = self.contacts.insert(contact.clone()).await {
            tracing::warn!("Saving address book failed: {}", e);
        }
        Ok(contact)
    }
}
