use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Contact;

/// Directory lookup trait - resolves an identifier against the directory server
#[async_trait]
pub trait ContactLookup: Send + Sync {
    async fn lookup_contact(&self, id: &str) -> Result<Contact, BotError>;
}
