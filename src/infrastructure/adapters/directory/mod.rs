//! Directory server adapter

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::Contact;
use crate::domain::traits::ContactLookup;

/// Identity record as served by the directory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    identity: String,
    #[serde(default)]
    nickname: Option<String>,
}

/// Looks identities up over the directory server's REST API
pub struct HttpDirectory {
    client: Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the API URL for an identity
    fn identity_url(&self, id: &str) -> String {
        format!("{}/identity/{}", self.base_url, id)
    }
}

#[async_trait]
impl ContactLookup for HttpDirectory {
    async fn lookup_contact(&self, id: &str) -> Result<Contact, BotError> {
        let url = self.identity_url(id);
        tracing::debug!("Retrieving {} from {}", id, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(BotError::Lookup {
                    id: id.to_string(),
                    reason: "unknown identity".to_string(),
                })
            }
            status => {
                return Err(BotError::Lookup {
                    id: id.to_string(),
                    reason: format!("directory answered {}", status),
                })
            }
        }

        let record: IdentityRecord = response.json().await.map_err(|e| BotError::Lookup {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let name = record
            .nickname
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| record.identity.clone());
        Ok(Contact::new(record.identity, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};

    async fn identity_handler(Path(id): Path<String>) -> Result<Json<serde_json::Value>, AxumStatus> {
        match id.as_str() {
            "A1B2C3D4" => Ok(Json(serde_json::json!({
                "identity": "A1B2C3D4",
                "publicKey": "00",
                "nickname": "Alice"
            }))),
            "B2C3D4E5" => Ok(Json(serde_json::json!({
                "identity": "B2C3D4E5",
                "publicKey": "00"
            }))),
            _ => Err(AxumStatus::NOT_FOUND),
        }
    }

    async fn spawn_directory() -> String {
        let app = Router::new().route("/identity/:id", get(identity_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn resolves_known_identity() {
        let base = spawn_directory().await;
        let directory = HttpDirectory::new(base, Duration::from_secs(5)).unwrap();

        let alice = directory.lookup_contact("A1B2C3D4").await.unwrap();
        assert_eq!(alice, Contact::new("A1B2C3D4", "Alice"));

        let bob = directory.lookup_contact("B2C3D4E5").await.unwrap();
        assert_eq!(bob, Contact::new("B2C3D4E5", "B2C3D4E5"));
    }

    #[tokio::test]
    async fn unknown_identity_is_a_lookup_error() {
        let base = spawn_directory().await;
        let directory = HttpDirectory::new(base, Duration::from_secs(5)).unwrap();

        let err = directory.lookup_contact("ZZZZZZZZ").await.unwrap_err();
        assert!(matches!(err, BotError::Lookup { .. }));
    }
}
