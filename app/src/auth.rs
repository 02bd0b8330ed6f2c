use crate::config::Config;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// Resolves bearer tokens to identities.
#[derive(Debug)]
pub enum IdentityProvider {
    Firebase(FirebaseIdentity),
    Static(HashMap<String, String>),
}

impl IdentityProvider {
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        match config.firebase_web_api_key() {
            Some(api_key) => IdentityProvider::Firebase(FirebaseIdentity {
                client,
                api_key: api_key.to_owned(),
                base_url: config.firebase_auth_base().trim_end_matches('/').to_owned(),
            }),
            None => {
                if config.static_tokens().is_empty() {
                    warn!("No identity provider configured, every bearer token is rejected");
                }
                IdentityProvider::Static(config.static_tokens().clone())
            }
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        match self {
            IdentityProvider::Firebase(firebase) => firebase.lookup(token).await,
            IdentityProvider::Static(tokens) => tokens
                .get(token)
                .map(|uid| Identity {
                    uid: uid.clone(),
                    email: None,
                })
                .ok_or(AuthError::InvalidToken),
        }
    }
}

/// Identity Toolkit `accounts:lookup` client.
#[derive(Debug)]
pub struct FirebaseIdentity {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseIdentity {
    async fn lookup(&self, token: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/v1/accounts:lookup", self.base_url);
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&dto::LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|err| {
                warn!("Token lookup failed: {}", err.without_url());
                AuthError::InvalidToken
            })?;

        if !resp.status().is_success() {
            debug!(status = resp.status().as_u16(), "Token rejected");
            return Err(AuthError::InvalidToken);
        }

        let body: dto::LookupResponse = resp.json().await.map_err(|err| {
            warn!("Malformed lookup response: {}", err.without_url());
            AuthError::InvalidToken
        })?;
        body.users
            .into_iter()
            .next()
            .map(|user| Identity {
                uid: user.local_id,
                email: user.email,
            })
            .ok_or(AuthError::InvalidToken)
    }
}

/// Extracts the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    if token.is_empty() {
        Err(AuthError::MissingToken)
    } else {
        Ok(token)
    }
}

mod dto {
    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LookupRequest<'a> {
        pub id_token: &'a str,
    }

    #[derive(Debug, Deserialize)]
    pub struct LookupResponse {
        #[serde(default)]
        pub users: Vec<LookupUser>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LookupUser {
        pub local_id: String,
        pub email: Option<String>,
    }
}
