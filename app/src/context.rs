use crate::ai::{
    BackendGenerator, BackendProxyStrategy, DirectKeyStrategy, GeminiClient,
    LocalBackendStrategy, RemedyClient, RemedyStrategy,
};
use crate::auth::{bearer_token, Identity, IdentityProvider};
use crate::config::Config;
use crate::error::AuthError;
use crate::models::Datastore;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

/// Everything a request handler may touch, built once in `main`.
pub struct AppContext {
    pub(crate) config: Config,
    pub(crate) store: Datastore,
    pub(crate) identity: IdentityProvider,
    pub(crate) generator: Arc<BackendGenerator>,
    pub(crate) remedy_client: RemedyClient,
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish()
    }
}

impl AppContext {
    pub fn new(config: Config, store: Datastore) -> Arc<Self> {
        let http = reqwest::Client::new();
        let gemini = Arc::new(GeminiClient::new(http.clone(), config.gemini_api_base()));
        let generator = Arc::new(BackendGenerator::new(
            config.ai_backend_mode(),
            config.google_ai_api_key(),
            gemini.clone(),
        ));

        let backend: Box<dyn RemedyStrategy> = match config.ai_proxy_url() {
            Some(url) => Box::new(BackendProxyStrategy::new(http.clone(), url)),
            None => Box::new(LocalBackendStrategy::new(generator.clone())),
        };
        let remedy_client = RemedyClient::new(vec![
            backend,
            Box::new(DirectKeyStrategy::new(gemini, config.google_ai_api_key())),
        ]);
        info!(
            strategies = ?remedy_client.strategy_names(),
            mode = ?generator.mode(),
            "Remedy client ready"
        );

        let identity = IdentityProvider::from_config(&config, http);
        Arc::new(AppContext {
            config,
            store,
            identity,
            generator,
            remedy_client,
        })
    }

    /// Device requests must carry the configured secret. Without a
    /// configured secret nothing is accepted.
    pub fn verify_device_key(&self, key: Option<&str>) -> Result<(), AuthError> {
        match (self.config.esp32_api_key(), key) {
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(AuthError::InvalidApiKey),
        }
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let token = bearer_token(authorization)?;
        self.identity.verify(token).await
    }
}

#[cfg(test)]
pub(crate) fn test_context(vars: &[(&str, &str)]) -> Arc<AppContext> {
    use crate::models::MemoryStore;

    let mut all = vec![
        ("ESP32_API_KEY", "device-secret"),
        ("AUTH_STATIC_TOKENS", "grower-token:grower-uid,other-token:other-uid"),
    ];
    all.extend_from_slice(vars);
    let config = crate::config::test_config(&all);
    AppContext::new(config, Datastore::Memory(MemoryStore::default()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_device_key() {
        let context = test_context(&[]);
        assert!(context.verify_device_key(Some("device-secret")).is_ok());
        assert_eq!(
            context.verify_device_key(Some("wrong")),
            Err(AuthError::InvalidApiKey)
        );
        assert_eq!(context.verify_device_key(None), Err(AuthError::InvalidApiKey));
    }

    #[test]
    fn test_unconfigured_device_key_rejects_all() {
        let config = crate::config::test_config(&[]);
        let context = AppContext::new(
            config,
            Datastore::Memory(crate::models::MemoryStore::default()),
        );
        assert_eq!(context.verify_device_key(Some("")), Err(AuthError::InvalidApiKey));
        assert_eq!(
            context.verify_device_key(Some("anything")),
            Err(AuthError::InvalidApiKey)
        );
    }

    #[tokio::test]
    async fn test_authenticate() {
        let context = test_context(&[]);
        let identity = context
            .authenticate(Some("Bearer grower-token"))
            .await
            .unwrap();
        assert_eq!(identity.uid, "grower-uid");
        assert_eq!(
            context.authenticate(Some("Bearer nope")).await,
            Err(AuthError::InvalidToken)
        );
        assert_eq!(context.authenticate(None).await, Err(AuthError::MissingToken));
    }
}
