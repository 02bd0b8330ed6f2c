use super::gemini::GeminiClient;
use super::{RemedyFuture, RemedyRequest, RemedyStrategy, RemedyText};
use crate::config::AiBackendMode;
use crate::error::AiError;
use elacare_core::prompt::{demo_remedy, remedy_prompt, trend_prompt, DEMO_NOTE};
use elacare_core::{RemedyReading, TrendPoint};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const SOURCE_DEMO: &str = "backend-demo";
pub const SOURCE_GEMINI: &str = "backend-gemini";
pub const SOURCE_PROXY: &str = "backend-proxy";
pub const SOURCE_DIRECT: &str = "direct-api";
pub const DEMO_MODEL: &str = "demo-mode";

/// Server side remedy and trend generation.
#[derive(Debug)]
pub struct BackendGenerator {
    mode: AiBackendMode,
    server_key: Option<String>,
    gemini: Arc<GeminiClient>,
}

impl BackendGenerator {
    pub fn new(mode: AiBackendMode, server_key: Option<&str>, gemini: Arc<GeminiClient>) -> Self {
        BackendGenerator {
            mode,
            server_key: server_key.map(str::to_owned),
            gemini,
        }
    }

    pub fn mode(&self) -> AiBackendMode {
        self.mode
    }

    pub fn is_configured(&self) -> bool {
        self.server_key.is_some()
    }

    fn server_key(&self) -> Result<&str, AiError> {
        self.server_key.as_deref().ok_or(AiError::NotInitialized)
    }

    pub async fn generate(&self, reading: &RemedyReading) -> Result<RemedyText, AiError> {
        match self.mode {
            AiBackendMode::Demo => {
                debug!("Rendering demo remedy");
                Ok(RemedyText {
                    text: demo_remedy(reading),
                    model: DEMO_MODEL.to_owned(),
                    source: SOURCE_DEMO.to_owned(),
                    note: Some(DEMO_NOTE.to_owned()),
                })
            }
            AiBackendMode::Live => {
                let generation = self
                    .gemini
                    .generate(self.server_key()?, &remedy_prompt(reading))
                    .await?;
                Ok(RemedyText {
                    text: generation.text,
                    model: generation.model,
                    source: SOURCE_GEMINI.to_owned(),
                    note: None,
                })
            }
        }
    }

    pub async fn analyze_trend(&self, points: &[TrendPoint]) -> Result<String, AiError> {
        let key = self.server_key()?;
        let generation = self.gemini.generate(key, &trend_prompt(points)).await?;
        Ok(generation.text)
    }
}

/// Runs the generator in process.
pub struct LocalBackendStrategy {
    generator: Arc<BackendGenerator>,
}

impl LocalBackendStrategy {
    pub fn new(generator: Arc<BackendGenerator>) -> Self {
        LocalBackendStrategy { generator }
    }
}

impl RemedyStrategy for LocalBackendStrategy {
    fn name(&self) -> &'static str {
        "backend"
    }

    fn generate<'a>(&'a self, request: &'a RemedyRequest) -> RemedyFuture<'a> {
        Box::pin(self.generator.generate(&request.reading))
    }
}

/// Forwards the reading to a remote ElaCare backend.
pub struct BackendProxyStrategy {
    http: reqwest::Client,
    url: String,
}

impl BackendProxyStrategy {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        BackendProxyStrategy {
            http,
            url: format!(
                "{}/api/ai/generate-remedy",
                base_url.trim_end_matches('/')
            ),
        }
    }

    async fn forward(&self, reading: &RemedyReading) -> Result<RemedyText, AiError> {
        let resp = self.http.post(&self.url).json(reading).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Backend(format!("Backend error: {}", status.as_u16())));
        }

        let body: dto::ProxyResponse = resp.json().await?;
        if !body.success {
            return Err(AiError::Backend(
                body.error
                    .unwrap_or_else(|| "Backend generation failed".to_owned()),
            ));
        }
        Ok(RemedyText {
            text: body.remedy.unwrap_or_default(),
            model: body.model.unwrap_or_else(|| "unknown".to_owned()),
            source: SOURCE_PROXY.to_owned(),
            note: body.note,
        })
    }
}

impl RemedyStrategy for BackendProxyStrategy {
    fn name(&self) -> &'static str {
        SOURCE_PROXY
    }

    fn generate<'a>(&'a self, request: &'a RemedyRequest) -> RemedyFuture<'a> {
        Box::pin(self.forward(&request.reading))
    }
}

/// Calls Gemini with the caller's key, or the server key as fallback.
pub struct DirectKeyStrategy {
    gemini: Arc<GeminiClient>,
    server_key: Option<String>,
}

impl DirectKeyStrategy {
    pub fn new(gemini: Arc<GeminiClient>, server_key: Option<&str>) -> Self {
        DirectKeyStrategy {
            gemini,
            server_key: server_key.map(str::to_owned),
        }
    }

    async fn direct(&self, request: &RemedyRequest) -> Result<RemedyText, AiError> {
        let key = request
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .or(self.server_key.as_deref())
            .ok_or(AiError::MissingKey)?;
        let generation = self
            .gemini
            .generate(key, &remedy_prompt(&request.reading))
            .await?;
        Ok(RemedyText {
            text: generation.text,
            model: generation.model,
            source: SOURCE_DIRECT.to_owned(),
            note: None,
        })
    }
}

impl RemedyStrategy for DirectKeyStrategy {
    fn name(&self) -> &'static str {
        SOURCE_DIRECT
    }

    fn generate<'a>(&'a self, request: &'a RemedyRequest) -> RemedyFuture<'a> {
        Box::pin(self.direct(request))
    }
}

mod dto {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProxyResponse {
        pub success: bool,
        pub remedy: Option<String>,
        pub error: Option<String>,
        pub model: Option<String>,
        pub note: Option<String>,
    }
}
