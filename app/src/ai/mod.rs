use crate::error::AiError;
use chrono::{DateTime, Utc};
use elacare_core::RemedyReading;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};
use utoipa::ToSchema;

pub mod backend;
pub mod gemini;

pub use backend::{BackendGenerator, BackendProxyStrategy, DirectKeyStrategy, LocalBackendStrategy};
pub use gemini::GeminiClient;

pub type RemedyFuture<'a> = Pin<Box<dyn Future<Output = Result<RemedyText, AiError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RemedyRequest {
    pub reading: RemedyReading,
    /// User supplied Gemini key, preferred over the server key.
    pub api_key: Option<String>,
}

/// Successful output of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RemedyText {
    pub text: String,
    pub model: String,
    pub source: String,
    pub note: Option<String>,
}

/// One way of obtaining remedy prose.
pub trait RemedyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate<'a>(&'a self, request: &'a RemedyRequest) -> RemedyFuture<'a>;
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemedyResult {
    pub success: bool,
    pub remedy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

/// Runs its strategies in order until one succeeds.
pub struct RemedyClient {
    strategies: Vec<Box<dyn RemedyStrategy>>,
}

impl RemedyClient {
    pub fn new(strategies: Vec<Box<dyn RemedyStrategy>>) -> Self {
        RemedyClient { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[tracing::instrument(skip(self, request), fields(nitrogen = request.reading.nitrogen, ph = request.reading.ph, boron = request.reading.boron))]
    pub async fn generate_remedy(&self, request: &RemedyRequest) -> RemedyResult {
        let mut last_error = AiError::MissingKey;
        for strategy in self.strategies.iter() {
            match strategy.generate(request).await {
                Ok(text) => {
                    info!(strategy = strategy.name(), model = text.model.as_str(), "Remedy generated");
                    return RemedyResult {
                        success: true,
                        remedy: text.text,
                        error: None,
                        error_kind: None,
                        model: Some(text.model),
                        note: text.note,
                        source: text.source,
                        timestamp: Utc::now(),
                    };
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), kind = err.kind(), "Remedy strategy failed: {}", err);
                    last_error = err;
                }
            }
        }

        let message = last_error.to_string();
        RemedyResult {
            success: false,
            remedy: format!("Unable to generate recommendations: {}", message),
            error: Some(message),
            error_kind: Some(last_error.kind().to_owned()),
            model: None,
            note: None,
            source: "none".to_owned(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        outcome: Result<RemedyText, AiError>,
        calls: Arc<AtomicUsize>,
    }

    impl RemedyStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn generate<'a>(&'a self, _request: &'a RemedyRequest) -> RemedyFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.clone();
            Box::pin(async move { outcome })
        }
    }

    fn text(source: &str) -> RemedyText {
        RemedyText {
            text: format!("remedy from {}", source),
            model: "gemini-pro".to_owned(),
            source: source.to_owned(),
            note: None,
        }
    }

    fn request() -> RemedyRequest {
        RemedyRequest {
            reading: RemedyReading {
                nitrogen: 30.0,
                ph: 6.2,
                boron: 1.2,
            },
            api_key: None,
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = RemedyClient::new(vec![
            Box::new(Scripted {
                name: "first",
                outcome: Ok(text("first")),
                calls: calls.clone(),
            }),
            Box::new(Scripted {
                name: "second",
                outcome: Ok(text("second")),
                calls: calls.clone(),
            }),
        ]);

        let result = client.generate_remedy(&request()).await;

        assert!(result.success);
        assert_eq!(result.source, "first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let client = RemedyClient::new(vec![
            Box::new(Scripted {
                name: "first",
                outcome: Err(AiError::Backend("Backend error: 500".to_owned())),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Scripted {
                name: "second",
                outcome: Ok(text("second")),
                calls: second_calls.clone(),
            }),
        ]);

        let result = client.generate_remedy(&request()).await;

        assert!(result.success);
        assert_eq!(result.remedy, "remedy from second");
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_total_failure_surfaces_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = RemedyClient::new(vec![
            Box::new(Scripted {
                name: "first",
                outcome: Err(AiError::Backend("Backend error: 502".to_owned())),
                calls: calls.clone(),
            }),
            Box::new(Scripted {
                name: "second",
                outcome: Err(AiError::QuotaExceeded),
                calls: calls.clone(),
            }),
        ]);

        let result = client.generate_remedy(&request()).await;

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("API quota exceeded. Please check your Google Cloud billing.")
        );
        assert_eq!(
            result.remedy,
            "Unable to generate recommendations: API quota exceeded. Please check your Google Cloud billing."
        );
        assert_eq!(result.error_kind.as_deref(), Some("quota_exceeded"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
