use crate::error::AiError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const FALLBACK_MODELS: [&str; 5] = [
    "gemini-pro",
    "gemini-1.5-pro",
    "gemini-1.0-pro",
    "models/gemini-pro",
    "models/gemini-1.5-pro",
];

const MAX_CACHED_KEYS: usize = 64;

/// Generated text and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: String,
}

/// REST client for the Generative Language API.
///
/// Remembers the first model that answered for each key and tries it first
/// on the next call with that key.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    working_models: RwLock<HashMap<String, String>>,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        GeminiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            working_models: RwLock::new(HashMap::new()),
        }
    }

    pub fn working_model(&self, api_key: &str) -> Option<String> {
        self.working_models.read().get(api_key).cloned()
    }

    #[tracing::instrument(skip(self, api_key, prompt))]
    pub async fn generate(&self, api_key: &str, prompt: &str) -> Result<Generation, AiError> {
        if api_key.is_empty() {
            return Err(AiError::MissingKey);
        }

        let cached = self.working_model(api_key);

        let discovered = match cached {
            Some(_) => None,
            None => match self.list_models(api_key).await {
                Ok(models) => models.into_iter().next(),
                Err(err) => {
                    debug!("Model discovery failed: {}", err);
                    None
                }
            },
        };

        for model in candidate_models(cached, discovered) {
            match self.generate_content(api_key, &model, prompt).await {
                Ok(text) => {
                    info!(model = model.as_str(), "Gemini model answered");
                    self.remember(api_key, &model);
                    return Ok(Generation { text, model });
                }
                Err(err) if err.is_key_level() => {
                    self.working_models.write().remove(api_key);
                    warn!(model = model.as_str(), kind = err.kind(), "Gemini rejected the key");
                    return Err(err);
                }
                Err(err) => {
                    warn!(model = model.as_str(), "Gemini model failed: {}", err);
                }
            }
        }
        Err(AiError::NoWorkingModel)
    }

    fn remember(&self, api_key: &str, model: &str) {
        let mut working_models = self.working_models.write();
        if working_models.len() >= MAX_CACHED_KEYS && !working_models.contains_key(api_key) {
            debug!("Model cache full, dropping remembered models");
            working_models.clear();
        }
        working_models.insert(api_key.to_owned(), model.to_owned());
    }

    /// Names of models supporting `generateContent`, without the `models/` prefix.
    pub async fn list_models(&self, api_key: &str) -> Result<Vec<String>, AiError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let resp = self
            .http
            .get(url)
            .query(&[("key", api_key)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body, None));
        }

        let listing: dto::ModelList = resp.json().await?;
        Ok(listing
            .models
            .into_iter()
            .filter(|model| {
                model
                    .supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|model| strip_prefix(&model.name).to_owned())
            .collect())
    }

    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, AiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = dto::GenerateRequest {
            contents: vec![dto::Content {
                parts: vec![dto::Part {
                    text: prompt.to_owned(),
                }],
            }],
        };

        let resp = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body, Some(model)));
        }

        let generated: dto::GenerateResponse = resp.json().await?;
        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(AiError::Upstream(format!("Empty response from {}", model)));
        }
        Ok(text)
    }
}

fn strip_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

/// Cached model, then the discovered one, then the fixed list. No duplicates.
fn candidate_models(cached: Option<String>, discovered: Option<String>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let all = cached
        .into_iter()
        .chain(discovered)
        .chain(FALLBACK_MODELS.iter().map(|m| m.to_string()));
    for model in all {
        let model = strip_prefix(&model).to_owned();
        if !candidates.contains(&model) {
            candidates.push(model);
        }
    }
    candidates
}

fn classify_failure(status: u16, body: &str, model: Option<&str>) -> AiError {
    if body.contains("API_KEY_INVALID") {
        return AiError::InvalidKey;
    }
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") || body.contains("QUOTA_EXCEEDED") {
        return AiError::QuotaExceeded;
    }
    if status == 403 || body.contains("PERMISSION_DENIED") {
        return AiError::PermissionDenied;
    }
    if let (404, Some(model)) = (status, model) {
        return AiError::ModelUnavailable(model.to_owned());
    }

    let message = serde_json::from_str::<dto::ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("Gemini API error: {}", status));
    AiError::Upstream(message)
}

mod dto {
    use super::*;

    #[derive(Debug, Serialize)]
    pub struct GenerateRequest {
        pub contents: Vec<Content>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Content {
        #[serde(default)]
        pub parts: Vec<Part>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Part {
        #[serde(default)]
        pub text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct GenerateResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Candidate {
        pub content: Option<Content>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ModelList {
        #[serde(default)]
        pub models: Vec<Model>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        pub name: String,
        #[serde(default)]
        pub supported_generation_methods: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorEnvelope {
        pub error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub message: Option<String>,
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use warp::http::StatusCode;
    use warp::Filter;

    /// Fake Generative Language API.
    ///
    /// Lists `listed` as available. Only `working` answers, `bad-key` is
    /// rejected as an invalid key and `quota-key` as exhausted.
    pub(crate) struct FakeGemini {
        pub base_url: String,
        pub generate_calls: Arc<AtomicUsize>,
        pub list_calls: Arc<AtomicUsize>,
        pub last_key: Arc<parking_lot::Mutex<String>>,
    }

    pub(crate) fn fake_gemini(listed: &'static [&'static str], working: &'static str) -> FakeGemini {
        let generate_calls = Arc::new(AtomicUsize::new(0));
        let calls = generate_calls.clone();
        let list_calls = Arc::new(AtomicUsize::new(0));
        let listings = list_calls.clone();
        let last_key = Arc::new(parking_lot::Mutex::new(String::new()));
        let seen_key = last_key.clone();

        let list = warp::get()
            .and(warp::path!("v1beta" / "models"))
            .map(move || {
                listings.fetch_add(1, Ordering::SeqCst);
                let models: Vec<serde_json::Value> = listed
                    .iter()
                    .map(|name| {
                        serde_json::json!({
                            "name": format!("models/{}", name),
                            "supportedGenerationMethods": ["generateContent"]
                        })
                    })
                    .collect();
                warp::reply::json(&serde_json::json!({ "models": models }))
            });

        let generate = warp::post()
            .and(warp::path!("v1beta" / "models" / String))
            .and(warp::query::<std::collections::HashMap<String, String>>())
            .map(move |target: String, query: std::collections::HashMap<String, String>| {
                calls.fetch_add(1, Ordering::SeqCst);
                let key = query.get("key").cloned().unwrap_or_default();
                *seen_key.lock() = key.clone();
                let model = target.trim_end_matches(":generateContent").to_owned();
                let (status, body) = if key == "bad-key" {
                    (
                        StatusCode::BAD_REQUEST,
                        serde_json::json!({"error": {"message": "API key not valid", "details": [{"reason": "API_KEY_INVALID"}]}}),
                    )
                } else if key == "quota-key" {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        serde_json::json!({"error": {"message": "Quota", "status": "RESOURCE_EXHAUSTED"}}),
                    )
                } else if model == working {
                    (
                        StatusCode::OK,
                        serde_json::json!({"candidates": [{"content": {"parts": [{"text": format!("advice from {}", model)}]}}]}),
                    )
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        serde_json::json!({"error": {"message": "model not found"}}),
                    )
                };
                warp::reply::with_status(warp::reply::json(&body), status)
            });

        let (addr, server) = warp::serve(list.or(generate)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        FakeGemini {
            base_url: format!("http://{}", addr),
            generate_calls,
            list_calls,
            last_key,
        }
    }

    #[test]
    fn test_candidate_models() {
        assert_eq!(
            candidate_models(None, None),
            vec!["gemini-pro", "gemini-1.5-pro", "gemini-1.0-pro"]
        );
        assert_eq!(
            candidate_models(Some("gemini-1.5-pro".to_owned()), Some("models/gemini-2".to_owned())),
            vec!["gemini-1.5-pro", "gemini-2", "gemini-pro", "gemini-1.0-pro"]
        );
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure(400, r#"{"reason":"API_KEY_INVALID"}"#, Some("m")),
            AiError::InvalidKey
        );
        assert_eq!(classify_failure(429, "", Some("m")), AiError::QuotaExceeded);
        assert_eq!(classify_failure(403, "", Some("m")), AiError::PermissionDenied);
        assert_eq!(
            classify_failure(404, "", Some("m")),
            AiError::ModelUnavailable("m".to_owned())
        );
        assert_eq!(
            classify_failure(500, r#"{"error":{"message":"internal"}}"#, Some("m")),
            AiError::Upstream("internal".to_owned())
        );
    }

    #[tokio::test]
    async fn test_discovered_model_is_cached() {
        // Prepare
        let fake = fake_gemini(&["gemini-1.5-flash"], "gemini-1.5-flash");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        // Execute
        let first = client.generate("good-key", "prompt").await.unwrap();

        // Validate
        assert_eq!(first.model, "gemini-1.5-flash");
        assert_eq!(first.text, "advice from gemini-1.5-flash");
        assert_eq!(
            client.working_model("good-key").as_deref(),
            Some("gemini-1.5-flash")
        );
        assert_eq!(client.working_model("other-key"), None);
    }

    #[tokio::test]
    async fn test_falls_through_model_list() {
        let fake = fake_gemini(&[], "gemini-1.0-pro");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        let generation = client.generate("good-key", "prompt").await.unwrap();

        assert_eq!(generation.model, "gemini-1.0-pro");
        assert_eq!(fake.generate_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_key_level_failure_stops_loop() {
        let fake = fake_gemini(&[], "gemini-pro");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        let invalid = client.generate("bad-key", "prompt").await;
        assert_eq!(invalid, Err(AiError::InvalidKey));
        assert_eq!(fake.generate_calls.load(Ordering::SeqCst), 1);

        let quota = client.generate("quota-key", "prompt").await;
        assert_eq!(quota, Err(AiError::QuotaExceeded));
        assert_eq!(fake.generate_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_working_model() {
        let fake = fake_gemini(&[], "unknown-model");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        let res = client.generate("good-key", "prompt").await;

        assert_eq!(res, Err(AiError::NoWorkingModel));
        assert_eq!(client.working_model("good-key"), None);
    }

    #[tokio::test]
    async fn test_models_are_remembered_per_key() {
        // Prepare
        let fake = fake_gemini(&["gemini-pro"], "gemini-pro");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        // Execute
        for key in ["key-a", "key-b", "key-a", "key-b"] {
            client.generate(key, "prompt").await.unwrap();
        }

        // Validate
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.working_model("key-a").as_deref(), Some("gemini-pro"));
        assert_eq!(client.working_model("key-b").as_deref(), Some("gemini-pro"));

        let _ = client.generate("bad-key", "prompt").await;
        assert_eq!(client.working_model("key-a").as_deref(), Some("gemini-pro"));
        assert_eq!(client.working_model("bad-key"), None);
    }

    #[tokio::test]
    async fn test_key_is_query_encoded() {
        let fake = fake_gemini(&["gemini-pro"], "gemini-pro");
        let client = GeminiClient::new(reqwest::Client::new(), &fake.base_url);

        client.generate("a&b=c d+e", "prompt").await.unwrap();

        assert_eq!(*fake.last_key.lock(), "a&b=c d+e");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = GeminiClient::new(reqwest::Client::new(), "http://127.0.0.1:1");
        assert_eq!(client.generate("", "prompt").await, Err(AiError::MissingKey));
    }
}
