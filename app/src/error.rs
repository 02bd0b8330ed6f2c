use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, std::string::String),
}

/// Failure kinds of the remedy generation chain.
/// The display strings are shown to the farmer verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("Please configure your Google Gemini API key in Settings or environment")]
    MissingKey,
    #[error("Invalid API Key. Please check your Gemini API key in Settings.")]
    InvalidKey,
    #[error("API quota exceeded. Please check your Google Cloud billing.")]
    QuotaExceeded,
    #[error("Permission denied. Please check API key permissions.")]
    PermissionDenied,
    #[error("Network error. Please check your internet connection.")]
    Network,
    #[error("No working Gemini model found. Please check your API key permissions.")]
    NoWorkingModel,
    #[error("Google AI not initialized. Add GOOGLE_AI_API_KEY to .env")]
    NotInitialized,
    #[error("Model {0} is not available")]
    ModelUnavailable(std::string::String),
    #[error("{0}")]
    Backend(std::string::String),
    #[error("{0}")]
    Upstream(std::string::String),
}

impl AiError {
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::MissingKey => "missing_key",
            AiError::InvalidKey => "invalid_key",
            AiError::QuotaExceeded => "quota_exceeded",
            AiError::PermissionDenied => "permission_denied",
            AiError::Network => "network",
            AiError::NoWorkingModel => "no_working_model",
            AiError::NotInitialized => "not_initialized",
            AiError::ModelUnavailable(_) => "model_unavailable",
            AiError::Backend(_) => "backend",
            AiError::Upstream(_) => "upstream",
        }
    }

    /// Failures no other model can fix.
    pub fn is_key_level(&self) -> bool {
        matches!(
            self,
            AiError::MissingKey
                | AiError::InvalidKey
                | AiError::QuotaExceeded
                | AiError::PermissionDenied
                | AiError::Network
        )
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AiError::Upstream(err.without_url().to_string())
        } else {
            AiError::Network
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid API Key")]
    InvalidApiKey,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(std::string::String),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("{0}")]
    NotFound(std::string::String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl ApiError {
    pub fn status(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Ai(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ai_error_messages() {
        assert_eq!(
            AiError::QuotaExceeded.to_string(),
            "API quota exceeded. Please check your Google Cloud billing."
        );
        assert_eq!(AiError::Upstream("boom".to_owned()).to_string(), "boom");
        assert_eq!(AiError::NoWorkingModel.kind(), "no_working_model");
    }

    #[test]
    fn test_key_level_errors() {
        assert!(AiError::InvalidKey.is_key_level());
        assert!(AiError::Network.is_key_level());
        assert!(!AiError::ModelUnavailable("gemini-pro".to_owned()).is_key_level());
        assert!(!AiError::Upstream("bad request".to_owned()).is_key_level());
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::Validation("x".to_owned()).status(), 400);
        assert_eq!(ApiError::from(AuthError::InvalidToken).status(), 401);
        assert_eq!(ApiError::NotFound("Farm not found".to_owned()).status(), 404);
        assert_eq!(ApiError::from(AiError::NotInitialized).status(), 500);
        assert_eq!(
            ApiError::from(AuthError::MissingToken).to_string(),
            "No token provided"
        );
    }
}
