use crate::error::ConfigError;
use std::collections::HashMap;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_FIREBASE_BASE: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackendMode {
    Demo,
    Live,
}

impl FromStr for AiBackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(AiBackendMode::Demo),
            "live" => Ok(AiBackendMode::Live),
            other => Err(ConfigError::Invalid("AI_BACKEND_MODE", other.to_owned())),
        }
    }
}

/// Process configuration, collected once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    port: u16,
    bind_addr: String,
    database_url: Option<String>,
    esp32_api_key: Option<String>,
    google_ai_api_key: Option<String>,
    gemini_api_base: String,
    ai_backend_mode: AiBackendMode,
    ai_proxy_url: Option<String>,
    firebase_web_api_key: Option<String>,
    firebase_auth_base: String,
    static_tokens: HashMap<String, String>,
    otel_stdout: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", port.clone()))?,
            None => DEFAULT_PORT,
        };
        let ai_backend_mode = match var("AI_BACKEND_MODE") {
            Some(mode) => mode.parse()?,
            None => AiBackendMode::Demo,
        };
        let static_tokens = match var("AUTH_STATIC_TOKENS") {
            Some(tokens) => parse_static_tokens(&tokens)?,
            None => HashMap::new(),
        };
        let otel_stdout = match var("OTEL_STDOUT") {
            Some(flag) => flag
                .parse()
                .map_err(|_| ConfigError::Invalid("OTEL_STDOUT", flag.clone()))?,
            None => false,
        };

        Ok(Config {
            port,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            database_url: var("DATABASE_URL"),
            esp32_api_key: var("ESP32_API_KEY"),
            google_ai_api_key: var("GOOGLE_AI_API_KEY"),
            gemini_api_base: var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_owned()),
            ai_backend_mode,
            ai_proxy_url: var("AI_PROXY_URL"),
            firebase_web_api_key: var("FIREBASE_WEB_API_KEY"),
            firebase_auth_base: var("FIREBASE_AUTH_BASE")
                .unwrap_or_else(|| DEFAULT_FIREBASE_BASE.to_owned()),
            static_tokens,
            otel_stdout,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_addr(), self.port());
        addr.parse()
            .map_err(|_| ConfigError::Invalid("BIND_ADDR", self.bind_addr.clone()))
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn esp32_api_key(&self) -> Option<&str> {
        self.esp32_api_key.as_deref()
    }

    pub fn google_ai_api_key(&self) -> Option<&str> {
        self.google_ai_api_key.as_deref()
    }

    pub fn gemini_api_base(&self) -> &str {
        &self.gemini_api_base
    }

    pub fn ai_backend_mode(&self) -> AiBackendMode {
        self.ai_backend_mode
    }

    pub fn ai_proxy_url(&self) -> Option<&str> {
        self.ai_proxy_url.as_deref()
    }

    pub fn firebase_web_api_key(&self) -> Option<&str> {
        self.firebase_web_api_key.as_deref()
    }

    pub fn firebase_auth_base(&self) -> &str {
        &self.firebase_auth_base
    }

    pub fn static_tokens(&self) -> &HashMap<String, String> {
        &self.static_tokens
    }

    pub fn otel_stdout(&self) -> bool {
        self.otel_stdout
    }
}

/// `token:uid,token:uid`
fn parse_static_tokens(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((token, uid)) if !token.is_empty() && !uid.is_empty() => {
                Ok((token.trim().to_owned(), uid.trim().to_owned()))
            }
            _ => Err(ConfigError::Invalid("AUTH_STATIC_TOKENS", entry.to_owned())),
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = test_config(&[]);
        assert_eq!(config.port(), 3001);
        assert_eq!(config.bind_addr(), "0.0.0.0");
        assert_eq!(config.database_url(), None);
        assert_eq!(config.esp32_api_key(), None);
        assert_eq!(config.ai_backend_mode(), AiBackendMode::Demo);
        assert_eq!(config.gemini_api_base(), DEFAULT_GEMINI_BASE);
        assert!(!config.otel_stdout());
        assert_eq!(
            config.socket_addr().unwrap(),
            "0.0.0.0:3001".parse().unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let config = test_config(&[
            ("PORT", "8080"),
            ("ESP32_API_KEY", "device-secret"),
            ("AI_BACKEND_MODE", "LIVE"),
            ("AUTH_STATIC_TOKENS", "tok-a:uid-a, tok-b:uid-b"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.port(), 8080);
        assert_eq!(config.esp32_api_key(), Some("device-secret"));
        assert_eq!(config.ai_backend_mode(), AiBackendMode::Live);
        assert_eq!(config.database_url(), None);
        assert_eq!(
            config.static_tokens().get("tok-b").map(String::as_str),
            Some("uid-b")
        );
    }

    #[test]
    fn test_invalid_values() {
        let port = Config::from_lookup(|key| (key == "PORT").then(|| "eighty".to_owned()));
        assert!(matches!(port, Err(ConfigError::Invalid("PORT", _))));

        let mode = Config::from_lookup(|key| (key == "AI_BACKEND_MODE").then(|| "x".to_owned()));
        assert!(mode.is_err());

        let tokens =
            Config::from_lookup(|key| (key == "AUTH_STATIC_TOKENS").then(|| "broken".to_owned()));
        assert!(tokens.is_err());
    }
}
