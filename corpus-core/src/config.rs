//! API configuration
//!
//! Loaded once at start-up; shared read-only afterwards.

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API version, used to build the URL prefix (`/api/v1`).
    pub version: u32,
    /// Bearer token lifetime in days.
    pub bearer_lifetime_days: i64,
    /// Global "skeleton" API keys, valid for every content type.
    pub api_keys: Vec<String>,
    /// Path prefixes (relative to the API prefix) exempt from CSRF
    /// validation in addition to the login endpoint.
    pub csrf_exceptions: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: 1,
            bearer_lifetime_days: 14,
            api_keys: Vec::new(),
            csrf_exceptions: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            version: std::env::var("CORPUS_API_VERSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.version),
            bearer_lifetime_days: std::env::var("CORPUS_BEARER_LIFETIME_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bearer_lifetime_days),
            api_keys: std::env::var("CORPUS_API_KEYS")
                .map(|keys| {
                    keys.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            csrf_exceptions: Vec::new(),
        }
    }

    pub fn prefix(&self) -> String {
        format!("/api/v{}", self.version)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.push(key.into());
        self
    }

    pub fn with_csrf_exception(mut self, path: impl Into<String>) -> Self {
        self.csrf_exceptions.push(path.into());
        self
    }
}
