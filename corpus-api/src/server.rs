//! Corpus API server
//!
//! Binds the listener, spawns the token expiry sweep, and serves the app.

use crate::{create_app, state::AppState};
use corpus_core::{ApiConfig, ContentRegistry, CorpusResult, Error};
use corpus_store::BearerTokenStore;
use tokio::net::TcpListener;
use tracing::info;

/// Host/port pairing for the listener; the API behavior itself is
/// configured by `ApiConfig`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CORPUS_HOST").unwrap_or(defaults.host),
            port: std::env::var("CORPUS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct CorpusServer {
    config: ServerConfig,
    state: AppState,
}

impl CorpusServer {
    pub async fn new(
        config: ServerConfig,
        api: ApiConfig,
        registry: ContentRegistry,
    ) -> CorpusResult<Self> {
        let state = AppState::new(api, registry).await?;
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn start(self) -> CorpusResult<()> {
        let address = self.config.address();
        info!("starting corpus api server on http://{address}");

        BearerTokenStore::start_sweep(self.state.tokens.clone());

        let app = create_app(self.state.clone());
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| Error::internal(format!("bind {address}: {e}")))?;
        info!("listening on http://{address}");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::internal(format!("server error: {e}")))
    }
}

/// Builder for `CorpusServer`, mirroring how start-up scripts assemble
/// the registry and keys.
pub struct CorpusServerBuilder {
    config: ServerConfig,
    api: ApiConfig,
    registry: ContentRegistry,
}

impl CorpusServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            api: ApiConfig::default(),
            registry: ContentRegistry::new(),
        }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn api_config(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    pub fn registry(mut self, registry: ContentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub async fn build(self) -> CorpusResult<CorpusServer> {
        CorpusServer::new(self.config, self.api, self.registry).await
    }
}

impl Default for CorpusServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
