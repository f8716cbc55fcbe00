//! Ollama API client.
//!
//! Provides the main client interface for generating embeddings with Ollama.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{OllamaConfig, OllamaConfigBuilder};
use crate::errors::OllamaResult;
use crate::services::OllamaEmbeddingGenerator;
use crate::transport::HttpTransport;

/// The main Ollama client.
///
/// # Example
///
/// ```rust,no_run
/// use ollama_client::OllamaClient;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = OllamaClient::builder()
///         .endpoint("http://localhost:11434")
///         .default_model("all-minilm")
///         .build()?;
///
///     let result = client
///         .embeddings()
///         .embed(["first document", "second document"], None, &CancellationToken::new())
///         .await?;
///
///     for embedding in &result {
///         println!("{} dimensions", embedding.dimensions());
///     }
///     Ok(())
/// }
/// ```
pub struct OllamaClient {
    config: OllamaConfig,
    embeddings: OllamaEmbeddingGenerator,
}

impl OllamaClient {
    /// Creates a new client builder.
    pub fn builder() -> OllamaClientBuilder {
        OllamaClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// See [`OllamaConfig::from_env`] for the variables read.
    pub fn from_env() -> OllamaResult<Self> {
        let config = OllamaConfig::from_env()?;
        OllamaClientBuilder::from_config(config).build()
    }

    /// Returns the embedding generator.
    pub fn embeddings(&self) -> &OllamaEmbeddingGenerator {
        &self.embeddings
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the Ollama client.
pub struct OllamaClientBuilder {
    config_builder: OllamaConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl OllamaClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: OllamaConfigBuilder::new(),
            transport: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: OllamaConfig) -> Self {
        let mut config_builder = OllamaConfigBuilder::new()
            .endpoint(config.endpoint.as_str())
            .timeout(config.timeout);

        if let Some(model) = &config.default_model {
            config_builder = config_builder.default_model(model.as_str());
        }
        if let Some(api_key) = config.api_key() {
            config_builder = config_builder.api_key(api_key);
        }
        for (name, value) in &config.custom_headers {
            config_builder = config_builder.header(name.as_str(), value.as_str());
        }

        Self {
            config_builder,
            transport: None,
        }
    }

    /// Sets the server endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.endpoint(endpoint);
        self
    }

    /// Sets the model used when a call does not name one.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.default_model(model);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.timeout_secs(secs);
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Sets a caller-owned transport.
    ///
    /// The client keeps a shared reference and never tears it down.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    pub fn build(self) -> OllamaResult<OllamaClient> {
        let config = self.config_builder.build()?;

        let embeddings = match self.transport {
            Some(transport) => OllamaEmbeddingGenerator::with_transport(&config, transport)?,
            None => OllamaEmbeddingGenerator::new(&config)?,
        };

        Ok(OllamaClient { config, embeddings })
    }
}

impl Default for OllamaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
