//! Configuration module for the Ollama client.
//!
//! Provides the endpoint, default model, timeout, and optional credentials
//! shared by every embedding call made through one client.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::errors::{OllamaError, OllamaResult};

/// Default endpoint of a local Ollama server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Path of the batch embedding API, relative to the endpoint.
pub const EMBED_PATH: &str = "api/embed";

/// Default request timeout (10 minutes, model loads can be slow).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for the Ollama client.
#[derive(Clone)]
pub struct OllamaConfig {
    /// Service endpoint. The path always ends with `/`.
    pub endpoint: Url,
    /// Model used when a call does not name one.
    pub default_model: Option<String>,
    /// Request timeout applied by the default transport.
    pub timeout: Duration,
    /// Custom headers to include in requests.
    pub custom_headers: Vec<(String, String)>,
    /// Bearer token for deployments behind an authenticating proxy.
    pub(crate) api_key: Option<SecretString>,
}

impl OllamaConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OLLAMA_HOST` (optional): endpoint, `http://` is assumed when no scheme is given
    /// - `OLLAMA_EMBED_MODEL` (optional): default embedding model
    /// - `OLLAMA_TIMEOUT` (optional): request timeout in seconds
    /// - `OLLAMA_API_KEY` (optional): bearer token
    pub fn from_env() -> OllamaResult<Self> {
        let endpoint = match std::env::var("OLLAMA_HOST") {
            Ok(host) if !host.trim().is_empty() => host_to_endpoint(&host),
            _ => DEFAULT_ENDPOINT.to_string(),
        };

        let mut builder = OllamaConfigBuilder::new().endpoint(endpoint);

        if let Ok(model) = std::env::var("OLLAMA_EMBED_MODEL") {
            builder = builder.default_model(model);
        }

        if let Ok(timeout_str) = std::env::var("OLLAMA_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Ok(api_key) = std::env::var("OLLAMA_API_KEY") {
            builder = builder.api_key(api_key);
        }

        builder.build()
    }

    /// Returns the API key, if one is configured.
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }

    /// Returns the absolute URL of the embedding API.
    pub fn embed_url(&self) -> OllamaResult<Url> {
        Ok(self.endpoint.join(EMBED_PATH)?)
    }
}

impl std::fmt::Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Builder for `OllamaConfig`.
#[derive(Default)]
pub struct OllamaConfigBuilder {
    endpoint: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    custom_headers: Vec<(String, String)>,
    api_key: Option<String>,
}

impl OllamaConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the default model.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Adds a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the bearer token.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OllamaResult<OllamaConfig> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| OllamaError::invalid_configuration("Endpoint is required"))?;

        let endpoint = parse_endpoint(&endpoint)?;

        if let Some(model) = &self.default_model {
            if model.trim().is_empty() {
                return Err(OllamaError::invalid_configuration(
                    "Default model cannot be empty or whitespace",
                ));
            }
        }

        let api_key = match self.api_key {
            Some(key) if key.trim().is_empty() => {
                return Err(OllamaError::invalid_configuration(
                    "API key cannot be empty",
                ));
            }
            Some(key) => Some(SecretString::new(key)),
            None => None,
        };

        Ok(OllamaConfig {
            endpoint,
            default_model: self.default_model,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            custom_headers: self.custom_headers,
            api_key,
        })
    }
}

/// Turns an `OLLAMA_HOST` value into an endpoint; bare `host:port` means plain HTTP.
fn host_to_endpoint(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Parses an endpoint and normalizes its path to end with `/`, so relative
/// API paths resolve underneath it.
fn parse_endpoint(raw: &str) -> OllamaResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OllamaError::invalid_configuration("Endpoint cannot be empty"));
    }

    let mut url = Url::parse(raw)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(OllamaError::invalid_configuration(
            "Endpoint must start with http:// or https://",
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
