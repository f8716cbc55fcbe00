//! Authentication for Ollama deployments.
//!
//! A local Ollama server needs no credentials. Deployments behind an
//! authenticating reverse proxy usually expect a bearer token, which
//! [`BearerAuth`] provides.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::errors::{OllamaError, OllamaResult};

/// Authentication provider trait.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);

    /// Validate the credentials.
    fn validate(&self) -> OllamaResult<()>;
}

/// No authentication. The default for a local server.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn apply_auth(&self, _headers: &mut HashMap<String, String>) {}

    fn validate(&self) -> OllamaResult<()> {
        Ok(())
    }
}

/// Bearer token authentication.
pub struct BearerAuth {
    token: SecretString,
}

impl BearerAuth {
    /// Creates a new bearer authentication provider.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Creates from a string token.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }

    /// Gets a hint of the token for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        let token = self.token.expose_secret();
        let count = token.chars().count();
        if count > 4 {
            let tail: String = token.chars().skip(count - 4).collect();
            format!("...{}", tail)
        } else {
            "****".to_string()
        }
    }
}

impl AuthProvider for BearerAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.expose_secret()),
        );
    }

    fn validate(&self) -> OllamaResult<()> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(OllamaError::invalid_configuration(
                "API key cannot be empty",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}
