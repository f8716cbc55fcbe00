//! Embedding generation over `/api/embed`.
//!
//! One call is one exchange: the batch is sent in a single POST and either
//! every input gets its vector back or the call fails. Nothing is retried.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use crate::auth::{AuthProvider, BearerAuth, NoAuth};
use crate::config::OllamaConfig;
use crate::errors::{ApiErrorResponse, OllamaError, OllamaResult};
use crate::observability::RequestTimer;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};
use crate::types::embeddings::{EmbedRequest, EmbedResponse};
use crate::types::generation::{
    AdditionalProperties, Embedding, EmbeddingGeneratorMetadata, EmbeddingOptions,
    GeneratedEmbeddings, PropertyValue, UsageDetails, LOAD_DURATION_KEY, TOTAL_DURATION_KEY,
};

/// Provider name reported in generator metadata.
pub const PROVIDER_NAME: &str = "ollama";

/// Generates embeddings for batches of strings.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Generates one embedding per input, in input order.
    ///
    /// Triggering `cancel` before the exchange completes fails the call with
    /// [`OllamaError::Cancelled`].
    async fn generate(
        &self,
        inputs: Vec<String>,
        options: Option<&EmbeddingOptions>,
        cancel: &CancellationToken,
    ) -> OllamaResult<GeneratedEmbeddings>;

    /// Describes this generator.
    fn metadata(&self) -> &EmbeddingGeneratorMetadata;
}

/// Who is responsible for the transport's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOwnership {
    /// Created by the generator; released when the generator is dropped.
    Owned,
    /// Supplied by the caller; the generator only holds a shared reference.
    Shared,
}

/// Embedding generator backed by an Ollama server.
pub struct OllamaEmbeddingGenerator {
    embed_url: Url,
    default_model: Option<String>,
    custom_headers: Vec<(String, String)>,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn HttpTransport>,
    ownership: TransportOwnership,
    metadata: EmbeddingGeneratorMetadata,
}

impl OllamaEmbeddingGenerator {
    /// Creates a generator with its own reqwest transport.
    pub fn new(config: &OllamaConfig) -> OllamaResult<Self> {
        let transport = HttpTransportImpl::new(config.timeout).map_err(|e| {
            OllamaError::invalid_configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Self::build(config, Arc::new(transport), TransportOwnership::Owned)
    }

    /// Creates a generator that sends through a caller-supplied transport.
    pub fn with_transport(
        config: &OllamaConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> OllamaResult<Self> {
        Self::build(config, transport, TransportOwnership::Shared)
    }

    fn build(
        config: &OllamaConfig,
        transport: Arc<dyn HttpTransport>,
        ownership: TransportOwnership,
    ) -> OllamaResult<Self> {
        if let Some(model) = &config.default_model {
            if model.trim().is_empty() {
                return Err(OllamaError::invalid_configuration(
                    "Default model cannot be empty or whitespace",
                ));
            }
        }

        let auth: Arc<dyn AuthProvider> = match config.api_key() {
            Some(key) => Arc::new(BearerAuth::from_string(key)),
            None => Arc::new(NoAuth),
        };
        auth.validate()?;

        Ok(Self {
            embed_url: config.embed_url()?,
            default_model: config.default_model.clone(),
            custom_headers: config.custom_headers.clone(),
            auth,
            transport,
            ownership,
            metadata: EmbeddingGeneratorMetadata {
                provider_name: PROVIDER_NAME.to_string(),
                endpoint: config.endpoint.clone(),
                default_model: config.default_model.clone(),
            },
        })
    }

    /// Returns who owns the transport.
    pub fn transport_ownership(&self) -> TransportOwnership {
        self.ownership
    }

    /// Collects `inputs` eagerly and generates their embeddings.
    pub async fn embed<I, S>(
        &self,
        inputs: I,
        options: Option<&EmbeddingOptions>,
        cancel: &CancellationToken,
    ) -> OllamaResult<GeneratedEmbeddings>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
        self.generate(inputs, options, cancel).await
    }

    /// Generates the embedding of a single string.
    pub async fn embed_one(
        &self,
        input: impl Into<String>,
        options: Option<&EmbeddingOptions>,
        cancel: &CancellationToken,
    ) -> OllamaResult<Embedding> {
        self.generate(vec![input.into()], options, cancel)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OllamaError::protocol("Ollama generated no embedding"))
    }

    /// Picks the model: per-call override, then the configured default, then empty.
    fn resolve_model(&self, options: Option<&EmbeddingOptions>) -> String {
        options
            .and_then(|o| o.model_id.clone())
            .or_else(|| self.default_model.clone())
            .unwrap_or_default()
    }

    fn build_request(
        model: String,
        inputs: Vec<String>,
        options: Option<&EmbeddingOptions>,
    ) -> EmbedRequest {
        let mut request = EmbedRequest::new(model, inputs);

        if let Some(options) = options {
            request.keep_alive = options.keep_alive();
            request.truncate = options.truncate();

            if !options.additional_properties.is_empty() {
                tracing::trace!(
                    keys = ?options.additional_properties.keys().collect::<Vec<_>>(),
                    keep_alive = ?request.keep_alive,
                    truncate = ?request.truncate,
                    "Extracted extension options"
                );
            }
        }

        request
    }

    fn build_http_request(&self, body: Vec<u8>) -> HttpRequest {
        let mut request = HttpRequest::post(self.embed_url.as_str())
            .with_header("Content-Type", "application/json")
            .with_body(body);

        for (name, value) in &self.custom_headers {
            request = request.with_header(name.as_str(), value.as_str());
        }

        self.auth.apply_auth(&mut request.headers);
        request
    }
}

#[async_trait]
impl EmbeddingGenerator for OllamaEmbeddingGenerator {
    #[instrument(
        skip(self, inputs, options, cancel),
        fields(batch_size = inputs.len(), model = tracing::field::Empty)
    )]
    async fn generate(
        &self,
        inputs: Vec<String>,
        options: Option<&EmbeddingOptions>,
        cancel: &CancellationToken,
    ) -> OllamaResult<GeneratedEmbeddings> {
        let timer = RequestTimer::start("embed");

        let model = self.resolve_model(options);
        tracing::Span::current().record("model", model.as_str());

        let request = Self::build_request(model, inputs, options);
        let body = serde_json::to_vec(&request).map_err(|e| OllamaError::Protocol {
            message: format!("Failed to encode request: {}", e),
            source: Some(e),
        })?;
        let http_request = self.build_http_request(body);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(elapsed_ms = timer.elapsed_ms(), "Embedding request cancelled");
                return Err(OllamaError::Cancelled);
            }
            result = self.transport.send(http_request) => result?,
        };

        let result = decode_response(&response)
            .and_then(|decoded| into_generated_embeddings(decoded, request.input.len(), &request.model));

        match &result {
            Ok(generated) => tracing::debug!(
                status = response.status,
                embeddings = generated.len(),
                elapsed_ms = timer.elapsed_ms(),
                "Embeddings generated"
            ),
            Err(error) => tracing::warn!(
                status = response.status,
                error = %error,
                elapsed_ms = timer.elapsed_ms(),
                "Embedding request failed"
            ),
        }

        result
    }

    fn metadata(&self) -> &EmbeddingGeneratorMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for OllamaEmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbeddingGenerator")
            .field("embed_url", &self.embed_url.as_str())
            .field("default_model", &self.default_model)
            .field("ownership", &self.ownership)
            .finish()
    }
}

/// Checks the status and decodes the body.
fn decode_response(response: &HttpResponse) -> OllamaResult<EmbedResponse> {
    if !response.is_success() {
        return Err(unsuccessful_response_error(response));
    }

    Ok(response.json()?)
}

fn unsuccessful_response_error(response: &HttpResponse) -> OllamaError {
    match serde_json::from_slice::<ApiErrorResponse>(&response.body) {
        Ok(body) if !body.error.is_empty() => OllamaError::Service {
            message: body.error,
            status: Some(response.status),
        },
        _ => OllamaError::Http {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        },
    }
}

/// Validates a decoded response and repackages it for the caller.
fn into_generated_embeddings(
    response: EmbedResponse,
    expected: usize,
    requested_model: &str,
) -> OllamaResult<GeneratedEmbeddings> {
    if let Some(error) = response.error.filter(|e| !e.is_empty()) {
        return Err(OllamaError::service(error));
    }

    let vectors = match response.embeddings {
        Some(vectors) if vectors.len() == expected => vectors,
        other => {
            return Err(OllamaError::protocol(format!(
                "Ollama generated {} embeddings but {} were expected",
                other.map_or(0, |v| v.len()),
                expected
            )));
        }
    };

    let model_id = response
        .model
        .unwrap_or_else(|| requested_model.to_string());

    let embeddings = vectors
        .into_iter()
        .map(|vector| Embedding {
            vector,
            created_at: Utc::now(),
            model_id: model_id.clone(),
        })
        .collect();

    let usage = response.prompt_eval_count.map(|count| UsageDetails {
        input_token_count: count,
        total_token_count: count,
    });

    let mut extras = AdditionalProperties::new();
    if let Some(nanos) = response.total_duration {
        extras.insert(
            TOTAL_DURATION_KEY.to_string(),
            PropertyValue::Duration(Duration::from_nanos(nanos)),
        );
    }
    if let Some(nanos) = response.load_duration {
        extras.insert(
            LOAD_DURATION_KEY.to_string(),
            PropertyValue::Duration(Duration::from_nanos(nanos)),
        );
    }

    Ok(GeneratedEmbeddings {
        embeddings,
        usage,
        additional_properties: (!extras.is_empty()).then_some(extras),
    })
}
