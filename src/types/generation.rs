//! Provider-neutral embedding types.
//!
//! These are what callers see: per-call options going in, a batch of
//! [`Embedding`]s with usage and extras coming out.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Option key carrying the keep-alive hint, in seconds.
pub const KEEP_ALIVE_KEY: &str = "keep_alive";

/// Option key carrying the truncation flag.
pub const TRUNCATE_KEY: &str = "truncate";

/// Extras key for the total request duration.
pub const TOTAL_DURATION_KEY: &str = "total_duration";

/// Extras key for the model load duration.
pub const LOAD_DURATION_KEY: &str = "load_duration";

/// Open-ended extension values keyed by name.
pub type AdditionalProperties = BTreeMap<String, PropertyValue>;

/// A loosely typed extension value.
///
/// The conversion accessors are total: they return `None` when the value
/// cannot be read as the requested type instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Duration value.
    Duration(Duration),
}

impl PropertyValue {
    /// Reads the value as a signed integer.
    ///
    /// Floats convert only when integral and in range; text converts when it
    /// parses as an integer; booleans convert to `1` or `0`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            PropertyValue::Bool(value) => Some(i64::from(*value)),
            PropertyValue::Float(value)
                if value.fract() == 0.0
                    && *value >= i64::MIN as f64
                    && *value < i64::MAX as f64 =>
            {
                Some(*value as i64)
            }
            PropertyValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads the value as a boolean.
    ///
    /// Numbers convert as "non-zero is true"; text converts when it reads
    /// `true` or `false`, ignoring case and surrounding whitespace.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            PropertyValue::Integer(value) => Some(*value != 0),
            PropertyValue::Float(value) if !value.is_nan() => Some(*value != 0.0),
            PropertyValue::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Reads the value as a duration.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            PropertyValue::Duration(value) => Some(*value),
            _ => None,
        }
    }

    /// Reads the value as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(i64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<Duration> for PropertyValue {
    fn from(value: Duration) -> Self {
        PropertyValue::Duration(value)
    }
}

/// Per-call options for embedding generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingOptions {
    /// Model override for this call.
    pub model_id: Option<String>,
    /// Provider-specific extension values.
    pub additional_properties: AdditionalProperties,
}

impl EmbeddingOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model override.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Sets an extension value.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    /// The `keep_alive` extension, if present and readable as an integer.
    pub fn keep_alive(&self) -> Option<i64> {
        self.additional_properties
            .get(KEEP_ALIVE_KEY)
            .and_then(PropertyValue::as_i64)
    }

    /// The `truncate` extension, if present and readable as a boolean.
    pub fn truncate(&self) -> Option<bool> {
        self.additional_properties
            .get(TRUNCATE_KEY)
            .and_then(PropertyValue::as_bool)
    }
}

/// One embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The vector returned by the service.
    pub vector: Vec<f32>,
    /// When the vector was decoded locally.
    pub created_at: DateTime<Utc>,
    /// Model that produced the vector.
    pub model_id: String,
}

impl Embedding {
    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Token accounting for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDetails {
    /// Tokens consumed by the inputs.
    pub input_token_count: u64,
    /// Total tokens consumed.
    pub total_token_count: u64,
}

/// The embeddings of one batch, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedEmbeddings {
    /// One embedding per input.
    pub embeddings: Vec<Embedding>,
    /// Token usage, when the service reported it.
    pub usage: Option<UsageDetails>,
    /// Provider-specific metadata. `None` when the service reported none.
    pub additional_properties: Option<AdditionalProperties>,
}

impl GeneratedEmbeddings {
    /// Number of embeddings.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Iterates over the embeddings in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Embedding> {
        self.embeddings.iter()
    }
}

impl IntoIterator for GeneratedEmbeddings {
    type Item = Embedding;
    type IntoIter = std::vec::IntoIter<Embedding>;

    fn into_iter(self) -> Self::IntoIter {
        self.embeddings.into_iter()
    }
}

impl<'a> IntoIterator for &'a GeneratedEmbeddings {
    type Item = &'a Embedding;
    type IntoIter = std::slice::Iter<'a, Embedding>;

    fn into_iter(self) -> Self::IntoIter {
        self.embeddings.iter()
    }
}

/// Describes an embedding generator.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingGeneratorMetadata {
    /// Provider name.
    pub provider_name: String,
    /// Endpoint the generator talks to.
    pub endpoint: Url,
    /// Model used when a call does not name one.
    pub default_model: Option<String>,
}
