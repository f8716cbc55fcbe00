//! Type definitions for the Ollama client.

pub mod embeddings;
pub mod generation;

pub use embeddings::{EmbedRequest, EmbedResponse};
pub use generation::{
    AdditionalProperties, Embedding, EmbeddingGeneratorMetadata, EmbeddingOptions,
    GeneratedEmbeddings, PropertyValue, UsageDetails,
};
