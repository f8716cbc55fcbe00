//! Service implementations for the Ollama API.

mod embeddings;

pub use embeddings::{
    EmbeddingGenerator, OllamaEmbeddingGenerator, TransportOwnership, PROVIDER_NAME,
};
