//! Ollama Embedding Client Library
//!
//! A Rust client that turns batches of strings into embedding vectors using
//! a local or remote Ollama server. Each call is one POST to `/api/embed`.
//!
//! # Features
//!
//! - **Batching**: One request per batch, vectors returned in input order
//! - **Cancellation**: Every call takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Extension Options**: `keep_alive` and `truncate` passed through when convertible
//! - **Usage and Timing**: Token counts and server-side durations surfaced on the result
//! - **Observability**: `tracing` spans on every call, optional subscriber setup
//! - **Async/Await**: Built on Tokio
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ollama_client::{EmbeddingOptions, OllamaClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OllamaClient::builder()
//!         .endpoint("http://localhost:11434")
//!         .default_model("all-minilm")
//!         .build()?;
//!
//!     let options = EmbeddingOptions::new()
//!         .with_property("keep_alive", 300)
//!         .with_property("truncate", true);
//!
//!     let result = client
//!         .embeddings()
//!         .embed(["hello", "world"], Some(&options), &CancellationToken::new())
//!         .await?;
//!
//!     println!("{} embeddings, usage {:?}", result.len(), result.usage);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{OllamaClient, OllamaClientBuilder};
pub use config::OllamaConfig;
pub use errors::{OllamaError, OllamaResult};
pub use services::{EmbeddingGenerator, OllamaEmbeddingGenerator, TransportOwnership};

// Type re-exports
pub use types::generation::{
    AdditionalProperties, Embedding, EmbeddingGeneratorMetadata, EmbeddingOptions,
    GeneratedEmbeddings, PropertyValue, UsageDetails, KEEP_ALIVE_KEY, LOAD_DURATION_KEY,
    TOTAL_DURATION_KEY, TRUNCATE_KEY,
};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
