//! Trait seams injected into the pipeline.
//!
//! Applications implement these to provide LLM, HTTP and vector storage
//! capabilities; the pipeline never constructs its own clients.

pub mod http;
pub mod llm;
pub mod store;
