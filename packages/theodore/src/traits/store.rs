//! Embedding and vector store traits.
//!
//! The pipeline hands finished records to these seams; concrete stores
//! (Pinecone, pgvector, ...) live with the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// One similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,

    /// Cosine similarity (-1.0 to 1.0)
    pub score: f32,

    pub metadata: Map<String, Value>,
}

/// Key-value store with similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector stored under `id`.
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Map<String, Value>) -> Result<()>;

    /// Return the `top_k` closest vectors, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;
}

/// Text embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
