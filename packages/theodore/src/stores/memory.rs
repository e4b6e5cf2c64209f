//! In-memory vector store for testing and development.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::store::{cosine_similarity, VectorMatch, VectorStore};

struct Entry {
    vector: Vec<f32>,
    metadata: Map<String, Value>,
}

/// Vectors and metadata held in memory, searched by cosine similarity.
///
/// Not suitable for production as data is lost on restart.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<IndexMap<String, Entry>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata stored under `id`.
    pub fn metadata(&self, id: &str) -> Option<Map<String, Value>> {
        self.entries
            .read()
            .unwrap()
            .get(id)
            .map(|e| e.metadata.clone())
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Map<String, Value>) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(id.to_string(), Entry { vector, metadata });
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let entries = self.entries.read().unwrap();

        let mut matches: Vec<VectorMatch> = entries
            .iter()
            .map(|(id, entry)| VectorMatch {
                id: id.clone(),
                score: cosine_similarity(vector, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(name: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("company_name".into(), json!(name));
        m
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryVectorStore::new();
        store.upsert("a", vec![1.0, 0.0], meta("Acme")).await.unwrap();
        store.upsert("a", vec![0.0, 1.0], meta("Acme Corp")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.metadata("a").unwrap()["company_name"], json!("Acme Corp"));
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let store = MemoryVectorStore::new();
        store.upsert("x", vec![1.0, 0.0], meta("X")).await.unwrap();
        store.upsert("y", vec![0.0, 1.0], meta("Y")).await.unwrap();
        store.upsert("xy", vec![1.0, 1.0], meta("XY")).await.unwrap();

        let matches = store.query(&[1.0, 0.1], 2).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "x");
        assert_eq!(matches[1].id, "xy");
        assert!(matches[0].score > matches[1].score);
    }
}
