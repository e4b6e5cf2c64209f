//! Embedding and storing finished company records.

use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

use crate::crawlers::links::site_host;
use crate::error::Result;
use crate::traits::store::{Embedder, VectorStore};
use crate::types::record::CompanyRecord;

/// Stable vector id for a company, derived from its website host.
///
/// Re-researching the same site overwrites the earlier vector.
pub fn record_id(record: &CompanyRecord) -> String {
    let key = Url::parse(&record.website)
        .ok()
        .and_then(|u| site_host(&u))
        .unwrap_or_else(|| record.website.trim().to_lowercase());

    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    format!("company-{}", hex)
}

/// Embed a record and upsert it with its fields as metadata.
///
/// Returns the vector id.
pub async fn index_record<E, S>(record: &CompanyRecord, embedder: &E, store: &S) -> Result<String>
where
    E: Embedder + ?Sized,
    S: VectorStore + ?Sized,
{
    let id = record_id(record);
    let vector = embedder.embed(&record.embedding_text()).await?;
    let dimensions = vector.len();

    store.upsert(&id, vector, record.metadata()).await?;

    info!(
        id = %id,
        company = %record.company_name,
        dimensions,
        populated = record.populated_count(),
        "Record indexed"
    );
    Ok(id)
}
