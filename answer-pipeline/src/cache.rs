use std::{collections::HashMap, sync::Arc};

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::knowledge_entry::KnowledgeEntry},
    utils::embedding::EmbeddingProvider,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Write-through, compute-once embedding cache over the knowledge table.
///
/// Embeddings are keyed by entry identity: two entries with identical text
/// are embedded independently. Concurrent pipeline runs are serialized per
/// entry through a lock map, and the persist itself is a conditional update,
/// so a missing vector is computed and billed at most once.
#[derive(Default)]
pub struct EmbeddingCache {
    fill_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills every entry that has content but no embedding, persisting each
    /// vector before moving on. Entries that already carry an embedding are
    /// untouched. Returns how many vectors were computed; a provider failure
    /// propagates immediately, leaving that entry unfilled so the next
    /// request retries it.
    pub async fn ensure_embeddings(
        &self,
        db: &SurrealDbClient,
        provider: &EmbeddingProvider,
        entries: &mut [KnowledgeEntry],
    ) -> Result<usize, AppError> {
        let mut computed = 0;

        for entry in entries.iter_mut() {
            if entry.embedding.is_some() || entry.content.trim().is_empty() {
                continue;
            }

            let lock = self.entry_lock(&entry.id).await;
            let _guard = lock.lock().await;

            // Another run may have filled this entry while we waited.
            let stored: Option<KnowledgeEntry> = db.get_item(&entry.id).await?;
            if let Some(embedding) = stored.and_then(|e| e.embedding) {
                entry.embedding = Some(embedding);
                continue;
            }

            let embedding = provider.embed(&entry.content).await?;
            match KnowledgeEntry::set_embedding_if_absent(&entry.id, embedding.clone(), db).await? {
                Some(updated) => {
                    entry.embedding = updated.embedding;
                    computed += 1;
                }
                None => {
                    // Lost a race against a run on another node; reuse theirs.
                    warn!(entry_id = %entry.id, "Embedding was filled concurrently");
                    let stored: Option<KnowledgeEntry> = db.get_item(&entry.id).await?;
                    entry.embedding = stored.and_then(|e| e.embedding).or(Some(embedding));
                }
            }
        }

        if computed > 0 {
            debug!(computed, "Filled missing corpus embeddings");
        }

        Ok(computed)
    }

    async fn entry_lock(&self, entry_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fill_locks.lock().await;
        locks
            .entry(entry_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn memory_db() -> SurrealDbClient {
        SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_fills_missing_embeddings_and_persists() {
        let db = memory_db().await;
        let provider = EmbeddingProvider::new_hashed(32);
        let cache = EmbeddingCache::new();

        let mut entries = vec![
            KnowledgeEntry::new("The sky is blue.".to_string()),
            KnowledgeEntry::new("Grass is green.".to_string()),
        ];
        for entry in &entries {
            db.store_item(entry.clone()).await.expect("Failed to store");
        }

        let computed = cache
            .ensure_embeddings(&db, &provider, &mut entries)
            .await
            .expect("Failed to fill embeddings");
        assert_eq!(computed, 2);
        assert!(entries.iter().all(|e| e.embedding.is_some()));

        // The fill is visible to later invocations
        let stored: Option<KnowledgeEntry> = db
            .get_item(&entries[0].id)
            .await
            .expect("Failed to fetch entry");
        assert!(stored.and_then(|e| e.embedding).is_some());
    }

    #[tokio::test]
    async fn test_second_pass_computes_nothing() {
        let db = memory_db().await;
        let provider = EmbeddingProvider::new_hashed(32);
        let cache = EmbeddingCache::new();

        let mut entries = vec![KnowledgeEntry::new("The sky is blue.".to_string())];
        db.store_item(entries[0].clone())
            .await
            .expect("Failed to store");

        let first = cache
            .ensure_embeddings(&db, &provider, &mut entries)
            .await
            .expect("Failed to fill embeddings");
        assert_eq!(first, 1);

        // Re-fetch from storage: the cached vector must be reused as-is
        let mut refetched = KnowledgeEntry::get_all(&db).await.expect("Failed to fetch");
        let second = cache
            .ensure_embeddings(&db, &provider, &mut refetched)
            .await
            .expect("Failed to fill embeddings");
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_blank_content_is_skipped() {
        let db = memory_db().await;
        let provider = EmbeddingProvider::new_hashed(32);
        let cache = EmbeddingCache::new();

        let mut entries = vec![KnowledgeEntry::new("   ".to_string())];
        db.store_item(entries[0].clone())
            .await
            .expect("Failed to store");

        let computed = cache
            .ensure_embeddings(&db, &provider, &mut entries)
            .await
            .expect("Failed to run cache fill");
        assert_eq!(computed, 0);
        assert!(entries[0].embedding.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_fill_of_same_entry_computes_once() {
        let db = Arc::new(memory_db().await);
        let provider = EmbeddingProvider::new_hashed(32);
        let cache = Arc::new(EmbeddingCache::new());

        let entry = KnowledgeEntry::new("The sky is blue.".to_string());
        db.store_item(entry.clone()).await.expect("Failed to store");

        let mut handles = Vec::new();
        for _ in 0..4 {
            let db = db.clone();
            let provider = provider.clone();
            let cache = cache.clone();
            let mut entries = vec![entry.clone()];
            handles.push(tokio::spawn(async move {
                cache
                    .ensure_embeddings(&db, &provider, &mut entries)
                    .await
                    .expect("Failed to fill embeddings")
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.expect("task panicked");
        }
        assert_eq!(total, 1, "only one run may pay for the upstream call");
    }
}
