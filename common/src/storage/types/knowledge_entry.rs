use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(KnowledgeEntry, "knowledge_entry", {
    content: String,
    embedding: Option<Vec<f32>>
});

impl KnowledgeEntry {
    pub fn new(content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            content,
            embedding: None,
        }
    }

    /// All corpus entries, in creation order. The corpus is assumed small
    /// enough for a full scan per query.
    pub async fn get_all(db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        let entries: Vec<Self> = db
            .client
            .query("SELECT * FROM type::table($table_name) ORDER BY created_at ASC")
            .bind(("table_name", Self::table_name()))
            .await?
            .take(0)?;

        Ok(entries)
    }

    /// Persists a freshly computed embedding, but only if the stored row
    /// still has none. Returns the row after the update, or `None` when a
    /// concurrent run already filled it.
    pub async fn set_embedding_if_absent(
        id: &str,
        embedding: Vec<f32>,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table_name, $id)
                 SET embedding = $embedding, updated_at = time::now()
                 WHERE embedding IS NONE
                 RETURN AFTER",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("id", id.to_string()))
            .bind(("embedding", embedding))
            .await?
            .take(0)?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_starts_without_embedding() {
        let entry = KnowledgeEntry::new("The sky is blue.".to_string());

        assert_eq!(entry.content, "The sky is blue.");
        assert!(entry.embedding.is_none());
        assert!(!entry.id.is_empty());
    }

    #[tokio::test]
    async fn test_set_embedding_if_absent_fills_once() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let entry = KnowledgeEntry::new("Grass is green.".to_string());
        let entry_id = entry.id.clone();
        db.store_item(entry).await.expect("Failed to store entry");

        // First fill succeeds
        let updated = KnowledgeEntry::set_embedding_if_absent(&entry_id, vec![0.1, 0.2], &db)
            .await
            .expect("Failed to set embedding");
        assert_eq!(updated.and_then(|e| e.embedding), Some(vec![0.1, 0.2]));

        // Second fill is a no-op and leaves the stored vector alone
        let second = KnowledgeEntry::set_embedding_if_absent(&entry_id, vec![0.9, 0.9], &db)
            .await
            .expect("Failed to run conditional update");
        assert!(second.is_none());

        let stored: Option<KnowledgeEntry> =
            db.get_item(&entry_id).await.expect("Failed to fetch entry");
        assert_eq!(
            stored.and_then(|e| e.embedding),
            Some(vec![0.1, 0.2]),
            "existing embedding must never be recomputed or overwritten"
        );
    }

    #[tokio::test]
    async fn test_get_all_returns_creation_order() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let mut first = KnowledgeEntry::new("first".to_string());
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        let second = KnowledgeEntry::new("second".to_string());

        db.store_item(second).await.expect("Failed to store");
        db.store_item(first).await.expect("Failed to store");

        let all = KnowledgeEntry::get_all(&db).await.expect("Failed to fetch");
        let contents: Vec<&str> = all.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }
}
