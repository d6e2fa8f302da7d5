use surrealdb::opt::PatchOp;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

use super::message::Message;

stored_object!(Conversation, "conversation", {
    user_id: String
});

/// Listing entry for a user's conversation archive. The display name is
/// derived from the first user message, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub chat_name: String,
    pub updated_at: DateTime<Utc>,
}

const CHAT_NAME_MAX_CHARS: usize = 50;
const DEFAULT_CHAT_NAME: &str = "New Chat";

impl Conversation {
    pub fn new(user_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            user_id,
        }
    }

    /// Fetches a conversation, requiring ownership. A missing conversation
    /// and someone else's conversation are indistinguishable to the caller.
    pub async fn get_owned(
        conversation_id: &str,
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let conversation: Option<Conversation> = db.get_item(conversation_id).await?;

        match conversation {
            Some(conversation) if conversation.user_id == user_id => Ok(conversation),
            _ => Err(AppError::NotFound("Conversation not found".to_string())),
        }
    }

    /// Full message log in creation order.
    pub async fn get_messages(
        conversation_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Message>, AppError> {
        let messages: Vec<Message> = db
            .client
            .query(
                "SELECT * FROM type::table($table_name)
                 WHERE conversation_id = $conversation_id
                 ORDER BY created_at ASC",
            )
            .bind(("table_name", Message::table_name()))
            .bind(("conversation_id", conversation_id.to_string()))
            .await?
            .take(0)?;

        Ok(messages)
    }

    /// The most recent `limit` messages in creation order, or the full log
    /// when no window is configured.
    pub async fn get_recent_messages(
        conversation_id: &str,
        limit: Option<usize>,
        db: &SurrealDbClient,
    ) -> Result<Vec<Message>, AppError> {
        let Some(limit) = limit else {
            return Self::get_messages(conversation_id, db).await;
        };

        let mut messages: Vec<Message> = db
            .client
            .query(
                "SELECT * FROM type::table($table_name)
                 WHERE conversation_id = $conversation_id
                 ORDER BY created_at DESC
                 LIMIT $limit",
            )
            .bind(("table_name", Message::table_name()))
            .bind(("conversation_id", conversation_id.to_string()))
            .bind(("limit", limit))
            .await?
            .take(0)?;

        messages.reverse();
        Ok(messages)
    }

    /// First user message truncated to 50 characters, else "New Chat".
    pub fn chat_name(messages: &[Message]) -> String {
        messages
            .iter()
            .find(|m| m.role == super::message::MessageRole::User)
            .map_or_else(
                || DEFAULT_CHAT_NAME.to_string(),
                |m| m.content.chars().take(CHAT_NAME_MAX_CHARS).collect(),
            )
    }

    /// Archive listing for one user, most recently active first.
    pub async fn list_for_user(
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        let conversations: Vec<Conversation> = db
            .client
            .query(
                "SELECT * FROM type::table($table_name)
                 WHERE user_id = $user_id
                 ORDER BY updated_at DESC",
            )
            .bind(("table_name", Conversation::table_name()))
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let first_user_message: Vec<Message> = db
                .client
                .query(
                    "SELECT * FROM type::table($table_name)
                     WHERE conversation_id = $conversation_id AND role = 'user'
                     ORDER BY created_at ASC
                     LIMIT 1",
                )
                .bind(("table_name", Message::table_name()))
                .bind(("conversation_id", conversation.id.clone()))
                .await?
                .take(0)?;

            summaries.push(ConversationSummary {
                id: conversation.id,
                chat_name: Self::chat_name(&first_user_message),
                updated_at: conversation.updated_at,
            });
        }

        Ok(summaries)
    }

    /// Deletes a conversation and all of its messages, requiring ownership.
    pub async fn delete_owned(
        conversation_id: &str,
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        let conversation = Self::get_owned(conversation_id, user_id, db).await?;

        db.client
            .query("DELETE type::table($table_name) WHERE conversation_id = $conversation_id")
            .bind(("table_name", Message::table_name()))
            .bind(("conversation_id", conversation_id.to_string()))
            .await?;

        db.delete_item::<Self>(&conversation.id).await?;

        Ok(())
    }

    /// Bumps `updated_at` so the archive listing reflects recent activity.
    pub async fn touch(conversation_id: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        let _updated: Option<Self> = db
            .update((Self::table_name(), conversation_id))
            .patch(PatchOp::replace(
                "/updated_at",
                surrealdb::sql::Datetime::from(Utc::now()),
            ))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::types::message::MessageRole;

    use super::*;

    async fn memory_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    fn message_at(
        conversation_id: &str,
        role: MessageRole,
        content: &str,
        seconds_ago: i64,
    ) -> Message {
        let mut message = Message::new(conversation_id.to_string(), role, content.to_string());
        message.created_at = Utc::now() - chrono::Duration::seconds(seconds_ago);
        message
    }

    #[tokio::test]
    async fn test_get_owned_rejects_foreign_and_missing() {
        let db = memory_db().await;

        let conversation = Conversation::new("owner".to_string());
        let conversation_id = conversation.id.clone();
        db.store_item(conversation)
            .await
            .expect("Failed to store conversation");

        assert!(Conversation::get_owned(&conversation_id, "owner", &db)
            .await
            .is_ok());

        // Someone else's conversation looks exactly like a missing one
        let foreign = Conversation::get_owned(&conversation_id, "intruder", &db).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));

        let missing = Conversation::get_owned("nonexistent", "owner", &db).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_messages_come_back_in_creation_order() {
        let db = memory_db().await;

        let conversation = Conversation::new("owner".to_string());
        let conversation_id = conversation.id.clone();
        db.store_item(conversation)
            .await
            .expect("Failed to store conversation");

        for (content, age) in [("first", 30), ("second", 20), ("third", 10)] {
            db.store_item(message_at(&conversation_id, MessageRole::User, content, age))
                .await
                .expect("Failed to store message");
        }

        let messages = Conversation::get_messages(&conversation_id, &db)
            .await
            .expect("Failed to fetch messages");
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_recent_window_keeps_latest_in_order() {
        let db = memory_db().await;

        let conversation = Conversation::new("owner".to_string());
        let conversation_id = conversation.id.clone();
        db.store_item(conversation)
            .await
            .expect("Failed to store conversation");

        for (content, age) in [("a", 40), ("b", 30), ("c", 20), ("d", 10)] {
            db.store_item(message_at(&conversation_id, MessageRole::User, content, age))
                .await
                .expect("Failed to store message");
        }

        let windowed = Conversation::get_recent_messages(&conversation_id, Some(2), &db)
            .await
            .expect("Failed to fetch window");
        let contents: Vec<&str> = windowed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "d"]);

        let full = Conversation::get_recent_messages(&conversation_id, None, &db)
            .await
            .expect("Failed to fetch full history");
        assert_eq!(full.len(), 4);
    }

    #[tokio::test]
    async fn test_chat_name_derivation() {
        let long = "x".repeat(80);
        let messages = vec![
            Message::new("c".into(), MessageRole::Assistant, "ignored".into()),
            Message::new("c".into(), MessageRole::User, long),
        ];

        let name = Conversation::chat_name(&messages);
        assert_eq!(name.chars().count(), 50);

        assert_eq!(Conversation::chat_name(&[]), "New Chat");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let db = memory_db().await;

        let conversation = Conversation::new("owner".to_string());
        let conversation_id = conversation.id.clone();
        db.store_item(conversation)
            .await
            .expect("Failed to store conversation");
        db.store_item(message_at(&conversation_id, MessageRole::User, "hi", 10))
            .await
            .expect("Failed to store message");

        // An intruder cannot delete it
        let denied = Conversation::delete_owned(&conversation_id, "intruder", &db).await;
        assert!(matches!(denied, Err(AppError::NotFound(_))));

        Conversation::delete_owned(&conversation_id, "owner", &db)
            .await
            .expect("Failed to delete conversation");

        let gone: Option<Conversation> = db
            .get_item(&conversation_id)
            .await
            .expect("Failed to fetch");
        assert!(gone.is_none());

        let messages = Conversation::get_messages(&conversation_id, &db)
            .await
            .expect("Failed to fetch messages");
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_user_orders_by_activity() {
        let db = memory_db().await;

        let mut stale = Conversation::new("owner".to_string());
        stale.updated_at = Utc::now() - chrono::Duration::hours(1);
        let stale_id = stale.id.clone();
        let fresh = Conversation::new("owner".to_string());
        let fresh_id = fresh.id.clone();
        let foreign = Conversation::new("someone_else".to_string());

        db.store_item(stale).await.expect("Failed to store");
        db.store_item(fresh).await.expect("Failed to store");
        db.store_item(foreign).await.expect("Failed to store");

        db.store_item(message_at(&stale_id, MessageRole::User, "about rust", 10))
            .await
            .expect("Failed to store message");

        let summaries = Conversation::list_for_user("owner", &db)
            .await
            .expect("Failed to list conversations");

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, fresh_id);
        assert_eq!(summaries[0].chat_name, "New Chat");
        assert_eq!(summaries[1].id, stale_id);
        assert_eq!(summaries[1].chat_name, "about rust");
    }
}
