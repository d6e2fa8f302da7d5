use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(RuleStatement, "rule_statement", {
    rule: String
});

impl RuleStatement {
    pub fn new(rule: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            rule,
        }
    }

    /// Standing instructions injected into every prompt, in stored order.
    /// Managed by an external collaborator; the pipeline only reads them.
    pub async fn get_all(db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        let rules: Vec<Self> = db
            .client
            .query("SELECT * FROM type::table($table_name) ORDER BY created_at ASC")
            .bind(("table_name", Self::table_name()))
            .await?
            .take(0)?;

        Ok(rules)
    }
}
