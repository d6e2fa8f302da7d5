mod config;
mod state;

pub use config::AnswerConfig;
pub use state::{PipelineStep, StepTimings};

use std::{sync::Arc, time::Instant};

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            conversation::Conversation,
            knowledge_entry::KnowledgeEntry,
            message::{Message, MessageRole},
            rule_statement::RuleStatement,
        },
    },
    utils::embedding::EmbeddingProvider,
};
use tracing::{info, instrument};

use crate::{
    cache::EmbeddingCache, context::build_context, generation::AnswerGenerator, prompt::assemble,
    scoring::rank_entries,
};

/// What a completed run hands back to the caller: the generated answer and
/// the session it was appended to (freshly created when none was supplied).
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub conversation_id: String,
}

/// Sequences one query through retrieval, prompt assembly and generation,
/// persisting the exchange as it goes.
///
/// The user message is saved before any network call and is deliberately
/// not rolled back when a later step fails: a failed generation leaves an
/// orphaned user turn in the history.
pub struct AnswerPipeline {
    db: Arc<SurrealDbClient>,
    embedder: Arc<EmbeddingProvider>,
    generator: Arc<AnswerGenerator>,
    cache: EmbeddingCache,
    config: AnswerConfig,
}

impl AnswerPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedder: Arc<EmbeddingProvider>,
        generator: Arc<AnswerGenerator>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            generator,
            cache: EmbeddingCache::new(),
            config,
        }
    }

    #[instrument(skip_all, fields(user_id))]
    pub async fn answer(
        &self,
        user_id: &str,
        content: &str,
        conversation_id: Option<String>,
    ) -> Result<AnswerOutcome, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Message content is empty".to_string()));
        }

        let mut timings = StepTimings::default();

        let started = Instant::now();
        let conversation = match conversation_id {
            Some(id) => Conversation::get_owned(&id, user_id, &self.db).await?,
            None => {
                let conversation = Conversation::new(user_id.to_string());
                self.db.store_item(conversation.clone()).await?;
                conversation
            }
        };
        timings.record(PipelineStep::ResolveSession, started.elapsed());

        let started = Instant::now();
        let user_message = Message::new(
            conversation.id.clone(),
            MessageRole::User,
            content.to_string(),
        );
        self.db.store_item(user_message).await?;
        Conversation::touch(&conversation.id, &self.db).await?;
        timings.record(PipelineStep::SaveUserMessage, started.elapsed());

        let started = Instant::now();
        let query_embedding = self.embedder.embed(content).await?;
        timings.record(PipelineStep::EmbedQuery, started.elapsed());

        let started = Instant::now();
        let mut entries = KnowledgeEntry::get_all(&self.db).await?;
        let embeddings_computed = self
            .cache
            .ensure_embeddings(&self.db, &self.embedder, &mut entries)
            .await?;
        timings.record(PipelineStep::EnsureCorpusEmbeddings, started.elapsed());

        let started = Instant::now();
        let ranked = rank_entries(&query_embedding, entries, self.config.top_k);
        let ranked_count = ranked.len();
        timings.record(PipelineStep::Rank, started.elapsed());

        let started = Instant::now();
        let context = build_context(&ranked);
        timings.record(PipelineStep::BuildContext, started.elapsed());

        // History is loaded after the user message was saved, so the query
        // is part of it as well as being the final prompt entry.
        let started = Instant::now();
        let history = Conversation::get_recent_messages(
            &conversation.id,
            self.config.history_window,
            &self.db,
        )
        .await?;
        timings.record(PipelineStep::LoadHistory, started.elapsed());

        let started = Instant::now();
        let rules = RuleStatement::get_all(&self.db).await?;
        let prompt = assemble(&rules, &history, &context, content);
        timings.record(PipelineStep::AssemblePrompt, started.elapsed());

        let started = Instant::now();
        let answer = self.generator.generate(prompt).await?;
        timings.record(PipelineStep::Generate, started.elapsed());

        let started = Instant::now();
        let assistant_message = Message::new(
            conversation.id.clone(),
            MessageRole::Assistant,
            answer.clone(),
        );
        self.db.store_item(assistant_message).await?;
        Conversation::touch(&conversation.id, &self.db).await?;
        timings.record(PipelineStep::SaveAssistantMessage, started.elapsed());

        info!(
            %user_id,
            conversation_id = %conversation.id,
            embeddings_computed,
            ranked_count,
            total_ms = timings.total().as_millis(),
            steps = %timings.summary(),
            "Answer pipeline completed"
        );

        Ok(AnswerOutcome {
            answer,
            conversation_id: conversation.id,
        })
    }
}
