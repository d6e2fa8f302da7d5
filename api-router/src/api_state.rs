use std::{sync::Arc, time::Duration};

use answer_pipeline::{AnswerConfig, AnswerGenerator, AnswerPipeline};
use common::{
    storage::db::SurrealDbClient,
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub pipeline: Arc<AnswerPipeline>,
}

impl ApiState {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(
            SurrealDbClient::new(
                &config.surrealdb_address,
                &config.surrealdb_username,
                &config.surrealdb_password,
                &config.surrealdb_namespace,
                &config.surrealdb_database,
            )
            .await?,
        );

        db.ensure_initialized().await?;

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let embedder = Arc::new(EmbeddingProvider::new_http(
            config.embedding_api_url.clone(),
            timeout,
        )?);

        // Generation shares the same bounded timeout as embedding.
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let chat_client = Arc::new(
            async_openai::Client::with_config(
                async_openai::config::OpenAIConfig::new()
                    .with_api_key(&config.chat_api_key)
                    .with_api_base(&config.chat_base_url),
            )
            .with_http_client(http_client),
        );
        let generator = Arc::new(AnswerGenerator::new_chat(
            chat_client,
            config.chat_model.clone(),
            config.chat_temperature,
        ));

        let pipeline = Arc::new(AnswerPipeline::new(
            db.clone(),
            embedder,
            generator,
            AnswerConfig::from_app_config(config),
        ));

        Ok(Self {
            db,
            config: config.clone(),
            pipeline,
        })
    }
}
