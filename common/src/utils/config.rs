use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    /// Endpoint answering `POST { input }` with `{ embedding: [..] }`.
    pub embedding_api_url: String,
    pub chat_api_key: String,
    #[serde(default = "default_chat_base_url")]
    pub chat_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default)]
    pub chat_temperature: Option<f32>,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    /// `None` sends the full conversation history to the model; `Some(n)`
    /// keeps only the n most recent messages.
    #[serde(default)]
    pub history_window: Option<usize>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_chat_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_model() -> String {
    "google/gemini-2.0-flash-lite-preview-02-05:free".to_string()
}

fn default_retrieval_top_k() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
