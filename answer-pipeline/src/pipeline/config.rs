use common::utils::config::AppConfig;

/// Per-deployment knobs for one answer run. The observed deployments
/// disagreed on both values (top-K of 5 vs 10, last-4 vs full history), so
/// both stay configurable instead of hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct AnswerConfig {
    /// How many ranked knowledge entries make it into the grounding context.
    pub top_k: usize,
    /// `None` replays the full conversation history; `Some(n)` only the n
    /// most recent messages.
    pub history_window: Option<usize>,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            history_window: None,
        }
    }
}

impl AnswerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval_top_k,
            history_window: config.history_window,
        }
    }
}
