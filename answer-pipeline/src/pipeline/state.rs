use std::time::Duration;

/// The orchestrator's linear step sequence. A run walks these in order;
/// any error ends the run where it stands, with no rollback of steps that
/// already persisted (notably the saved user message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    ResolveSession,
    SaveUserMessage,
    EmbedQuery,
    EnsureCorpusEmbeddings,
    Rank,
    BuildContext,
    LoadHistory,
    AssemblePrompt,
    Generate,
    SaveAssistantMessage,
}

impl PipelineStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ResolveSession => "resolve_session",
            Self::SaveUserMessage => "save_user_message",
            Self::EmbedQuery => "embed_query",
            Self::EnsureCorpusEmbeddings => "ensure_corpus_embeddings",
            Self::Rank => "rank",
            Self::BuildContext => "build_context",
            Self::LoadHistory => "load_history",
            Self::AssemblePrompt => "assemble_prompt",
            Self::Generate => "generate",
            Self::SaveAssistantMessage => "save_assistant_message",
        }
    }
}

// Wall-clock per step, recorded in execution order.
#[derive(Debug, Default, Clone)]
pub struct StepTimings {
    timings: Vec<(PipelineStep, Duration)>,
}

impl StepTimings {
    pub fn record(&mut self, step: PipelineStep, duration: Duration) {
        self.timings.push((step, duration));
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }

    /// Compact `step=ms` summary for the run-completed log line.
    pub fn summary(&self) -> String {
        self.timings
            .iter()
            .map(|(step, duration)| format!("{}={}ms", step.label(), duration.as_millis()))
            .collect::<Vec<String>>()
            .join(" ")
    }
}
