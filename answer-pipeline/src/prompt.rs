use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage,
};
use common::storage::types::{
    message::{Message, MessageRole},
    rule_statement::RuleStatement,
};

/// Merges standing rules, conversation history, grounding context and the
/// new query into the ordered message sequence sent to the model.
///
/// The ordering is significant and fixed: every rule as its own system
/// message in stored order, the history chronologically, the retrieved
/// context as a single assistant message, and the query as the final user
/// message. The model reads rules as authoritative, history as
/// conversational and the last two entries as the current exchange.
pub fn assemble(
    rules: &[RuleStatement],
    history: &[Message],
    context: &str,
    query: &str,
) -> Vec<ChatCompletionRequestMessage> {
    let mut messages: Vec<ChatCompletionRequestMessage> =
        Vec::with_capacity(rules.len() + history.len() + 2);

    for rule in rules {
        messages.push(ChatCompletionRequestSystemMessage::from(rule.rule.clone()).into());
    }

    for message in history {
        messages.push(match message.role {
            MessageRole::User => {
                ChatCompletionRequestUserMessage::from(message.content.clone()).into()
            }
            MessageRole::Assistant => assistant_message(message.content.clone()),
        });
    }

    messages.push(assistant_message(context.to_string()));
    messages.push(ChatCompletionRequestUserMessage::from(query.to_string()).into());

    messages
}

fn assistant_message(content: String) -> ChatCompletionRequestMessage {
    ChatCompletionRequestAssistantMessage {
        content: Some(ChatCompletionRequestAssistantMessageContent::Text(content)),
        ..Default::default()
    }
    .into()
}
