// Help assistant: answers questions about using the app.
//
// Stateless: the client sends the conversation so far with every request.
// Only user and assistant turns from that history are forwarded, so a
// client cannot replace the system prompt.

use std::sync::Arc;

use tracing::debug;

use crate::verification::llm::{ChatModel, ChatMessage, LlmError};

pub const HELP_SYSTEM_PROMPT: &str = "\
You are a helpful assistant for Sahayak, an emergency distress signal platform.
Your role is to help users understand how to use the app and answer their questions.

About the app:
- Users can submit distress signals with their location, message, and optional contact info
- GPS location can be captured automatically or entered manually
- All submissions are checked automatically to estimate their authenticity
- There's a live feed showing recent distress signals
- Admins can manage and verify submissions

Common user questions:
- How to submit a distress signal
- How GPS location works
- What happens after submission
- How verification works
- How to contact emergency services

Be concise, helpful, and empathetic. If someone seems to be in immediate danger, \
always advise them to contact local emergency services first (like 112 in India, 911 in US).";

/// Sent when the model answers with nothing.
pub const EMPTY_REPLY: &str = "Sorry, I could not generate a response.";

/// Older turns beyond this are dropped before forwarding.
pub const MAX_HISTORY_TURNS: usize = 20;

/// Assemble the message list: system prompt, recent history, new question.
pub fn build_conversation(history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
    let kept: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .collect();
    let skip = kept.len().saturating_sub(MAX_HISTORY_TURNS);

    let mut messages = Vec::with_capacity(kept.len() - skip + 2);
    messages.push(ChatMessage::system(HELP_SYSTEM_PROMPT));
    messages.extend(kept.into_iter().skip(skip).cloned());
    messages.push(ChatMessage::user(message));
    messages
}

pub struct Assistant {
    model: Arc<dyn ChatModel>,
}

impl Assistant {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, LlmError> {
        let conversation = build_conversation(history, message);
        debug!(turns = conversation.len(), "Asking help assistant");
        let reply = self.model.chat(&conversation).await?;
        if reply.trim().is_empty() {
            return Ok(EMPTY_REPLY.to_string());
        }
        Ok(reply)
    }
}
