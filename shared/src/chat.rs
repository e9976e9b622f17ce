//! Retrieval-augmented chat pipeline.

use std::sync::Arc;

use tracing::info;

use crate::converse::{build_turns, ChatModel};
use crate::greeting::is_greeting;
use crate::knowledge_base::Retriever;
use crate::models::{ChatResponse, HistoryEntry};
use crate::prompt::PromptTemplate;
use crate::sources::build_sources;
use crate::{Error, Result};

/// Retrieves context for a question, asks the model and shapes the reply.
pub struct ChatPipeline {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl ChatPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn ChatModel>, template: PromptTemplate) -> Self {
        Self {
            retriever,
            model,
            template,
        }
    }

    /// Answer `message` in the context of `history`.
    ///
    /// A blank message is rejected before any upstream call. Greetings get
    /// an empty source list.
    pub async fn answer(&self, message: &str, history: &[HistoryEntry]) -> Result<ChatResponse> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Validation("Empty message".to_string()));
        }

        let passages = self.retriever.retrieve(message).await?;
        let system_prompt = self.template.render(&passages);
        let turns = build_turns(history, message);

        let reply = self.model.converse(&system_prompt, &turns).await?;

        let greeting = is_greeting(message);
        let sources = if greeting { Vec::new() } else { build_sources(&passages) };

        info!(
            passages = passages.len(),
            turns = turns.len(),
            greeting,
            sources = sources.len(),
            "Answered chat message"
        );

        Ok(ChatResponse { reply, sources })
    }
}
