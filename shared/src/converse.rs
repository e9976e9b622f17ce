//! Bedrock Converse generation client.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, GuardrailConfiguration, InferenceConfiguration, Message,
    SystemContentBlock,
};
use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;
use tracing::{info, warn};

use crate::config::{Config, GuardrailConfig};
use crate::models::HistoryEntry;
use crate::{Error, Result};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a browser-supplied role name. `user` and `human` are the user,
    /// every other name is treated as the assistant.
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "user" | "human" => Role::User,
            _ => Role::Assistant,
        }
    }
}

impl From<Role> for ConversationRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ConversationRole::User,
            Role::Assistant => ConversationRole::Assistant,
        }
    }
}

/// A single turn sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Turn browser history into a strictly alternating sequence that starts
/// with a user turn.
///
/// Entries without a role or with blank content are dropped, consecutive
/// turns from the same speaker are joined with a blank line.
pub fn normalize_history(entries: &[HistoryEntry]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for entry in entries {
        let (Some(role), Some(content)) = (entry.role.as_deref(), entry.content.as_deref()) else {
            continue;
        };
        let (role, content) = (role.trim(), content.trim());
        if role.is_empty() || content.is_empty() {
            continue;
        }

        let role = Role::from_alias(role);
        if let Some(last) = turns.last_mut().filter(|last| last.role == role) {
            last.content.push_str("\n\n");
            last.content.push_str(content);
            continue;
        }
        if turns.is_empty() && role == Role::Assistant {
            continue;
        }
        turns.push(Turn {
            role,
            content: content.to_string(),
        });
    }

    turns
}

/// Full turn sequence for a question: normalized history followed by the
/// current message as the final user turn.
///
/// A trailing history turn from the user never got an answer, so it is
/// replaced by the current message.
pub fn build_turns(history: &[HistoryEntry], message: &str) -> Vec<Turn> {
    let mut turns = normalize_history(history);
    if let Some(unanswered) = turns.last().filter(|turn| turn.role == Role::User) {
        warn!(
            dropped_chars = unanswered.content.chars().count(),
            "Dropping unanswered user turn from history"
        );
        turns.pop();
    }
    turns.push(Turn::user(message));
    turns
}

/// Decoding parameters applied to every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    pub guardrail: Option<GuardrailConfig>,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            guardrail: config.guardrail.clone(),
        }
    }
}

/// Language model answering a conversation under a system prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the assistant reply to `turns`.
    async fn converse(&self, system_prompt: &str, turns: &[Turn]) -> Result<String>;
}

/// Chat model backed by the Bedrock Runtime `Converse` API.
pub struct BedrockChatModel {
    client: BedrockRuntimeClient,
    model_id: String,
    settings: GenerationSettings,
}

impl BedrockChatModel {
    /// Create a new Converse client.
    pub fn new(client: BedrockRuntimeClient, model_id: String, settings: GenerationSettings) -> Self {
        Self {
            client,
            model_id,
            settings,
        }
    }
}

fn to_message(turn: &Turn) -> Result<Message> {
    Message::builder()
        .role(turn.role.into())
        .content(ContentBlock::Text(turn.content.clone()))
        .build()
        .map_err(|e| Error::Internal(format!("Failed to build message: {}", e)))
}

fn guardrail_configuration(guardrail: &GuardrailConfig) -> GuardrailConfiguration {
    GuardrailConfiguration::builder()
        .guardrail_identifier(&guardrail.id)
        .guardrail_version(&guardrail.version)
        .build()
}

/// Pull the answer text out of a Converse output.
fn extract_reply(output: Option<ConverseOutput>) -> Result<String> {
    let Some(output) = output else {
        return Err(Error::Aws("No output from model".to_string()));
    };

    let ConverseOutput::Message(message) = output else {
        return Err(Error::Aws("Unknown output from model".to_string()));
    };

    message
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text(text) => Some(text),
            _ => None,
        })
        .ok_or_else(|| Error::Aws("No text content from model".to_string()))
}

#[async_trait]
impl ChatModel for BedrockChatModel {
    async fn converse(&self, system_prompt: &str, turns: &[Turn]) -> Result<String> {
        let messages = turns.iter().map(to_message).collect::<Result<Vec<_>>>()?;

        let inference = InferenceConfiguration::builder()
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .top_p(self.settings.top_p)
            .build();

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(messages))
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .inference_config(inference);

        if let Some(guardrail) = &self.settings.guardrail {
            request = request.guardrail_config(guardrail_configuration(guardrail));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Aws(DisplayErrorContext(&e).to_string()))?;

        info!(
            model_id = %self.model_id,
            turns = turns.len(),
            stop_reason = ?response.stop_reason(),
            guardrail = self.settings.guardrail.is_some(),
            "Model replied"
        );

        extract_reply(response.output)
    }
}
