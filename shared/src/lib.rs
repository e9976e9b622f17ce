//! Shared library for the knowledge base chat relay.
//!
//! This crate provides configuration, the retrieval-augmented chat pipeline,
//! presigned link generation and the HTTP helpers used by the Lambda binary.

pub mod aws;
pub mod chat;
pub mod config;
pub mod converse;
pub mod error;
pub mod greeting;
pub mod http;
pub mod knowledge_base;
pub mod locator;
pub mod models;
pub mod presign;
pub mod prompt;
pub mod sources;

pub use aws::AwsClients;
pub use chat::ChatPipeline;
pub use config::{Config, GuardrailConfig};
pub use converse::{BedrockChatModel, ChatModel, GenerationSettings, Role, Turn};
pub use error::{Error, Result};
pub use greeting::is_greeting;
pub use knowledge_base::{KnowledgeBaseClient, Passage, Retriever};
pub use locator::S3Location;
pub use models::{ChatRequest, ChatResponse, ErrorBody, HistoryEntry, PresignRequest, PresignResponse, Source};
pub use presign::{presigned_url, Presigner, S3Presigner, PRESIGN_EXPIRY};
pub use prompt::PromptTemplate;
