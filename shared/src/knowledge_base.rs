//! Bedrock Knowledge Base retrieval.

use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration, KnowledgeBaseRetrievalResult,
    KnowledgeBaseVectorSearchConfiguration,
};
use aws_sdk_bedrockagentruntime::Client as BedrockAgentClient;
use tracing::info;

use crate::{Error, Result};

/// A passage returned by the knowledge base, in relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub text: String,
    /// S3 URI of the source document, when the data source reports one
    pub uri: Option<String>,
}

impl From<&KnowledgeBaseRetrievalResult> for Passage {
    fn from(result: &KnowledgeBaseRetrievalResult) -> Self {
        let text = result
            .content()
            .map(|content| content.text())
            .unwrap_or_default()
            .to_string();

        let uri = result
            .location()
            .and_then(|location| location.s3_location())
            .and_then(|s3| s3.uri())
            .map(String::from);

        Self { text, uri }
    }
}

/// Source of grounding passages for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the most relevant passages for `query`, best first.
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>>;
}

/// Retriever backed by the Bedrock Agent Runtime `Retrieve` API.
pub struct KnowledgeBaseClient {
    client: BedrockAgentClient,
    knowledge_base_id: String,
    number_of_results: i32,
}

impl KnowledgeBaseClient {
    /// Create a new knowledge base client.
    pub fn new(client: BedrockAgentClient, knowledge_base_id: String, number_of_results: i32) -> Self {
        Self {
            client,
            knowledge_base_id,
            number_of_results,
        }
    }

    /// Vector search limited to the configured number of passages.
    fn retrieval_configuration(&self) -> KnowledgeBaseRetrievalConfiguration {
        KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(
                KnowledgeBaseVectorSearchConfiguration::builder()
                    .number_of_results(self.number_of_results)
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Retriever for KnowledgeBaseClient {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>> {
        let response = self
            .client
            .retrieve()
            .knowledge_base_id(&self.knowledge_base_id)
            .retrieval_query(KnowledgeBaseQuery::builder().text(query).build())
            .retrieval_configuration(self.retrieval_configuration())
            .send()
            .await
            .map_err(|e| Error::Aws(DisplayErrorContext(&e).to_string()))?;

        let passages: Vec<Passage> = response.retrieval_results().iter().map(Passage::from).collect();

        info!(
            knowledge_base_id = %self.knowledge_base_id,
            passages = passages.len(),
            "Retrieved passages"
        );

        Ok(passages)
    }
}
