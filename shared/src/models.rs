//! Shared data models.

use serde::{Deserialize, Serialize};

/// Chat request payload.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

/// One prior turn as sent by the browser. Either field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat response payload.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<Source>,
}

/// Citation shown under an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// 1-based position in retrieval order
    pub id: usize,
    pub snippet: String,
    /// Storage URI of the originating document, or `N/A`
    pub file: String,
}

/// Presigned URL request payload.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    #[serde(default)]
    pub s3_uri: Option<String>,
}

/// Presigned URL response payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct PresignResponse {
    pub presigned_url: String,
}

/// Error body returned with every non-2xx JSON response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
