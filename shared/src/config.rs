//! Configuration management for the relay Lambda.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "ap-south-1";
/// Number of passages requested from the knowledge base per question.
pub const DEFAULT_RETRIEVAL_RESULTS: i32 = 7;
pub const DEFAULT_MAX_TOKENS: i32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TOP_P: f32 = 1.0;

const REQUIRED_VARS: [&str; 4] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "KB_ID", "MODEL_ARN"];

/// Guardrail applied to every generation call when configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailConfig {
    pub id: String,
    pub version: String,
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// AWS access key id
    pub aws_access_key_id: String,
    /// AWS secret access key
    pub aws_secret_access_key: String,
    /// Optional session token for temporary credentials
    pub aws_session_token: Option<String>,
    /// AWS region
    pub aws_region: String,
    /// Bedrock knowledge base id
    pub kb_id: String,
    /// Model id or inference profile ARN passed to Converse
    pub model_arn: String,
    /// Guardrail, only when both id and version are set
    pub guardrail: Option<GuardrailConfig>,
    /// Passages retrieved per question
    pub retrieval_results: i32,
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    /// Replaces the built-in instruction template
    pub system_prompt_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("aws_access_key_id", &"<redacted>")
            .field("aws_secret_access_key", &"<redacted>")
            .field("aws_session_token", &self.aws_session_token.as_ref().map(|_| "<redacted>"))
            .field("aws_region", &self.aws_region)
            .field("kb_id", &self.kb_id)
            .field("model_arn", &self.model_arn)
            .field("guardrail", &self.guardrail)
            .field("retrieval_results", &self.retrieval_results)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("system_prompt_path", &self.system_prompt_path)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. All missing required keys are reported
    /// in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS.iter().copied().filter(|key| get(*key).is_none()).collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!("Missing env vars: {}", missing.join(", "))));
        }

        let guardrail = match (get("GUARDRAIL_ID"), get("GUARDRAIL_VERSION")) {
            (Some(id), Some(version)) => Some(GuardrailConfig { id, version }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::Config("GUARDRAIL_ID is set but GUARDRAIL_VERSION is missing".to_string()))
            }
            (None, Some(_)) => {
                return Err(Error::Config("GUARDRAIL_VERSION is set but GUARDRAIL_ID is missing".to_string()))
            }
        };

        let retrieval_results = parse_or(&get, "RETRIEVAL_RESULTS", DEFAULT_RETRIEVAL_RESULTS)?;
        if retrieval_results < 1 {
            return Err(Error::Config("RETRIEVAL_RESULTS must be at least 1".to_string()));
        }

        Ok(Self {
            aws_access_key_id: get("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            aws_secret_access_key: get("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            aws_session_token: get("AWS_SESSION_TOKEN"),
            aws_region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            kb_id: get("KB_ID").unwrap_or_default(),
            model_arn: get("MODEL_ARN").unwrap_or_default(),
            guardrail,
            retrieval_results,
            max_tokens: parse_or(&get, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            temperature: parse_or(&get, "TEMPERATURE", DEFAULT_TEMPERATURE)?,
            top_p: parse_or(&get, "TOP_P", DEFAULT_TOP_P)?,
            system_prompt_path: get("SYSTEM_PROMPT_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {:?} ({})", key, raw, e))),
        None => Ok(default),
    }
}
