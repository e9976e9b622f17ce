//! AWS SDK bootstrap from explicit configuration.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use tracing::info;

use crate::config::Config;

const CREDENTIALS_PROVIDER: &str = "relay-environment";

/// SDK clients shared by every request.
#[derive(Clone)]
pub struct AwsClients {
    pub agent_runtime: aws_sdk_bedrockagentruntime::Client,
    pub bedrock_runtime: aws_sdk_bedrockruntime::Client,
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Build all clients from one SDK configuration.
    pub async fn load(config: &Config) -> Self {
        let sdk_config = load_sdk_config(config).await;
        Self {
            agent_runtime: aws_sdk_bedrockagentruntime::Client::new(&sdk_config),
            bedrock_runtime: aws_sdk_bedrockruntime::Client::new(&sdk_config),
            s3: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

/// Build the base SDK configuration with the configured region and static
/// credentials.
pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    let credentials = Credentials::new(
        config.aws_access_key_id.clone(),
        config.aws_secret_access_key.clone(),
        config.aws_session_token.clone(),
        None,
        CREDENTIALS_PROVIDER,
    );

    info!(region = %config.aws_region, "Loading AWS configuration");

    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(credentials)
        .load()
        .await
}
