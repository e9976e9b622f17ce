//! Relay Lambda - Serves the chat UI, /chat and /presigned-url.
//!
//! Endpoints:
//! - GET / - Chat page
//! - POST /chat - Answer a message from the knowledge base
//! - POST /presigned-url - Short-lived download link for a source document

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, from_error, html_response, json_response};
use shared::{
    parse_body, AwsClients, BedrockChatModel, ChatPipeline, ChatRequest, Config, GenerationSettings,
    KnowledgeBaseClient, PresignRequest, PresignResponse, Presigner, PromptTemplate, S3Presigner,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const INDEX_PAGE: &str = include_str!("../../static/index.html");

/// Application state shared across requests.
struct AppState {
    pipeline: ChatPipeline,
    presigner: Arc<dyn Presigner>,
}

impl AppState {
    async fn new(config: &Config) -> Result<Self, Error> {
        let template = match &config.system_prompt_path {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };

        let clients = AwsClients::load(config).await;

        let retriever = KnowledgeBaseClient::new(
            clients.agent_runtime,
            config.kb_id.clone(),
            config.retrieval_results,
        );
        let model = BedrockChatModel::new(
            clients.bedrock_runtime,
            config.model_arn.clone(),
            GenerationSettings::from(config),
        );

        Ok(Self {
            pipeline: ChatPipeline::new(Arc::new(retriever), Arc::new(model), template),
            presigner: Arc::new(S3Presigner::new(clients.s3)),
        })
    }
}

async fn chat(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let request: ChatRequest = parse_body!(event.body());
    let message = request.message.unwrap_or_default();
    let history = request.history.unwrap_or_default();

    match state.pipeline.answer(&message, &history).await {
        Ok(response) => json_response(200, &response),
        Err(e) => {
            if e.status_code() >= 500 {
                error!("Chat failed: {}", e);
            } else {
                warn!("Chat rejected: {}", e);
            }
            from_error(&e)
        }
    }
}

async fn presign(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let request: PresignRequest = parse_body!(event.body());
    let s3_uri = request.s3_uri.unwrap_or_default();

    match shared::presigned_url(state.presigner.as_ref(), &s3_uri).await {
        Ok(presigned_url) => json_response(200, &PresignResponse { presigned_url }),
        Err(e) => {
            if e.status_code() >= 500 {
                error!("Presigning {} failed: {}", s3_uri, e);
            } else {
                warn!("Presign rejected for {:?}: {}", s3_uri, e);
            }
            from_error(&e)
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = match event.uri().path().trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    info!("Relay request: {} {}", method, path);

    match (method, path) {
        ("GET", "/") => html_response(INDEX_PAGE),
        ("POST", "/chat") => chat(&state, &event).await,
        ("POST", "/presigned-url") => presign(&state, &event).await,
        (_, "/" | "/chat" | "/presigned-url") => error_response(405, "Method not allowed"),
        _ => error_response(404, "Not found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env().inspect_err(|e| error!("Refusing to start: {}", e))?;
    info!("Loaded configuration: {:?}", config);

    let state = Arc::new(AppState::new(&config).await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::{ChatResponse, ErrorBody, Passage, Retriever, Role, S3Location, Turn};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        retrievals: Mutex<Vec<String>>,
        generations: Mutex<Vec<Vec<Turn>>>,
        presigns: Mutex<Vec<S3Location>>,
    }

    struct FakeRetriever(Arc<Calls>);

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn retrieve(&self, query: &str) -> shared::Result<Vec<Passage>> {
            self.0.retrievals.lock().unwrap().push(query.to_string());
            Ok(vec![Passage {
                text: "Every agent must complete KYC before onboarding.".to_string(),
                uri: Some("s3://legal-docs/kyc.pdf".to_string()),
            }])
        }
    }

    struct FakeModel {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl shared::ChatModel for FakeModel {
        async fn converse(&self, _system_prompt: &str, turns: &[Turn]) -> shared::Result<String> {
            self.calls.generations.lock().unwrap().push(turns.to_vec());
            if self.fail {
                return Err(shared::Error::Aws("ValidationException: model not enabled".to_string()));
            }
            Ok("KYC is required for every agent.".to_string())
        }
    }

    struct FakePresigner {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl Presigner for FakePresigner {
        async fn presign_get(&self, location: &S3Location) -> shared::Result<String> {
            self.calls.presigns.lock().unwrap().push(location.clone());
            if self.fail {
                return Err(shared::Error::Aws("AccessDenied".to_string()));
            }
            Ok(format!(
                "https://{}.s3.amazonaws.com/{}?X-Amz-Expires=300",
                location.bucket, location.key
            ))
        }
    }

    fn state(fail_upstream: bool) -> (Arc<AppState>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let pipeline = ChatPipeline::new(
            Arc::new(FakeRetriever(calls.clone())),
            Arc::new(FakeModel {
                calls: calls.clone(),
                fail: fail_upstream,
            }),
            PromptTemplate::default(),
        );
        let state = AppState {
            pipeline,
            presigner: Arc::new(FakePresigner {
                calls: calls.clone(),
                fail: fail_upstream,
            }),
        };
        (Arc::new(state), calls)
    }

    fn request(method: &str, uri: &str, body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json<T: serde::de::DeserializeOwned>(response: &Response<Body>) -> T {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_index_page_not_cached() {
        let (state, _) = state(false);
        let response = handler(state, request("GET", "/", "")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["cache-control"], "no-cache, no-store, must-revalidate");
        assert_eq!(response.headers()["pragma"], "no-cache");
        assert_eq!(response.headers()["expires"], "0");
        assert!(std::str::from_utf8(response.body().as_ref()).unwrap().contains("<html"));
    }

    #[tokio::test]
    async fn test_chat_success() {
        let (state, calls) = state(false);
        let body = r#"{"message":"What is KYC?","history":[{"role":"human","content":"Hi"},{"role":"assistant","content":"Hello!"}]}"#;
        let response = handler(state, request("POST", "/chat", body)).await.unwrap();

        assert_eq!(response.status(), 200);
        let chat: ChatResponse = json(&response);
        assert_eq!(chat.reply, "KYC is required for every agent.");
        assert_eq!(chat.sources.len(), 1);
        assert_eq!(chat.sources[0].id, 1);
        assert_eq!(chat.sources[0].file, "s3://legal-docs/kyc.pdf");

        assert_eq!(calls.retrievals.lock().unwrap().len(), 1);
        let generations = calls.generations.lock().unwrap();
        assert_eq!(generations.len(), 1);
        let last = generations[0].last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "What is KYC?");
    }

    #[tokio::test]
    async fn test_chat_greeting_has_no_sources() {
        let (state, _) = state(false);
        let response = handler(state, request("POST", "/chat", r#"{"message":"Hello there"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let chat: ChatResponse = json(&response);
        assert!(chat.sources.is_empty());
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        for body in [r#"{"message":"   "}"#, r#"{"history":[]}"#, r#"{"message":null}"#] {
            let (state, calls) = state(false);
            let response = handler(state, request("POST", "/chat", body)).await.unwrap();
            assert_eq!(response.status(), 400, "{}", body);
            let error: ErrorBody = json(&response);
            assert_eq!(error.error, "Empty message");
            assert!(calls.retrievals.lock().unwrap().is_empty());
            assert!(calls.generations.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_chat_invalid_body() {
        let (state, calls) = state(false);
        let response = handler(state, request("POST", "/chat", "{not json")).await.unwrap();
        assert_eq!(response.status(), 400);
        let error: ErrorBody = json(&response);
        assert!(error.error.starts_with("Invalid request body"));
        assert!(calls.retrievals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_upstream_failure() {
        let (state, _) = state(true);
        let response = handler(state, request("POST", "/chat", r#"{"message":"What is KYC?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let error: ErrorBody = json(&response);
        assert_eq!(error.error, "ValidationException: model not enabled");
    }

    #[tokio::test]
    async fn test_presigned_url_success() {
        let (state, calls) = state(false);
        let body = r#"{"s3_uri":"https://legal-docs.s3.ap-south-1.amazonaws.com/circulars/KYC%20rules.pdf"}"#;
        let response = handler(state, request("POST", "/presigned-url", body)).await.unwrap();

        assert_eq!(response.status(), 200);
        let presigned: PresignResponse = json(&response);
        assert_eq!(
            presigned.presigned_url,
            "https://legal-docs.s3.amazonaws.com/circulars/KYC rules.pdf?X-Amz-Expires=300"
        );
        assert_eq!(
            calls.presigns.lock().unwrap().as_slice(),
            &[S3Location {
                bucket: "legal-docs".to_string(),
                key: "circulars/KYC rules.pdf".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_presigned_url_rejects_bad_locators() {
        let cases = [
            (r#"{}"#, "Invalid S3 URI/URL"),
            (r#"{"s3_uri":"  "}"#, "Invalid S3 URI/URL"),
            (r#"{"s3_uri":"https://example.com/a.pdf"}"#, "Invalid S3 HTTPS URL format"),
            (r#"{"s3_uri":"s3://bucket-only"}"#, "Invalid bucket or object key"),
        ];
        for (body, expected) in cases {
            let (state, calls) = state(false);
            let response = handler(state, request("POST", "/presigned-url", body)).await.unwrap();
            assert_eq!(response.status(), 400, "{}", body);
            let error: ErrorBody = json(&response);
            assert_eq!(error.error, expected);
            assert!(calls.presigns.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_presigned_url_upstream_failure() {
        let (state, _) = state(true);
        let response = handler(state, request("POST", "/presigned-url", r#"{"s3_uri":"s3://b/k.pdf"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let error: ErrorBody = json(&response);
        assert_eq!(error.error, "AccessDenied");
    }

    #[tokio::test]
    async fn test_routing_fallbacks() {
        let (state, _) = state(false);
        let response = handler(state.clone(), request("GET", "/chat", "")).await.unwrap();
        assert_eq!(response.status(), 405);

        let response = handler(state, request("GET", "/admin", "")).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_trailing_slash_is_ignored() {
        let (state, _) = state(false);
        let response = handler(state, request("POST", "/chat/", r#"{"message":"What is KYC?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}
