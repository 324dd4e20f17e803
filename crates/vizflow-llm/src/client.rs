use crate::retry::{RetryPolicy, UpstreamReply, send_with_retry};
use crate::types::*;
use crate::LlmError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.featherless.ai/v1";

/// Connection settings for the chat-completion endpoint, built once at
/// startup and handed to [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

impl LlmConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Anything that can answer a chat-completion request.
pub trait ChatBackend: Send + Sync {
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send;
}

pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn send_once(
        &self,
        url: &str,
        request: &ChatRequest,
        attempt: u32,
    ) -> Result<UpstreamReply, LlmError> {
        debug!(
            attempt,
            "LLM request to {}: {} messages",
            url,
            request.messages.len()
        );

        let mut req_builder = self.http.post(url).json(request);
        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;

        Ok(UpstreamReply { status, body })
    }
}

impl ChatBackend for LlmClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = self.config.completions_url();
        let url = url.as_str();

        let reply = send_with_retry(&self.config.retry, move |attempt| {
            self.send_once(url, request, attempt)
        })
        .await?;

        let chat_response = classify(reply)?;

        info!(
            "LLM response: finish_reason={:?}, usage={:?}",
            chat_response
                .choices
                .first()
                .and_then(|c| c.finish_reason.as_ref()),
            chat_response.usage.as_ref().map(|u| u.total_tokens)
        );

        Ok(chat_response)
    }
}

/// Turn the final upstream reply into a response or a typed failure.
pub(crate) fn classify(reply: UpstreamReply) -> Result<ChatResponse, LlmError> {
    let UpstreamReply { status, body } = reply;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| LlmError::MalformedResponse {
            reason: format!("failed to parse chat response: {}", e),
            body,
        });
    }

    if status.is_server_error() {
        Err(LlmError::Unavailable {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(LlmError::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn reply(status: u16, body: &str) -> UpstreamReply {
        UpstreamReply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            temperature: Some(0.25),
            max_tokens: Some(600),
            messages: vec![Message::system("sys"), Message::user("plan it")],
        }
    }

    fn client_for(server: &mockito::Server) -> LlmClient {
        LlmClient::new(LlmConfig {
            base_url: format!("{}/v1", server.url()),
            api_key: Some("secret".to_string()),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        })
        .unwrap()
    }

    const OK_BODY: &str = r#"{
        "id": "cmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "{\"steps\": []}"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }"#;

    #[test]
    fn test_completions_url_tolerates_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:1234/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.completions_url(),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(
            config.completions_url(),
            "https://api.featherless.ai/v1/chat/completions"
        );
    }

    #[test]
    fn test_classify_statuses() {
        assert!(classify(reply(200, OK_BODY)).is_ok());
        assert!(matches!(
            classify(reply(503, "busy")),
            Err(LlmError::Unavailable { status: 503, .. })
        ));
        assert!(matches!(
            classify(reply(500, "boom")),
            Err(LlmError::Unavailable { status: 500, .. })
        ));
        match classify(reply(401, "bad key")) {
            Err(LlmError::RequestFailed { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        assert!(matches!(
            classify(reply(200, "<html>")),
            Err(LlmError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_chat_sends_auth_and_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model": "test-model", "max_tokens": 600}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .expect(1)
            .create_async()
            .await;

        let response = client_for(&server).chat(&request()).await.unwrap();

        assert_eq!(response.first_text(), Some(r#"{"steps": []}"#));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_persistent_500_attempts_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("internal")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).chat(&request()).await.unwrap_err();

        assert!(matches!(err, LlmError::Unavailable { status: 500, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_persistent_503_attempts_twice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let err = client_for(&server).chat(&request()).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("overloaded"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_503_then_200_succeeds_on_second_attempt() {
        let mut server = mockito::Server::new_async().await;
        let busy = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .expect(1)
            .create_async()
            .await;

        let response = client_for(&server).chat(&request()).await.unwrap();

        assert_eq!(response.first_text(), Some(r#"{"steps": []}"#));
        busy.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_client_error_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_body(r#"{"error": "model not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).chat(&request()).await.unwrap_err();

        match err {
            LlmError::RequestFailed { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("model not found"));
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_unreachable_host() {
        // Nothing listens on port 9 of the loopback interface.
        let client = LlmClient::new(LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        })
        .unwrap();

        let err = client.chat(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Unreachable(_)));
    }
}
