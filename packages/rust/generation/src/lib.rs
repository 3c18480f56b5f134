//! Text generation through an Anthropic-compatible Messages endpoint.
//!
//! Section drafts are produced by sending one user message (prompt template
//! plus context documents) to `POST <base_url>/v1/messages`. The endpoint is
//! configurable so any compatible gateway works; the default points at the
//! GLM Anthropic-compatible API.
//!
//! [`TextGenerator`] is the seam the draft pipeline depends on, which keeps
//! it testable without a network.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use patentdraft_shared::{PatentDraftError, Result};

/// API version header value expected by Messages endpoints.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("patentdraft/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed back in error messages.
const MAX_ERROR_BODY: usize = 500;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Fully assembled user message.
    pub user_message: String,
}

/// Text returned by a generation call.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    /// Model name reported by the endpoint.
    pub model: String,
    pub output_tokens: Option<u64>,
}

/// Anything that can turn a request into generated text.
pub trait TextGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Generated>> + Send;

    /// Human-readable endpoint description for logs.
    fn endpoint(&self) -> String;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    output_tokens: Option<u64>,
}

// ---------------------------------------------------------------------------
// MessagesClient
// ---------------------------------------------------------------------------

/// HTTP client for a Messages endpoint.
#[derive(Debug, Clone)]
pub struct MessagesClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl MessagesClient {
    /// Build a client. `base_url` must be an absolute http(s) URL.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            PatentDraftError::config(format!("invalid base_url '{base_url}': {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PatentDraftError::config(format!(
                "base_url must be http(s), got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PatentDraftError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

impl TextGenerator for MessagesClient {
    #[instrument(skip_all, fields(model = %request.model, temperature = request.temperature))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
        let url = self.messages_url();
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![WireMessage {
                role: "user",
                content: &request.user_message,
            }],
        };

        debug!(%url, message_len = request.user_message.len(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PatentDraftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(MAX_ERROR_BODY).collect();
            return Err(PatentDraftError::Network(format!(
                "{url}: HTTP {status}: {detail}"
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            PatentDraftError::Generation(format!("unreadable response from {url}: {e}"))
        })?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(PatentDraftError::Generation(
                "response contained no text content".into(),
            ));
        }

        let output_tokens = parsed.usage.and_then(|u| u.output_tokens);
        info!(output_tokens = ?output_tokens, text_len = text.len(), "generation complete");

        Ok(Generated {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_request() -> GenerationRequest {
        GenerationRequest {
            model: "glm-4.7".into(),
            temperature: 0.5,
            max_tokens: 1024,
            user_message: "# 背景技术模板\n\n## 00_技术交底书.md\n\n内容".into(),
        }
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(MessagesClient::new("not a url", "k", 10).is_err());
        assert!(MessagesClient::new("ftp://example.com", "k", 10).is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = MessagesClient::new("https://example.com/api/anthropic/", "k", 10).unwrap();
        assert_eq!(
            client.messages_url(),
            "https://example.com/api/anthropic/v1/messages"
        );
    }

    #[tokio::test]
    async fn generate_sends_message_and_reads_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(serde_json::json!({
                "model": "glm-4.7",
                "max_tokens": 1024,
                "temperature": 0.5,
                "messages": [{"role": "user"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "glm-4.7",
                "content": [
                    {"type": "text", "text": "1. 一种方法，"},
                    {"type": "text", "text": "其特征在于……"}
                ],
                "usage": {"input_tokens": 120, "output_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MessagesClient::new(&server.uri(), "sk-test", 10).unwrap();
        let generated = client.generate(&make_request()).await.unwrap();

        assert_eq!(generated.text, "1. 一种方法，其特征在于……");
        assert_eq!(generated.output_tokens, Some(42));
        assert_eq!(generated.model, "glm-4.7");
    }

    #[tokio::test]
    async fn generate_ignores_non_text_blocks() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "正文"}
                ]
            })))
            .mount(&server)
            .await;

        let client = MessagesClient::new(&server.uri(), "sk-test", 10).unwrap();
        let generated = client.generate(&make_request()).await.unwrap();

        assert_eq!(generated.text, "正文");
        assert_eq!(generated.output_tokens, None);
        assert_eq!(generated.model, "glm-4.7");
    }

    #[tokio::test]
    async fn generate_reports_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = MessagesClient::new(&server.uri(), "bad", 10).unwrap();
        let err = client.generate(&make_request()).await.unwrap_err();

        assert!(matches!(err, PatentDraftError::Network(_)));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn generate_rejects_empty_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": [] })),
            )
            .mount(&server)
            .await;

        let client = MessagesClient::new(&server.uri(), "sk-test", 10).unwrap();
        let err = client.generate(&make_request()).await.unwrap_err();

        assert!(matches!(err, PatentDraftError::Generation(_)));
    }
}
