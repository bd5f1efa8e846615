//! Client for OpenAI-compatible `/chat/completions` endpoints.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-max";

const MAX_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 1.5;

static CONTENT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<content>(.*?)</content>").expect("valid content tag pattern"));
static THINK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think>(.*?)</think>").expect("valid think tag pattern"));

#[derive(Debug, Clone, Error)]
pub enum ChatApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: VITE_API_KEY is not set")]
    MissingApiKey,
    #[error("response contained no choices")]
    EmptyResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: String,
}

impl ChatResponse {
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, ChatApiError> {
        let http = Client::builder()
            .user_agent(concat!("soulnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Single attempt; callers decide what to do on failure.
    pub async fn complete(&self, messages: Vec<Message>) -> Result<ChatResponse, ChatApiError> {
        let api_key = self.api_key.as_deref().ok_or(ChatApiError::MissingApiKey)?;
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        };
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, key = %redact_key(api_key), "sending chat completion");

        let res = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatResponse>()
                .await
                .map_err(|e| ChatApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(ChatApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(ChatApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ChatApiError::Http { status, body })
            }
        }
    }

    /// Send a system + user prompt and return the note body with any
    /// reasoning tags removed.
    pub async fn ask(&self, system: &str, prompt: &str) -> Result<String, ChatApiError> {
        let response = self
            .complete(vec![Message::system(system), Message::user(prompt)])
            .await?;
        let raw = response.text().ok_or(ChatApiError::EmptyResponse)?;
        Ok(extract_note_content(raw.trim()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ChatApiError {
    if e.is_timeout() {
        ChatApiError::Timeout
    } else {
        ChatApiError::Transport(e.to_string())
    }
}

fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}...{tail}")
}

/// Prefer the `<content>` block; otherwise drop every `<think>` block.
pub fn extract_note_content(text: &str) -> String {
    if let Some(think) = THINK_TAG.captures(text).and_then(|c| c.get(1)) {
        debug!(thinking = %think.as_str().trim(), "model reasoning");
    }
    if let Some(content) = CONTENT_TAG.captures(text).and_then(|c| c.get(1)) {
        return content.as_str().trim().to_string();
    }
    let filtered = THINK_TAG.replace_all(text, "");
    warn!(had_think_tag = text.contains("<think>"), "no <content> tag in model output");
    filtered.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_content_block() {
        let text = "<think>reasoning</think>\n<content>\n  hello there \n</content>";
        assert_eq!(extract_note_content(text), "hello there");
    }

    #[test]
    fn content_tag_is_case_insensitive() {
        assert_eq!(extract_note_content("<CONTENT>hi</Content>"), "hi");
    }

    #[test]
    fn strips_think_blocks_without_content_tag() {
        let text = "<think>a</think>note body<think>\nb\n</think>";
        assert_eq!(extract_note_content(text), "note body");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(extract_note_content("  just text "), "just text");
    }

    #[test]
    fn redacts_keys() {
        assert_eq!(redact_key("sk-1234567890"), "sk-12...890");
        assert_eq!(redact_key("short"), "***");
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let client = ChatApiClient::new("http://127.0.0.1:9", Some("  ".into()), DEFAULT_MODEL).unwrap();
        assert!(!client.has_api_key());
        let err = client.ask("sys", "prompt").await.unwrap_err();
        assert!(matches!(err, ChatApiError::MissingApiKey));
    }

    #[tokio::test]
    async fn talks_to_compatible_endpoint() {
        use axum::{Json, Router, routing::post};

        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["max_tokens"], 1500);
                assert_eq!(body["messages"][0]["role"], "system");
                Json(serde_json::json!({
                    "choices": [{ "message": { "content": "<think>x</think><content>ok</content>" } }]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client =
            ChatApiClient::new(format!("http://{addr}/v1/"), Some("key".into()), "test-model").unwrap();
        assert_eq!(client.ask("sys", "prompt").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn maps_unauthorized_status() {
        use axum::{Router, http::StatusCode, routing::post};

        let app = Router::new().route("/chat/completions", post(|| async { StatusCode::UNAUTHORIZED }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = ChatApiClient::new(format!("http://{addr}"), Some("key".into()), "m").unwrap();
        assert!(matches!(
            client.ask("sys", "prompt").await.unwrap_err(),
            ChatApiError::InvalidApiKey
        ));
    }
}
