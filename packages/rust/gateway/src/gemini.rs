//! Gemini `generateContent` client.

use std::time::Duration;

use contentagent_shared::{ContentAgentError, GeminiSettings, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::Gateway;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("ContentAgent/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Combine the `[gemini]` config section with a resolved API key.
    pub fn from_settings(settings: &GeminiSettings, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// HTTP client for the Gemini text-generation API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let endpoint = endpoint_url(&config.base_url, &config.model)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContentAgentError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn send(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        info!("requesting generation");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentAgentError::gateway(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ContentAgentError::gateway(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "generation request rejected");
            return Err(ContentAgentError::gateway(format!(
                "HTTP {status}: {}",
                truncate(&body, 300)
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ContentAgentError::gateway(format!("malformed response body: {e}")))?;

        let text = parsed.text();
        if text.trim().is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no text in response".into());
            return Err(ContentAgentError::gateway(format!(
                "empty generation: {reason}"
            )));
        }

        debug!(response_len = text.len(), "generation received");
        Ok(text)
    }
}

impl Gateway for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.send(prompt).await
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `{base_url}/v1beta/models/{model}:generateContent`
fn endpoint_url(base_url: &str, model: &str) -> Result<Url> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    let base = Url::parse(&base)
        .map_err(|e| ContentAgentError::config(format!("invalid Gemini base URL {base_url:?}: {e}")))?;

    base.join(&format!("v1beta/models/{model}:generateContent"))
        .map_err(|e| ContentAgentError::config(format!("invalid Gemini model {model:?}: {e}")))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn endpoint_is_built_from_base_and_model() {
        let url = endpoint_url("https://example.com/", "gemini-1.5-flash").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/v1beta/models/gemini-1.5-flash:generateContent"
        );

        let proxied = endpoint_url("https://proxy.local/gemini", "m").unwrap();
        assert_eq!(
            proxied.as_str(),
            "https://proxy.local/gemini/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = endpoint_url("not a url", "m").unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn config_from_settings_copies_fields() {
        let settings = GeminiSettings::default();
        let config = GeminiConfig::from_settings(&settings, "k");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.model, settings.model);
        assert_eq!(config.timeout_secs, settings.timeout_secs);
    }

    #[tokio::test]
    async fn generate_concatenates_parts_of_first_candidate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Say hi"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"parts": [{"text": "{\"a\": "}, {"text": "1}"}]}},
                    {"content": {"parts": [{"text": "ignored"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).generate("Say hi").await.unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[tokio::test]
    async fn non_success_status_is_gateway_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert_eq!(err.kind(), "gateway_failure");
        let msg = err.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("backend exploded"), "got: {msg}");
    }

    #[tokio::test]
    async fn empty_candidates_are_gateway_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [],
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert_eq!(err.kind(), "gateway_failure");
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn non_json_body_is_gateway_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert_eq!(err.kind(), "gateway_failure");
    }

    #[tokio::test]
    async fn unreachable_backend_is_gateway_failure() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "k".into(),
            model: "m".into(),
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = client.generate("x").await.unwrap_err();
        assert_eq!(err.kind(), "gateway_failure");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 10), "short");
    }
}
