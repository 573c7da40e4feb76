//! Anthropic backend: Messages API with a native `document` content block.

use super::{auth_error, parse_failure, PaperProvider, MAX_OUTPUT_TOKENS};
use crate::error::FluffCutterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "Anthropic";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Document { source: DocumentSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Map an Anthropic error response to the library taxonomy.
///
/// The context-window rejection arrives as a 400 `invalid_request_error`
/// whose message reads "prompt is too long: N tokens > M maximum".
fn classify_error(status: u16, body: &str) -> FluffCutterError {
    let failure = parse_failure(body);
    if let Some(auth) = auth_error(PROVIDER, status, &failure) {
        return auth;
    }

    let msg = failure.message.to_ascii_lowercase();
    let token_limit = msg.contains("prompt is too long")
        || (msg.contains("token") && (msg.contains("too long") || msg.contains("exceed")));
    if token_limit {
        return FluffCutterError::TokenLimit {
            provider: PROVIDER.to_string(),
            detail: failure.message,
        };
    }

    FluffCutterError::Api {
        provider: PROVIDER.to_string(),
        status,
        message: failure.message,
    }
}

#[async_trait]
impl PaperProvider for AnthropicProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_paper(
        &self,
        pdf_base64: &str,
        _filename: &str,
        prompt: &str,
    ) -> Result<String, FluffCutterError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Document {
                        source: DocumentSource {
                            kind: "base64",
                            media_type: "application/pdf",
                            data: pdf_base64,
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        };

        debug!(model = %self.model, "sending Anthropic messages request");
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| FluffCutterError::Network {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FluffCutterError::Network {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            warn!(%status, "Anthropic API error");
            return Err(classify_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| FluffCutterError::MalformedResponse {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            })?;

        Ok(parsed
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
