//! OpenAI backend: Responses API with a native `input_file` part.
//!
//! The Responses API (not chat completions) is the endpoint that accepts
//! PDFs as data URLs without a prior file upload.

use super::{auth_error, parse_failure, pdf_data_url, PaperProvider};
use crate::error::FluffCutterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
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
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: Vec<InputPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputPart<'a> {
    InputFile { filename: &'a str, file_data: String },
    InputText { text: &'a str },
}

#[derive(Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputPart>,
}

#[derive(Deserialize)]
struct OutputPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Map an OpenAI error response to the library taxonomy.
///
/// The context-window rejection carries `code: "context_length_exceeded"`;
/// oversized uploads can also bounce with a 413 before reaching the model.
fn classify_error(status: u16, body: &str) -> FluffCutterError {
    let failure = parse_failure(body);
    if let Some(auth) = auth_error(PROVIDER, status, &failure) {
        return auth;
    }

    let msg = failure.message.to_ascii_lowercase();
    let token_limit = failure.code == "context_length_exceeded"
        || status == 413
        || msg.contains("context length")
        || msg.contains("maximum context")
        || (msg.contains("token") && msg.contains("exceed"));
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

/// Concatenate every `output_text` part of the response.
fn extract_text(envelope: ResponsesEnvelope) -> String {
    envelope
        .output
        .into_iter()
        .flat_map(|item| item.content)
        .filter(|part| part.kind == "output_text")
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl PaperProvider for OpenAiProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_paper(
        &self,
        pdf_base64: &str,
        filename: &str,
        prompt: &str,
    ) -> Result<String, FluffCutterError> {
        let request = ResponsesRequest {
            model: &self.model,
            input: vec![InputMessage {
                role: "user",
                content: vec![
                    InputPart::InputFile {
                        filename,
                        file_data: pdf_data_url(pdf_base64),
                    },
                    InputPart::InputText { text: prompt },
                ],
            }],
        };

        debug!(model = %self.model, "sending OpenAI responses request");
        let response = self
            .client
            .post(RESPONSES_URL)
            .bearer_auth(&self.api_key)
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
            warn!(%status, "OpenAI API error");
            return Err(classify_error(status.as_u16(), &body));
        }

        let parsed: ResponsesEnvelope =
            serde_json::from_str(&body).map_err(|e| FluffCutterError::MalformedResponse {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            })?;

        Ok(extract_text(parsed))
    }
}
