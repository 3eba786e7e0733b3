//! OpenAI chat-completions implementation of [`ModelGateway`].
//!
//! One request per call: no retries, no streaming, client default timeouts.
//! Images travel inline as base64 `data:` URLs.

use crate::domain::error::GatewayError;
use crate::domain::gateway::ModelGateway;
use crate::domain::models::ImageUpload;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

pub const SYSTEM_PROMPT: &str =
    "You are an expert astrologer providing spiritual and astrological guidance.";

const TEXT_TEMPERATURE: f64 = 0.7;
const TEXT_MAX_TOKENS: u32 = 500;
const VISION_MAX_TOKENS: u32 = 1000;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .finish()
    }
}

pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, request: &ChatCompletionRequest<'_>) -> Result<String, GatewayError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GatewayError::NotConfigured("OPENAI_API_KEY is not set".to_string())
        })?;

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model = request.model, "Upstream rejected completion");

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(GatewayError::RateLimited);
            }
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: upstream_error_message(&body),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let answer = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        debug!(model = request.model, answer_len = answer.len(), "Completion received");
        Ok(answer)
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    #[instrument(skip(self, prompt), fields(model = %self.config.text_model, prompt_len = prompt.len()))]
    async fn complete_text(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model: &self.config.text_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Text(prompt),
                },
            ],
            temperature: Some(TEXT_TEMPERATURE),
            max_tokens: TEXT_MAX_TOKENS,
        };

        self.send(&request).await
    }

    #[instrument(
        skip(self, image, prompt),
        fields(model = %self.config.vision_model, mime = %image.mime_type, image_bytes = image.bytes.len())
    )]
    async fn complete_vision(
        &self,
        image: &ImageUpload,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model: &self.config.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(image),
                        },
                    },
                ]),
            }],
            temperature: None,
            max_tokens: VISION_MAX_TOKENS,
        };

        self.send(&request).await
    }
}

fn data_url(image: &ImageUpload) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type,
        BASE64.encode(&image.bytes)
    )
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw text.
fn upstream_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}
