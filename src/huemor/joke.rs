use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use huemor_model::ColourCard;

use super::config::Config;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

const MAX_JOKE_TOKENS: u32 = 150;
const JOKE_TEMPERATURE: f32 = 1.0;

const SYSTEM_PROMPT: &str = "You are a dad joke comedian. Given two colours with their \
    mood/energy descriptions, write ONE short, punny dad joke that combines both colours. \
    Keep it family-friendly, groan-worthy, and under 2 sentences. Return ONLY the joke, \
    nothing else.";

/// Served when the completion succeeds but comes back empty.
pub const BLANK_FALLBACK_JOKE: &str = "I'm drawing a blank... must be colour-blind!";
/// Served when the completion request fails outright.
pub const UPSTREAM_FALLBACK_JOKE: &str = "My joke generator is feeling blue... try again!";

#[derive(Debug, Clone, PartialEq)]
pub struct ColourDescription {
    pub name: String,
    pub mood: Option<String>,
}

impl ColourDescription {
    pub fn new(name: impl Into<String>, mood: Option<String>) -> Self {
        ColourDescription {
            name: name.into(),
            mood: mood.filter(|m| !m.trim().is_empty()),
        }
    }
}

impl From<&ColourCard> for ColourDescription {
    fn from(card: &ColourCard) -> Self {
        ColourDescription::new(card.name.as_str(), Some(card.mood.clone()))
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion API returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Seam towards the external text-completion capability.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// OpenAI Chat Completions REST transport.
pub struct OpenAiCompletion {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        OpenAiCompletion {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            temperature: JOKE_TEMPERATURE,
            max_tokens: MAX_JOKE_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let response = self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("failed to read error body"));
            return Err(CompletionError::Api { status, message });
        }
        let parsed: ChatCompletionResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

#[derive(Debug, Clone, PartialEq)]
pub struct JokeOutcome {
    pub joke: String,
    /// Upstream failed and the joke is the canned fallback.
    pub degraded: bool,
}

/// Facade over the completion capability: one outbound request per call,
/// every failure mapped to a fallback joke. Never errors across its boundary.
#[derive(Clone)]
pub struct JokeService {
    completion: Arc<dyn TextCompletion>,
}

impl JokeService {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        JokeService { completion }
    }

    pub fn openai(config: &Config) -> Self {
        let api_key = config.effective_openai_api_key();
        if api_key.is_empty() {
            warn!("No OpenAI API key configured - every joke will be a fallback");
        }
        JokeService::new(Arc::new(OpenAiCompletion::new(
            api_key,
            config.openai_model.clone(),
            config.joke_timeout(),
        )))
    }

    pub async fn generate(
        &self,
        first: &ColourDescription,
        second: &ColourDescription,
    ) -> JokeOutcome {
        let user = user_prompt(first, second);
        match self.completion.complete(SYSTEM_PROMPT, &user).await {
            Ok(text) => {
                let joke = text.trim();
                if joke.is_empty() {
                    JokeOutcome {
                        joke: BLANK_FALLBACK_JOKE.to_string(),
                        degraded: false,
                    }
                } else {
                    JokeOutcome {
                        joke: joke.to_string(),
                        degraded: false,
                    }
                }
            }
            Err(e) => {
                error!("Joke completion failed: {e:#}");
                JokeOutcome {
                    joke: UPSTREAM_FALLBACK_JOKE.to_string(),
                    degraded: true,
                }
            }
        }
    }
}

fn user_prompt(first: &ColourDescription, second: &ColourDescription) -> String {
    format!("Colour 1: {}\nColour 2: {}", describe(first), describe(second))
}

fn describe(colour: &ColourDescription) -> String {
    match &colour.mood {
        Some(mood) => format!("{} ({})", colour.name, mood),
        None => colour.name.clone(),
    }
}
