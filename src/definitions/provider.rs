use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::settings::ProviderSettings;

const USER_AGENT: &str = concat!("lectern/", env!("CARGO_PKG_VERSION"));

const SYSTEM_PROMPT: &str =
    "You are an English teacher explaining vocabulary to language learners.";

/// External capability that explains a word, given the text around it.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    async fn explain(&self, word: &str, context: &str) -> Result<String, ProviderError>;
}

/// Asks a chat-completions endpoint to explain a word.
#[derive(Clone)]
pub struct ChatDefinitionProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl ChatDefinitionProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(client_build_error)?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
        })
    }

    fn request_body(&self, word: &str, context: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(word, context) },
            ],
        })
    }
}

/// A client that cannot be built is a configuration problem, not a network one.
fn client_build_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Api(format!("Failed to build HTTP client: {err}"))
}

pub fn build_prompt(word: &str, context: &str) -> String {
    let mut prompt = format!("Explain the word \"{word}\" in simple English.\n");
    if !context.trim().is_empty() {
        prompt.push_str(&format!("Context: \"{context}\"\n"));
    }
    prompt.push_str(
        "Provide:\n\
         1. Definition\n\
         2. Part of speech\n\
         3. Example sentences\n\
         4. Synonyms if applicable",
    );
    prompt
}

/// Pull the assistant message out of a chat-completions response.
pub fn extract_explanation(json: &Value) -> Result<String, ProviderError> {
    let content = json["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::trim)
        .unwrap_or_default();

    if content.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(content.to_string())
}

#[async_trait]
impl DefinitionProvider for ChatDefinitionProvider {
    async fn explain(&self, word: &str, context: &str) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Authentication);
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(word, context))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::Authentication);
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("HTTP {status}")));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("Failed to parse response: {e}")))?;

        extract_explanation(&json)
    }
}
