use crate::ai_provider::{AIError, AIProvider};
use crate::config::AiSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const CHAT_COMPLETIONS_URL: &str = "https://api.mistral.ai/v1/chat/completions";

#[derive(Debug, Serialize)]
struct MistralRequest {
    model: String,
    messages: Vec<MistralMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct MistralMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MistralResponse {
    choices: Vec<MistralChoice>,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralResponseMessage,
}

#[derive(Debug, Deserialize)]
struct MistralResponseMessage {
    content: String,
}

pub struct MistralProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl MistralProvider {
    pub fn new(api_key: String) -> Self {
        Self::from_settings(api_key, &AiSettings::default())
    }

    pub fn from_settings(api_key: String, settings: &AiSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout))
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl AIProvider for MistralProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AIError> {
        info!("Sending Mistral request with model: {}", self.model);
        debug!("User prompt is {} chars", user_prompt.chars().count());

        let request = MistralRequest {
            model: self.model.clone(),
            messages: vec![
                MistralMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                MistralMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send Mistral request: {}", e);
                AIError::RequestError(e)
            })?;

        debug!("Mistral response status: {}", response.status());

        if response.status() == 401 {
            error!("Mistral authentication failed");
            return Err(AIError::AuthenticationError);
        }

        if response.status() == 429 {
            warn!("Mistral rate limit exceeded");
            return Err(AIError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Mistral API error: {} - {}", status, error_text);
            return Err(AIError::InvalidResponse(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: MistralResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Mistral response: {}", e);
            AIError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AIError::InvalidResponse("No choices in response".to_string()))
    }

    fn get_provider_name(&self) -> &str {
        "Mistral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_settings() {
        let provider = MistralProvider::new("key".to_string());
        assert_eq!(provider.model(), "mistral-large-latest");
        assert_eq!(provider.get_provider_name(), "Mistral");

        let provider = provider.with_model("mistral-small-latest".to_string());
        assert_eq!(provider.model(), "mistral-small-latest");
    }

    #[test]
    fn test_request_shape() {
        let request = MistralRequest {
            model: "mistral-large-latest".to_string(),
            messages: vec![MistralMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.2,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mistral-large-latest");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#;
        let parsed: MistralResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "ok");
    }
}
