pub mod prompts;

#[cfg(feature = "ai-providers")]
pub mod mistral;

pub use prompts::{
    format_summary, support_link, support_links, PromptBuilder, SummaryCache, SYSTEM_PROMPT,
};

#[cfg(feature = "ai-providers")]
pub use mistral::MistralProvider;

use crate::config::AiSettings;
use std::time::Duration;

pub const AI_ERROR_PREFIX: &str = "⚠️ AI Error:";

/// Error text fragments that mark a failure as worth retrying.
const TRANSIENT_MARKERS: [&str; 7] = [
    "rate limit",
    "timeout",
    "connection",
    "reset",
    "429",
    "capacity",
    "10054",
];

pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Bounded retry with linear backoff: the wait after attempt `n` (0-based)
/// is `backoff * (n + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&AiSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &AiSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff: Duration::from_secs(settings.backoff_secs),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * (attempt + 1)
    }
}

#[cfg(feature = "ai-providers")]
pub use provider::*;

#[cfg(feature = "ai-providers")]
mod provider {
    use super::{format_summary, is_transient_message, MistralProvider, RetryPolicy, AI_ERROR_PREFIX, SYSTEM_PROMPT};
    use crate::config::Config;
    use thiserror::Error;
    use tracing::{error, info, warn};

    #[derive(Error, Debug)]
    pub enum AIError {
        #[error("API request failed: {0}")]
        RequestError(#[from] reqwest::Error),
        #[error("Invalid response: {0}")]
        InvalidResponse(String),
        #[error("Authentication failed")]
        AuthenticationError,
        #[error("Rate limited")]
        RateLimited,
        #[error("{0} not found in environment.")]
        MissingApiKey(String),
        #[error("Provider not supported: {0}")]
        UnsupportedProvider(String),
    }

    impl AIError {
        pub fn is_transient(&self) -> bool {
            match self {
                AIError::RateLimited => true,
                AIError::RequestError(e) => {
                    e.is_timeout() || e.is_connect() || is_transient_message(&e.to_string())
                }
                AIError::InvalidResponse(msg) => is_transient_message(msg),
                AIError::AuthenticationError
                | AIError::MissingApiKey(_)
                | AIError::UnsupportedProvider(_) => false,
            }
        }
    }

    /// Text-in, text-out chat completion.
    #[async_trait::async_trait]
    pub trait AIProvider: Send + Sync {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AIError>;
        fn get_provider_name(&self) -> &str;
    }

    pub fn create_provider(config: &Config) -> Result<Box<dyn AIProvider>, AIError> {
        build_provider(config, config.get_api_key())
    }

    pub(super) fn build_provider(
        config: &Config,
        api_key: Option<String>,
    ) -> Result<Box<dyn AIProvider>, AIError> {
        match config.ai.provider.to_lowercase().as_str() {
            "mistral" => {
                let api_key = api_key.ok_or_else(|| AIError::MissingApiKey(config.api_key_var()))?;
                Ok(Box::new(MistralProvider::from_settings(api_key, &config.ai)))
            }
            other => Err(AIError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Never fails: the result is either a formatted summary or a string
    /// starting with a warning marker.
    pub async fn summarize(provider: &dyn AIProvider, prompt: &str, policy: &RetryPolicy) -> String {
        let name = provider.get_provider_name().to_string();

        for attempt in 0..policy.max_attempts {
            info!("Requesting {} summary (attempt {}/{})", name, attempt + 1, policy.max_attempts);
            match provider.complete(SYSTEM_PROMPT, prompt).await {
                Ok(text) => return format_summary(&text, prompt),
                Err(e) if e.is_transient() => {
                    warn!("Transient {} failure on attempt {}: {}", name, attempt + 1, e);
                    if attempt + 1 < policy.max_attempts {
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                    }
                }
                Err(e) => {
                    error!("{} request failed: {}", name, e);
                    return format!("{} {}", AI_ERROR_PREFIX, e);
                }
            }
        }

        error!("{} still unreachable after {} attempts", name, policy.max_attempts);
        format!("⚠️ {} API connection issue persisted.", name)
    }

    /// Builds the configured provider and summarizes with its retry policy.
    pub async fn summarize_with_config(config: &Config, prompt: &str) -> String {
        match create_provider(config) {
            Ok(provider) => {
                summarize(provider.as_ref(), prompt, &RetryPolicy::from_settings(&config.ai)).await
            }
            Err(e) => {
                error!("Cannot create AI provider: {}", e);
                format!("{} {}", AI_ERROR_PREFIX, e)
            }
        }
    }
}
