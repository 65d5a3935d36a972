//! LLM conversation client
//!
//! A single [`LlmClient`] speaks to one of several chat-completion backends
//! (Anthropic, OpenAI, or a local Ollama instance) and keeps a bounded
//! conversation history. The [`LanguageModel`] trait is the seam the
//! orchestrator depends on, so tests can substitute a scripted model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::personality::{self, PersonalityConfig};

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of conversation, in the wire shape all three backends accept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Conversational language model seam
///
/// Implementations own their history. `generate_response` appends the user
/// turn and the model's reply before returning.
#[async_trait]
pub trait LanguageModel: Send {
    /// Produce a reply to `user_input` in the context of prior turns.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable or replies with a
    /// malformed or non-success payload.
    async fn generate_response(&mut self, user_input: &str) -> Result<String>;

    /// Drop all accumulated conversation turns.
    fn clear_history(&mut self);

    /// Human-readable backend name, for logging.
    fn name(&self) -> String;
}

/// Which hosted or local backend to call
#[derive(Debug)]
enum Backend {
    Anthropic { api_key: String },
    OpenAi { api_key: String },
    Ollama { base_url: String },
}

impl Backend {
    const fn label(&self) -> &'static str {
        match self {
            Self::Anthropic { .. } => "anthropic",
            Self::OpenAi { .. } => "openai",
            Self::Ollama { .. } => "ollama",
        }
    }
}

/// Chat client with personality-driven system prompt and bounded history
#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    backend: Backend,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_history: usize,
    personality: PersonalityConfig,
    history: Vec<ChatMessage>,
}

impl LlmClient {
    /// Build a client for the backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Llm`] when the provider name is unknown or the
    /// required API key is missing.
    pub fn new(config: &LlmConfig, personality: PersonalityConfig) -> Result<Self> {
        let backend = match config.provider.as_str() {
            "anthropic" => Backend::Anthropic {
                api_key: config
                    .api_key
                    .clone()
                    .ok_or_else(|| Error::Llm("anthropic requires an API key".to_string()))?,
            },
            "openai" => Backend::OpenAi {
                api_key: config
                    .api_key
                    .clone()
                    .ok_or_else(|| Error::Llm("openai requires an API key".to_string()))?,
            },
            "ollama" => Backend::Ollama {
                base_url: config.base_url.trim_end_matches('/').to_string(),
            },
            other => {
                return Err(Error::Llm(format!("unknown LLM provider: {other}")));
            }
        };

        Ok(Self {
            http: reqwest::Client::new(),
            backend,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_history: config.max_history,
            personality,
            history: Vec::new(),
        })
    }

    fn trim_history(&mut self) {
        if self.max_history > 0 && self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    async fn complete(&self, system_prompt: &str) -> Result<String> {
        match &self.backend {
            Backend::Anthropic { api_key } => {
                self.complete_anthropic(api_key, system_prompt).await
            }
            Backend::OpenAi { api_key } => self.complete_openai(api_key, system_prompt).await,
            Backend::Ollama { base_url } => self.complete_ollama(base_url, system_prompt).await,
        }
    }

    async fn complete_anthropic(&self, api_key: &str, system_prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Reply {
            content: Vec<ContentBlock>,
        }
        #[derive(Deserialize)]
        struct ContentBlock {
            text: String,
        }

        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": system_prompt,
                "messages": self.history,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("anthropic returned {status}: {body}")));
        }

        let reply: Reply = response.json().await?;
        reply
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| Error::Llm("anthropic reply had no content".to_string()))
    }

    async fn complete_openai(&self, api_key: &str, system_prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Reply {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let mut messages = vec![ChatMessage { role: Role::System, content: system_prompt.to_string() }];
        messages.extend(self.history.iter().cloned());

        let response = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": messages,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("openai returned {status}: {body}")));
        }

        let reply: Reply = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Llm("openai reply had no choices".to_string()))
    }

    async fn complete_ollama(&self, base_url: &str, system_prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Reply {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let mut messages = vec![ChatMessage { role: Role::System, content: system_prompt.to_string() }];
        messages.extend(self.history.iter().cloned());

        let response = self
            .http
            .post(format!("{base_url}/api/chat"))
            .json(&json!({
                "model": self.model,
                "stream": false,
                "options": { "temperature": self.temperature },
                "messages": messages,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Llm(format!("ollama returned {status}")));
        }

        let reply: Reply = response.json().await?;
        Ok(reply.message.content)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate_response(&mut self, user_input: &str) -> Result<String> {
        // Regenerated each call so the embedded clock stays current.
        let system_prompt = personality::generate_system_prompt(&self.personality);

        self.history.push(ChatMessage::user(user_input));
        self.trim_history();

        debug!(
            backend = self.backend.label(),
            model = %self.model,
            turns = self.history.len(),
            "requesting completion"
        );

        match self.complete(&system_prompt).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                self.trim_history();
                Ok(reply)
            }
            Err(err) => {
                warn!(backend = self.backend.label(), error = %err, "completion failed");
                // The failed turn stays out of history so a retry starts clean.
                self.history.pop();
                Err(err)
            }
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> String {
        format!("{}/{}", self.backend.label(), self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn ollama_client(max_history: usize) -> LlmClient {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            max_history,
            ..LlmConfig::default()
        };
        LlmClient::new(&config, PersonalityConfig::default()).unwrap()
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = LlmConfig { provider: "skynet".to_string(), ..LlmConfig::default() };
        let err = LlmClient::new(&config, PersonalityConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unknown LLM provider"));
    }

    #[test]
    fn anthropic_without_key_is_rejected() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            api_key: None,
            ..LlmConfig::default()
        };
        assert!(LlmClient::new(&config, PersonalityConfig::default()).is_err());
    }

    #[test]
    fn history_trims_oldest_turns() {
        let mut client = ollama_client(4);
        for i in 0..10 {
            client.history.push(ChatMessage::user(format!("turn {i}")));
        }
        client.trim_history();
        assert_eq!(client.history.len(), 4);
        assert_eq!(client.history[0].content, "turn 6");
    }

    #[test]
    fn zero_max_history_means_unbounded() {
        let mut client = ollama_client(0);
        for i in 0..50 {
            client.history.push(ChatMessage::user(format!("turn {i}")));
        }
        client.trim_history();
        assert_eq!(client.history.len(), 50);
    }

    #[test]
    fn clear_history_empties_the_transcript() {
        let mut client = ollama_client(10);
        client.history.push(ChatMessage::user("hello"));
        client.clear_history();
        assert!(client.history.is_empty());
    }

    #[test]
    fn backend_name_includes_model() {
        let client = ollama_client(10);
        assert!(client.name().starts_with("ollama/"));
    }
}
