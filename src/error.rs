//! Error types for the valet assistant

use thiserror::Error;

/// Result type alias for valet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the valet assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credentials, unparseable config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Language model error
    #[error("llm error: {0}")]
    Llm(String),

    /// Workflow error
    #[error("workflow error: {0}")]
    Workflow(String),

    /// Home Assistant API error
    #[error("home assistant error: {0}")]
    HomeAssistant(String),

    /// Philips Hue bridge error
    #[error("hue bridge error: {0}")]
    Hue(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
