//! TOML configuration file loading
//!
//! Supports `~/.config/valet/config.toml` as a persistent config source.
//! All fields are optional, the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::personality::{FormalityLevel, SarcasmLevel, WarmthLevel};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ValetConfigFile {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Personality tuning
    #[serde(default)]
    pub personality: PersonalityFileConfig,

    /// Home Assistant connection
    #[serde(default)]
    pub home_assistant: HassFileConfig,

    /// Philips Hue bridge connection
    #[serde(default)]
    pub hue: HueFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Preferred provider ("anthropic", "openai", "ollama")
    pub provider: Option<String>,

    /// Model identifier (e.g. "claude-sonnet-4-20250514")
    pub model: Option<String>,

    /// Ollama base URL
    pub base_url: Option<String>,

    /// Max tokens per completion
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Conversation turns kept in context (0 = unbounded)
    pub max_history: Option<usize>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "onyx", or an ElevenLabs voice id)
    pub tts_voice: Option<String>,

    /// Wake phrases that start an activation cycle
    pub wake_words: Option<Vec<String>>,

    /// RMS energy threshold for speech detection
    pub energy_threshold: Option<f32>,

    /// Seconds of silence that end an utterance
    pub silence_duration: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Personality overlay (only levels and name, full tuning via defaults)
#[derive(Debug, Default, Deserialize)]
pub struct PersonalityFileConfig {
    pub name: Option<String>,
    pub user_title: Option<String>,
    pub sarcasm_level: Option<SarcasmLevel>,
    pub formality_level: Option<FormalityLevel>,
    pub warmth_level: Option<WarmthLevel>,
    pub off_limits_topics: Option<Vec<String>>,
}

/// Home Assistant connection overlay
#[derive(Debug, Default, Deserialize)]
pub struct HassFileConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Philips Hue bridge overlay
#[derive(Debug, Default, Deserialize)]
pub struct HueFileConfig {
    pub bridge_ip: Option<String>,
    pub bridge_port: Option<u16>,
    pub username: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ValetConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ValetConfigFile {
    let Some(path) = config_file_path() else {
        return ValetConfigFile::default();
    };

    if !path.exists() {
        return ValetConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ValetConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ValetConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/valet/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("valet").join("config.toml"))
}
