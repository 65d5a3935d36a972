//! Configuration management
//!
//! Settings merge three layers with env > toml > default precedence. The
//! TOML file lives at `~/.config/valet/config.toml` and is a partial
//! overlay; every field has a working default so a bare `valet chat` with
//! only `ANTHROPIC_API_KEY` set does something sensible.

pub mod file;

use crate::personality::PersonalityConfig;
use crate::workflows::{HassConfig, HueConfig};

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM backend settings
    pub llm: LlmConfig,

    /// Voice pipeline settings
    pub voice: VoiceConfig,

    /// API keys for external services
    pub api_keys: ApiKeys,

    /// Personality tuning
    pub personality: PersonalityConfig,

    /// Home Assistant connection
    pub home_assistant: HassConfig,

    /// Philips Hue bridge connection
    pub hue: HueConfig,
}

/// LLM backend settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider name: "anthropic", "openai", or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Base URL for Ollama
    pub base_url: String,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Conversation turns kept in context (0 = unbounded)
    pub max_history: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: None,
            base_url: "http://localhost:11434".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            max_history: 20,
        }
    }
}

/// Voice pipeline settings
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// STT provider: "whisper" or "deepgram"
    pub stt_provider: String,

    /// STT model identifier
    pub stt_model: String,

    /// TTS provider: "openai" or "elevenlabs"
    pub tts_provider: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// Wake phrases that start an activation cycle
    pub wake_words: Vec<String>,

    /// RMS energy threshold for speech detection
    pub energy_threshold: f32,

    /// Seconds of silence that end an utterance
    pub silence_duration: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: "whisper".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_provider: "openai".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "onyx".to_string(),
            wake_words: vec!["jarvis".to_string(), "hey jarvis".to_string()],
            energy_threshold: 0.01,
            silence_duration: 1.2,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `Anthropic` API key (LLM)
    pub anthropic: Option<String>,

    /// `OpenAI` API key (LLM, Whisper, TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,
}

impl Config {
    /// Load configuration from the TOML file and environment
    #[must_use]
    pub fn load() -> Self {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            anthropic: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .or(fc.api_keys.anthropic),
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(fc.api_keys.elevenlabs),
            deepgram: std::env::var("DEEPGRAM_API_KEY")
                .ok()
                .or(fc.api_keys.deepgram),
        };

        let llm_defaults = LlmConfig::default();
        let provider = std::env::var("VALET_LLM_PROVIDER")
            .ok()
            .or(fc.llm.provider)
            .unwrap_or(llm_defaults.provider);
        let api_key = match provider.as_str() {
            "anthropic" => api_keys.anthropic.clone(),
            "openai" => api_keys.openai.clone(),
            _ => None,
        };
        let llm = LlmConfig {
            model: std::env::var("VALET_LLM_MODEL")
                .ok()
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            api_key,
            base_url: fc.llm.base_url.unwrap_or(llm_defaults.base_url),
            max_tokens: fc.llm.max_tokens.unwrap_or(llm_defaults.max_tokens),
            temperature: fc.llm.temperature.unwrap_or(llm_defaults.temperature),
            max_history: fc.llm.max_history.unwrap_or(llm_defaults.max_history),
            provider,
        };

        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(voice_defaults.enabled),
            stt_provider: fc.voice.stt_provider.unwrap_or(voice_defaults.stt_provider),
            stt_model: fc.voice.stt_model.unwrap_or(voice_defaults.stt_model),
            tts_provider: fc.voice.tts_provider.unwrap_or(voice_defaults.tts_provider),
            tts_model: fc.voice.tts_model.unwrap_or(voice_defaults.tts_model),
            tts_voice: fc.voice.tts_voice.unwrap_or(voice_defaults.tts_voice),
            wake_words: fc.voice.wake_words.unwrap_or(voice_defaults.wake_words),
            energy_threshold: fc
                .voice
                .energy_threshold
                .unwrap_or(voice_defaults.energy_threshold),
            silence_duration: fc
                .voice
                .silence_duration
                .unwrap_or(voice_defaults.silence_duration),
        };

        let mut personality = PersonalityConfig::default();
        if let Some(name) = fc.personality.name {
            personality.name = name;
        }
        if let Some(title) = fc.personality.user_title {
            personality.user_title = title;
        }
        if let Some(level) = fc.personality.sarcasm_level {
            personality.sarcasm_level = level;
        }
        if let Some(level) = fc.personality.formality_level {
            personality.formality_level = level;
        }
        if let Some(level) = fc.personality.warmth_level {
            personality.warmth_level = level;
        }
        if let Some(topics) = fc.personality.off_limits_topics {
            personality.off_limits_topics = topics;
        }

        let hass_env = HassConfig::from_env();
        let home_assistant = HassConfig {
            url: if std::env::var("HASS_URL").is_ok() {
                hass_env.url
            } else {
                fc.home_assistant.url.unwrap_or(hass_env.url)
            },
            token: std::env::var("HASS_TOKEN")
                .ok()
                .or(fc.home_assistant.token)
                .unwrap_or_default(),
        };

        let hue_env = HueConfig::from_env();
        let hue = HueConfig {
            bridge_ip: std::env::var("HUE_BRIDGE_IP")
                .ok()
                .or(fc.hue.bridge_ip)
                .unwrap_or_default(),
            bridge_port: if std::env::var("HUE_BRIDGE_PORT").is_ok() {
                hue_env.bridge_port
            } else {
                fc.hue.bridge_port.unwrap_or(hue_env.bridge_port)
            },
            username: std::env::var("HUE_USERNAME")
                .ok()
                .or(fc.hue.username)
                .unwrap_or_default(),
        };

        Self { llm, voice, api_keys, personality, home_assistant, hue }
    }
}
