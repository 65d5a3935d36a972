//! Text-to-speech synthesis

use serde_json::json;

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    OpenAi,
    ElevenLabs,
}

/// Synthesizes MP3 speech through a cloud TTS provider
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Build the synthesizer named by `config.tts_provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the provider is unknown or its API key
    /// is missing.
    pub fn from_config(config: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (provider, api_key) = match config.tts_provider.as_str() {
            "openai" => (
                TtsProvider::OpenAi,
                keys.openai
                    .clone()
                    .ok_or_else(|| Error::Config("OpenAI API key required for TTS".to_string()))?,
            ),
            "elevenlabs" => (
                TtsProvider::ElevenLabs,
                keys.elevenlabs
                    .clone()
                    .ok_or_else(|| Error::Config("ElevenLabs API key required".to_string()))?,
            ),
            other => {
                return Err(Error::Config(format!("unknown TTS provider: {other}")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            provider,
        })
    }

    /// Synthesize `text` and return MP3 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tts`] when the provider replies with a non-success
    /// status, or a transport error otherwise.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
                "voice": self.voice,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "model_id": self.model,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_key() {
        assert!(TextToSpeech::from_config(&VoiceConfig::default(), &ApiKeys::default()).is_err());
    }

    #[test]
    fn elevenlabs_selection_uses_elevenlabs_key() {
        let config = VoiceConfig {
            tts_provider: "elevenlabs".to_string(),
            tts_model: "eleven_monolingual_v1".to_string(),
            ..VoiceConfig::default()
        };
        let keys = ApiKeys { elevenlabs: Some("el-test".to_string()), ..ApiKeys::default() };
        assert!(TextToSpeech::from_config(&config, &keys).is_ok());
    }
}
