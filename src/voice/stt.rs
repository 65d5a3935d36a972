//! Speech-to-text transcription

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

#[derive(serde::Deserialize)]
struct WhisperReply {
    text: String,
}

#[derive(serde::Deserialize)]
struct DeepgramReply {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes WAV audio through a cloud STT provider
#[derive(Debug)]
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Build the transcriber named by `config.stt_provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the provider is unknown or its API key
    /// is missing.
    pub fn from_config(config: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (provider, api_key) = match config.stt_provider.as_str() {
            "whisper" => (
                SttProvider::Whisper,
                keys.openai
                    .clone()
                    .ok_or_else(|| Error::Config("OpenAI API key required for Whisper".to_string()))?,
            ),
            "deepgram" => (
                SttProvider::Deepgram,
                keys.deepgram
                    .clone()
                    .ok_or_else(|| Error::Config("Deepgram API key required".to_string()))?,
            ),
            other => {
                return Err(Error::Config(format!("unknown STT provider: {other}")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.stt_model.clone(),
            provider,
        })
    }

    /// Transcribe WAV bytes to text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stt`] when the provider replies with a non-success
    /// status, or a transport/parse error otherwise.
    pub async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(wav).await,
            SttProvider::Deepgram => self.transcribe_deepgram(wav).await,
        }
    }

    async fn transcribe_whisper(&self, wav: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let reply: WhisperReply = response.json().await?;
        tracing::info!(transcript = %reply.text, "transcription complete");
        Ok(reply.text)
    }

    async fn transcribe_deepgram(&self, wav: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(wav.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let reply: DeepgramReply = response.json().await?;
        let transcript = reply
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whisper_requires_openai_key() {
        let config = VoiceConfig::default();
        let keys = ApiKeys::default();
        assert!(SpeechToText::from_config(&config, &keys).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = VoiceConfig { stt_provider: "carrier-pigeon".to_string(), ..VoiceConfig::default() };
        let keys = ApiKeys { openai: Some("sk-test".to_string()), ..ApiKeys::default() };
        let err = SpeechToText::from_config(&config, &keys).unwrap_err();
        assert!(err.to_string().contains("unknown STT provider"));
    }

    #[test]
    fn deepgram_selection_uses_deepgram_key() {
        let config = VoiceConfig {
            stt_provider: "deepgram".to_string(),
            stt_model: "nova-2".to_string(),
            ..VoiceConfig::default()
        };
        let keys = ApiKeys { deepgram: Some("dg-test".to_string()), ..ApiKeys::default() };
        assert!(SpeechToText::from_config(&config, &keys).is_ok());
    }
}
