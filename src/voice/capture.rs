//! Microphone capture

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture sample rate, 16 kHz mono as speech APIs expect
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Streams 16 kHz mono audio from the default input device into a shared
/// buffer. The cpal stream runs on its own thread; callers drain the buffer
/// from the async side with [`Microphone::drain`].
pub struct Microphone {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl Microphone {
    /// Open the default input device at 16 kHz mono.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] when no input device exists or none of its
    /// configs supports 16 kHz mono.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(CAPTURE_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(CAPTURE_SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no 16 kHz mono input config".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(CAPTURE_SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = CAPTURE_SAMPLE_RATE,
            "microphone opened"
        );

        Ok(Self { config, buffer: Arc::new(Mutex::new(Vec::new())), stream: None })
    }

    /// Start streaming samples into the shared buffer. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] when the input stream cannot be built or
    /// started.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let buffer = Arc::clone(&self.buffer);
        let config = self.config.clone();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "microphone stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        tracing::debug!("capture started");
        Ok(())
    }

    /// Stop streaming and drop the cpal stream.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("capture stopped");
        }
    }

    /// Take everything captured since the last drain.
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Discard any buffered samples.
    pub fn discard(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Whether the input stream is live.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

/// Encode f32 samples as 16-bit PCM WAV bytes for the STT APIs
///
/// # Errors
///
/// Returns [`Error::Audio`] if WAV encoding fails.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(pcm).map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_carries_sample_rate() {
        let samples = vec![0.0_f32; 160];
        let wav = encode_wav(&samples, CAPTURE_SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(rate, CAPTURE_SAMPLE_RATE);
    }

    #[test]
    fn full_scale_sample_clamps_to_i16_range() {
        let wav = encode_wav(&[1.5, -1.5], 16_000).unwrap();
        let data = &wav[44..];
        let first = i16::from_le_bytes([data[0], data[1]]);
        let second = i16::from_le_bytes([data[2], data[3]]);
        assert_eq!(first, 32767);
        assert_eq!(second, -32768);
    }
}
