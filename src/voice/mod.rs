//! Voice pipeline
//!
//! Microphone capture, energy-gated utterance segmentation, cloud STT/TTS,
//! and speaker playback. The orchestrator in `assistant.rs` drives these
//! pieces through one activation cycle at a time.

mod capture;
mod playback;
mod stt;
mod tts;
mod wake_word;

pub use capture::{CAPTURE_SAMPLE_RATE, Microphone, encode_wav};
pub use playback::Speaker;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use wake_word::{SegmenterPhase, UtteranceSegmenter};
