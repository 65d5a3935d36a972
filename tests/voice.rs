//! Voice pipeline integration tests
//!
//! Exercises segmentation and WAV encoding without audio hardware.

use std::io::Cursor;

use valet::config::VoiceConfig;
use valet::voice::{CAPTURE_SAMPLE_RATE, SegmenterPhase, UtteranceSegmenter, encode_wav};

/// Generate sine wave audio samples
fn sine(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (CAPTURE_SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / CAPTURE_SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (CAPTURE_SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

fn quick_config() -> VoiceConfig {
    VoiceConfig {
        wake_words: vec!["  Hey JARVIS  ".to_string(), "jarvis".to_string()],
        silence_duration: 0.5,
        ..VoiceConfig::default()
    }
}

#[test]
fn segmenter_starts_quiet_with_normalized_phrases() {
    let seg = UtteranceSegmenter::new(&quick_config());
    assert_eq!(seg.phase(), SegmenterPhase::Quiet);
    assert_eq!(seg.wake_phrases(), &["hey jarvis", "jarvis"]);
}

#[test]
fn silence_never_leaves_quiet() {
    let mut seg = UtteranceSegmenter::new(&quick_config());
    assert!(!seg.feed(&silence(0.1)));
    assert_eq!(seg.phase(), SegmenterPhase::Quiet);
}

#[test]
fn speech_then_silence_yields_a_segment() {
    let mut seg = UtteranceSegmenter::new(&quick_config());

    seg.feed(&sine(440.0, 0.5, 0.3));
    assert_eq!(seg.phase(), SegmenterPhase::Gathering);

    seg.feed(&sine(440.0, 0.3, 0.3));
    let complete = seg.feed(&silence(0.6));
    assert!(complete);

    let segment = seg.take_segment();
    assert!(!segment.is_empty());
}

#[test]
fn wake_confirmation_is_case_insensitive() {
    let mut seg = UtteranceSegmenter::new(&quick_config());

    assert!(!seg.confirm_wake("hello world"));
    assert_eq!(seg.phase(), SegmenterPhase::Quiet);

    assert!(seg.confirm_wake("HEY JARVIS, what time is it?"));
    assert_eq!(seg.phase(), SegmenterPhase::Engaged);
}

#[test]
fn failed_confirmation_drops_buffered_speech() {
    let mut seg = UtteranceSegmenter::new(&quick_config());
    seg.feed(&sine(440.0, 0.3, 0.3));

    assert!(!seg.confirm_wake("nothing relevant"));
    assert!(seg.take_segment().is_empty());
}

#[test]
fn engaged_phase_captures_the_command_utterance() {
    let mut seg = UtteranceSegmenter::new(&quick_config());
    seg.engage();

    let speech = sine(440.0, 0.5, 0.3);
    seg.feed(&speech);
    let complete = seg.feed(&silence(0.6));
    assert!(complete);
    assert_eq!(seg.phase(), SegmenterPhase::Engaged);
}

#[test]
fn reset_returns_to_quiet() {
    let mut seg = UtteranceSegmenter::new(&quick_config());
    seg.engage();
    seg.feed(&sine(440.0, 0.2, 0.3));

    seg.reset();
    assert_eq!(seg.phase(), SegmenterPhase::Quiet);
    assert!(seg.take_segment().is_empty());
}

#[test]
fn wav_encoding_produces_riff_header() {
    let samples = sine(440.0, 0.1, 0.5);
    let wav = encode_wav(&samples, CAPTURE_SAMPLE_RATE).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    assert!(wav.len() > 44);
}

#[test]
fn wav_roundtrips_through_hound() {
    let original: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav = encode_wav(&original, CAPTURE_SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, CAPTURE_SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded.len(), original.len());
}
