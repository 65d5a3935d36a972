//! Wake phrase detection and utterance segmentation
//!
//! Local processing is energy-only: RMS gating decides when speech starts
//! and when silence ends it. The wake phrase itself is verified against the
//! STT transcript, so the segmenter never needs a local speech model.

use crate::config::VoiceConfig;
use crate::voice::CAPTURE_SAMPLE_RATE;

/// Minimum speech length before a segment counts (0.3 s at 16 kHz)
const MIN_SPEECH_SAMPLES: usize = 4_800;

/// Where the segmenter is in an activation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterPhase {
    /// Waiting for energy above the threshold
    Quiet,
    /// Accumulating a candidate wake phrase segment
    Gathering,
    /// Wake phrase confirmed, capturing the command utterance
    Engaged,
}

/// Energy-gated speech segmenter with transcript-verified wake phrases
pub struct UtteranceSegmenter {
    wake_phrases: Vec<String>,
    energy_threshold: f32,
    silence_samples: usize,
    phase: SegmenterPhase,
    speech: Vec<f32>,
    silence_run: usize,
}

impl UtteranceSegmenter {
    /// Build a segmenter from voice settings.
    ///
    /// Wake phrases are lowercased and trimmed so transcript checks are
    /// case-insensitive.
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        let wake_phrases: Vec<String> = config
            .wake_words
            .iter()
            .map(|w| w.to_lowercase().trim().to_string())
            .collect();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let silence_samples =
            (config.silence_duration.max(0.0) * CAPTURE_SAMPLE_RATE as f32) as usize;

        tracing::debug!(
            wake_phrases = ?wake_phrases,
            energy_threshold = config.energy_threshold,
            silence_samples,
            "segmenter initialized"
        );

        Self {
            wake_phrases,
            energy_threshold: config.energy_threshold,
            silence_samples,
            phase: SegmenterPhase::Quiet,
            speech: Vec::new(),
            silence_run: 0,
        }
    }

    /// Feed a chunk of samples. Returns true when a complete speech segment
    /// (speech followed by sustained silence) is ready for transcription.
    pub fn feed(&mut self, samples: &[f32]) -> bool {
        let loud = rms_energy(samples) > self.energy_threshold;

        match self.phase {
            SegmenterPhase::Quiet => {
                if loud {
                    self.phase = SegmenterPhase::Gathering;
                    self.speech.clear();
                    self.speech.extend_from_slice(samples);
                    self.silence_run = 0;
                }
                false
            }
            SegmenterPhase::Gathering | SegmenterPhase::Engaged => {
                self.speech.extend_from_slice(samples);
                if loud {
                    self.silence_run = 0;
                } else {
                    self.silence_run += samples.len();
                }

                if self.silence_run > self.silence_samples {
                    if self.speech.len() > MIN_SPEECH_SAMPLES + self.silence_run {
                        return true;
                    }
                    // All silence, no real speech. Start over.
                    if self.phase == SegmenterPhase::Gathering {
                        self.reset();
                    }
                }
                false
            }
        }
    }

    /// Verify a wake phrase in the STT transcript of a gathered segment.
    ///
    /// On a match the segmenter moves to [`SegmenterPhase::Engaged`];
    /// otherwise it resets to quiet.
    pub fn confirm_wake(&mut self, transcript: &str) -> bool {
        let lowered = transcript.to_lowercase();
        for phrase in &self.wake_phrases {
            if lowered.contains(phrase.as_str()) {
                tracing::info!(phrase, transcript, "wake phrase confirmed");
                self.phase = SegmenterPhase::Engaged;
                self.speech.clear();
                self.silence_run = 0;
                return true;
            }
        }
        self.reset();
        false
    }

    /// Skip wake detection entirely, as the keyboard trigger does.
    pub const fn engage(&mut self) {
        self.phase = SegmenterPhase::Engaged;
        self.silence_run = 0;
    }

    /// Take the accumulated speech segment, leaving the buffer empty.
    pub fn take_segment(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech)
    }

    /// Return to quiet and drop any buffered speech.
    pub fn reset(&mut self) {
        self.phase = SegmenterPhase::Quiet;
        self.speech.clear();
        self.silence_run = 0;
    }

    #[must_use]
    pub const fn phase(&self) -> SegmenterPhase {
        self.phase
    }

    #[must_use]
    pub fn wake_phrases(&self) -> &[String] {
        &self.wake_phrases
    }
}

/// RMS energy of a sample chunk
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> UtteranceSegmenter {
        UtteranceSegmenter::new(&VoiceConfig::default())
    }

    #[test]
    fn silence_has_near_zero_energy() {
        assert!(rms_energy(&vec![0.0_f32; 256]) < 0.001);
        assert!(rms_energy(&vec![0.5_f32; 256]) > 0.4);
    }

    #[test]
    fn quiet_until_energy_crosses_threshold() {
        let mut seg = segmenter();
        assert!(!seg.feed(&vec![0.0_f32; 1600]));
        assert_eq!(seg.phase(), SegmenterPhase::Quiet);

        seg.feed(&vec![0.5_f32; 1600]);
        assert_eq!(seg.phase(), SegmenterPhase::Gathering);
    }

    #[test]
    fn speech_then_silence_completes_a_segment() {
        let mut seg = segmenter();
        // Half a second of speech.
        for _ in 0..5 {
            assert!(!seg.feed(&vec![0.5_f32; 1600]));
        }
        // Feed silence until the configured gap elapses.
        let mut done = false;
        for _ in 0..30 {
            if seg.feed(&vec![0.0_f32; 1600]) {
                done = true;
                break;
            }
        }
        assert!(done);
        assert!(seg.take_segment().len() > MIN_SPEECH_SAMPLES);
    }

    #[test]
    fn wake_phrase_check_is_case_insensitive() {
        let mut seg = segmenter();
        assert!(seg.confirm_wake("Hey JARVIS, lights please"));
        assert_eq!(seg.phase(), SegmenterPhase::Engaged);
    }

    #[test]
    fn non_wake_transcript_resets_to_quiet() {
        let mut seg = segmenter();
        seg.feed(&vec![0.5_f32; 1600]);
        assert!(!seg.confirm_wake("just some chatter"));
        assert_eq!(seg.phase(), SegmenterPhase::Quiet);
        assert!(seg.take_segment().is_empty());
    }

    #[test]
    fn engage_skips_wake_detection() {
        let mut seg = segmenter();
        seg.engage();
        assert_eq!(seg.phase(), SegmenterPhase::Engaged);
    }
}
