//! Conversation orchestrator
//!
//! Routes every utterance through the workflow registry first and falls back
//! to the language model for anything the workflows cannot handle. The
//! response path is infallible: whatever goes wrong internally, the caller
//! always gets a speakable sentence back.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::llm::{LanguageModel, LlmClient};
use crate::voice::{
    CAPTURE_SAMPLE_RATE, Microphone, SegmenterPhase, Speaker, SpeechToText, TextToSpeech,
    UtteranceSegmenter, encode_wav,
};
use crate::workflows::{self, WorkflowManager, WorkflowStatus, extract_entities};
use crate::{Error, Result};

/// Spoken when an internal error leaves nothing better to say
const APOLOGY: &str = "I apologize, sir, but I encountered an error processing that request.";

/// Spoken when a captured utterance transcribes to nothing
const EMPTY_TRANSCRIPT: &str = "I didn't catch that, sir.";

/// Spoken acknowledgement after the wake phrase
const WAKE_ACK: &str = "Yes, sir?";

/// Where the assistant is in an activation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssistantState {
    /// Waiting for a wake phrase or keyboard trigger
    #[default]
    Idle,
    /// Capturing the command utterance
    Listening,
    /// Dispatching or querying the LLM
    Thinking,
    /// Playing the response
    Speaking,
    /// Something broke; recovers to Idle on the next cycle
    Error,
}

/// The assistant: workflow dispatch plus personality-driven LLM fallback
pub struct Assistant {
    manager: WorkflowManager,
    llm: Box<dyn LanguageModel>,
    state: AssistantState,
}

impl Assistant {
    /// Assemble from explicit parts. Tests use this to inject scripted
    /// language models and synthetic registries.
    #[must_use]
    pub fn new(manager: WorkflowManager, llm: Box<dyn LanguageModel>) -> Self {
        Self { manager, llm, state: AssistantState::Idle }
    }

    /// Build from configuration: real LLM client plus every workflow the
    /// environment is configured for.
    ///
    /// # Errors
    ///
    /// Returns an error when the LLM client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(&config.llm, config.personality.clone())?;
        Ok(Self::new(workflows::manager_from_env(), Box::new(llm)))
    }

    /// Current orchestrator state.
    #[must_use]
    pub const fn state(&self) -> AssistantState {
        self.state
    }

    /// The workflow registry, for inspection and re-registration.
    pub fn manager_mut(&mut self) -> &mut WorkflowManager {
        &mut self.manager
    }

    /// Forget the conversation so far.
    pub fn reset_conversation(&mut self) {
        self.llm.clear_history();
    }

    /// Resolve one utterance to a spoken response. Never fails: internal
    /// errors collapse to a fixed apology.
    ///
    /// Dispatch order: last-matching workflow first; its failure, or no
    /// match at all, falls through to the language model.
    pub async fn process_input(&mut self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return EMPTY_TRANSCRIPT.to_string();
        }

        self.state = AssistantState::Thinking;
        let response = self.resolve(text).await;
        if self.state != AssistantState::Error {
            self.state = AssistantState::Idle;
        }
        response
    }

    async fn resolve(&mut self, text: &str) -> String {
        let Some(workflow) = self.manager.find_matching(text) else {
            debug!(utterance = text, "no workflow matched, deferring to LLM");
            return self.ask_llm(text).await;
        };

        let name = workflow.name().to_string();
        info!(workflow = %name, utterance = text, "dispatching");

        let entities = extract_entities(text);
        let result = workflow.execute(text, &entities).await;

        match result.status {
            WorkflowStatus::Success | WorkflowStatus::Partial | WorkflowStatus::Pending => {
                result.message
            }
            WorkflowStatus::Failure => {
                // Fold the diagnostic into a prompt so the LLM can apologize
                // in character instead of reading the raw error aloud.
                let detail = result.error.as_deref().unwrap_or(&result.message);
                warn!(workflow = %name, error = detail, "workflow failed, rephrasing via LLM");
                let prompt = format!(
                    "The user asked: '{text}'. The {name} system responded with an error: {detail}"
                );
                self.ask_llm(&prompt).await
            }
        }
    }

    async fn ask_llm(&mut self, prompt: &str) -> String {
        match self.llm.generate_response(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "LLM request failed");
                self.state = AssistantState::Error;
                APOLOGY.to_string()
            }
        }
    }

    /// Run the voice loop until interrupted.
    ///
    /// With `keyboard_trigger` set, Enter starts an activation cycle instead
    /// of the wake phrase. Cycles are strictly sequential: audio captured
    /// while thinking or speaking is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error when the audio devices or cloud voice providers
    /// cannot be initialized. Per-cycle failures are logged and the loop
    /// continues.
    pub async fn run_voice(&mut self, config: &Config, keyboard_trigger: bool) -> Result<()> {
        let mut mic = Microphone::open()?;
        let speaker = Speaker::open()?;
        let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
        let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
        let mut segmenter = UtteranceSegmenter::new(&config.voice);

        mic.start()?;
        if keyboard_trigger {
            info!("voice loop running, press Enter to talk");
        } else {
            info!(wake_phrases = ?segmenter.wake_phrases(), "voice loop running");
        }

        let mut enter_rx = keyboard_trigger.then(spawn_enter_listener);

        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;

            if let Some(rx) = &mut enter_rx {
                if rx.try_recv().is_ok() {
                    segmenter.engage();
                    mic.discard();
                    self.state = AssistantState::Listening;
                    info!("keyboard trigger, listening");
                    continue;
                }
                if segmenter.phase() != SegmenterPhase::Engaged {
                    mic.discard();
                    continue;
                }
            }

            let chunk = mic.drain();
            if chunk.is_empty() || !segmenter.feed(&chunk) {
                continue;
            }

            let segment = segmenter.take_segment();
            let engaged = segmenter.phase() == SegmenterPhase::Engaged;

            let transcript = match self.transcribe(&stt, &segment).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "transcription failed, resetting cycle");
                    segmenter.reset();
                    self.state = AssistantState::Idle;
                    continue;
                }
            };

            if engaged {
                self.state = AssistantState::Thinking;
                let reply = self.process_input(&transcript).await;
                self.state = AssistantState::Speaking;
                if let Err(e) = Self::speak(&tts, &speaker, &reply).await {
                    warn!(error = %e, "speech synthesis failed");
                }
                segmenter.reset();
                mic.discard();
                self.state = AssistantState::Idle;
            } else if segmenter.confirm_wake(&transcript) {
                self.state = AssistantState::Listening;
                if let Err(e) = Self::speak(&tts, &speaker, WAKE_ACK).await {
                    warn!(error = %e, "speech synthesis failed");
                }
                mic.discard();
            }
        }
    }

    async fn transcribe(&self, stt: &SpeechToText, segment: &[f32]) -> Result<String> {
        if segment.is_empty() {
            return Err(Error::Stt("empty speech segment".to_string()));
        }
        let wav = encode_wav(segment, CAPTURE_SAMPLE_RATE)?;
        stt.transcribe(&wav).await
    }

    async fn speak(tts: &TextToSpeech, speaker: &Speaker, text: &str) -> Result<()> {
        let mp3 = tts.synthesize(text).await?;
        speaker.play_mp3(&mp3).await
    }
}

/// Forward Enter presses from stdin to the async side
fn spawn_enter_listener() -> tokio::sync::mpsc::UnboundedReceiver<()> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        while std::io::stdin().read_line(&mut line).is_ok() {
            if tx.send(()).is_err() {
                break;
            }
            line.clear();
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::workflows::{Entities, Trigger, Workflow, WorkflowResult};

    use std::sync::{Arc, Mutex};

    struct ScriptedModel {
        replies: Vec<String>,
        prompts: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl ScriptedModel {
        fn answering(reply: &str) -> Self {
            Self {
                replies: vec![reply.to_string()],
                prompts: Arc::new(Mutex::new(Vec::new())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self { replies: Vec::new(), prompts: Arc::new(Mutex::new(Vec::new())), fail: true }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate_response(&mut self, user_input: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(user_input.to_string());
            if self.fail {
                return Err(Error::Llm("scripted failure".to_string()));
            }
            Ok(self.replies.first().cloned().unwrap_or_default())
        }

        fn clear_history(&mut self) {}

        fn name(&self) -> String {
            "scripted".to_string()
        }
    }

    struct FixedWorkflow {
        trigger: Trigger,
        result: WorkflowResult,
    }

    #[async_trait]
    impl Workflow for FixedWorkflow {
        fn name(&self) -> &str {
            "fixed"
        }

        fn description(&self) -> &str {
            "always returns its configured result"
        }

        fn trigger(&self) -> &Trigger {
            &self.trigger
        }

        async fn execute(&self, _utterance: &str, _entities: &Entities) -> WorkflowResult {
            self.result.clone()
        }
    }

    fn assistant_with(result: WorkflowResult, llm: ScriptedModel) -> Assistant {
        let mut manager = WorkflowManager::new();
        manager.register(Box::new(FixedWorkflow {
            trigger: Trigger::new(&["lights"], &[], &[]),
            result,
        }));
        Assistant::new(manager, Box::new(llm))
    }

    #[tokio::test]
    async fn empty_input_gets_fixed_reply() {
        let mut assistant =
            Assistant::new(WorkflowManager::new(), Box::new(ScriptedModel::answering("hi")));
        assert_eq!(assistant.process_input("   ").await, EMPTY_TRANSCRIPT);
    }

    #[tokio::test]
    async fn success_message_is_returned_verbatim() {
        let result = WorkflowResult::success("Done, sir.", serde_json::json!({}));
        let mut assistant = assistant_with(result, ScriptedModel::answering("unused"));
        assert_eq!(assistant.process_input("lights on").await, "Done, sir.");
    }

    #[tokio::test]
    async fn failure_is_rephrased_by_llm() {
        let result = WorkflowResult::failure("Trouble with the lights.", "bridge timeout");
        let mut assistant =
            assistant_with(result, ScriptedModel::answering("My apologies, the bridge is down."));
        let reply = assistant.process_input("lights on").await;
        assert_eq!(reply, "My apologies, the bridge is down.");
    }

    #[tokio::test]
    async fn failure_prompt_names_workflow_and_error() {
        let model = ScriptedModel::answering("ok");
        let prompts = Arc::clone(&model.prompts);
        let result = WorkflowResult::failure("Trouble.", "bridge timeout");
        let mut assistant = assistant_with(result, model);
        assistant.process_input("lights on").await;

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The user asked: 'lights on'"));
        assert!(prompts[0].contains("The fixed system responded with an error: bridge timeout"));
    }

    #[tokio::test]
    async fn unmatched_input_goes_to_llm_verbatim() {
        let mut assistant = Assistant::new(
            WorkflowManager::new(),
            Box::new(ScriptedModel::answering("It is quarter past three, sir.")),
        );
        let reply = assistant.process_input("what time is it").await;
        assert_eq!(reply, "It is quarter past three, sir.");
    }

    #[tokio::test]
    async fn llm_error_collapses_to_apology() {
        let mut assistant =
            Assistant::new(WorkflowManager::new(), Box::new(ScriptedModel::failing()));
        assert_eq!(assistant.process_input("hello there").await, APOLOGY);
        assert_eq!(assistant.state(), AssistantState::Error);
    }

    #[tokio::test]
    async fn pending_message_is_returned_verbatim() {
        let result = WorkflowResult {
            status: WorkflowStatus::Pending,
            message: "Someone is at the door, sir. Shall I unlock it?".to_string(),
            data: None,
            error: None,
        };
        let mut assistant = assistant_with(result, ScriptedModel::answering("unused"));
        let reply = assistant.process_input("lights please").await;
        assert_eq!(reply, "Someone is at the door, sir. Shall I unlock it?");
    }
}
