//! Valet - Voice assistant orchestrator with workflow dispatch
//!
//! This library provides the core functionality for the valet assistant:
//! - Voice processing (speech segmentation, wake word, STT, TTS)
//! - Workflow dispatch and entity extraction for smart-home commands
//! - Personality-driven LLM fallback conversation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Activation                         │
//! │   Wake word  │  Keyboard (Enter)  │  Text chat      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ utterance
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Assistant                          │
//! │   STT  │  Workflow dispatch  │  LLM fallback  │ TTS │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Workflows                           │
//! │   Doorbell │ Thermostat │ Hue │ Home Assistant │ .. │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! An utterance is resolved by the workflow registry first: the manager scans
//! every registered workflow and the *last* match in registration order wins,
//! so real integrations registered after the template workflows shadow them.
//! Utterances nothing claims, and workflow failures, fall through to the
//! language model so the user never hears a raw error.

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod personality;
pub mod voice;
pub mod workflows;

pub use assistant::{Assistant, AssistantState};
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{ChatMessage, LanguageModel, LlmClient, Role};
pub use personality::{FormalityLevel, PersonalityConfig, SarcasmLevel, WarmthLevel};
pub use workflows::{
    Action, Entities, Mood, Trigger, Workflow, WorkflowManager, WorkflowResult, WorkflowStatus,
    extract_entities,
};
