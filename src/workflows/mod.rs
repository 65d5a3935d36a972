//! Workflow system - dispatch layer for smart-home style capabilities
//!
//! Each workflow is a self-contained capability matched against raw utterance
//! text. The [`WorkflowManager`] holds an insertion-ordered registry and
//! resolves at most one workflow per utterance.
//!
//! # Registration order is load-bearing
//!
//! When several workflows match the same utterance, the one registered
//! **last** wins (see [`WorkflowManager::find_matching`]). The default
//! builders rely on this: template workflows are registered first and real
//! integrations (Philips Hue, Home Assistant) afterwards, so the
//! integrations shadow the templates on overlapping keywords. If you add a
//! workflow whose keywords overlap an existing one, register it in the
//! position you want it to win from.

mod catalog;
mod entities;
pub mod home_assistant;
pub mod philips_hue;

pub use catalog::{
    DoorbellWorkflow, MediaWorkflow, ThermostatWorkflow, TimerWorkflow, WeatherWorkflow,
};
pub use entities::{Action, Entities, Mood, extract_entities};
pub use home_assistant::{
    HassClient, HassClimateWorkflow, HassConfig, HassLightsWorkflow, HassLockWorkflow,
};
pub use philips_hue::{HueClient, HueConfig, HueLightsWorkflow};

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::RegexBuilder;

/// How a workflow is triggered
///
/// Immutable once constructed. Keywords are matched as case-insensitive
/// substrings; patterns are case-insensitive regex searches. Matching is a
/// pure OR across all keywords and patterns, with no priority between them.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    keywords: Vec<String>,
    patterns: Vec<regex::Regex>,
    examples: Vec<String>,
}

impl Trigger {
    /// Build a trigger from keyword, pattern, and example lists
    ///
    /// Patterns are compiled once here. An invalid pattern is skipped with a
    /// warning rather than failing construction.
    #[must_use]
    pub fn new(keywords: &[&str], patterns: &[&str], examples: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        tracing::warn!(pattern = *p, error = %e, "skipping invalid trigger pattern");
                    })
                    .ok()
            })
            .collect();

        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            patterns,
            examples: examples.iter().map(ToString::to_string).collect(),
        }
    }

    /// Check whether the trigger fires for the given text
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();

        self.keywords.iter().any(|kw| lower.contains(kw))
            || self.patterns.iter().any(|p| p.is_match(&lower))
    }

    /// Example phrases, used to describe the workflow to the LLM
    #[must_use]
    pub fn examples(&self) -> &[String] {
        &self.examples
    }
}

/// Status of a workflow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Success,
    Failure,
    /// Some actions succeeded
    Partial,
    /// Waiting for an external response
    Pending,
}

/// Result of a workflow execution
///
/// `message` is always human-speakable; `error` is diagnostic-only and is
/// never spoken except folded into an LLM fallback prompt.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub status: WorkflowStatus,
    pub message: String,
    /// Structured data for further processing
    pub data: Option<serde_json::Value>,
    /// Error details if failed
    pub error: Option<String>,
}

impl WorkflowResult {
    /// Successful execution with a spoken message
    #[must_use]
    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: WorkflowStatus::Success,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Failed execution with a polite message and a diagnostic error
    #[must_use]
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: WorkflowStatus::Failure,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A self-contained assistant capability
///
/// Implementations must not let failures escape `execute`: every failure path
/// is folded into a [`WorkflowStatus::Failure`] result so the dispatcher can
/// hand it to the LLM for a graceful rephrase.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Unique identifier, used as the registry key
    fn name(&self) -> &str;

    /// Human-readable description of what this workflow does
    fn description(&self) -> &str;

    /// How this workflow is triggered
    fn trigger(&self) -> &Trigger;

    /// Execute the workflow against an utterance and its extracted entities
    async fn execute(&self, utterance: &str, entities: &Entities) -> WorkflowResult;

    /// Check whether this workflow should handle the given text
    fn matches(&self, text: &str) -> bool {
        self.trigger().matches(text)
    }

    /// Render name, description, and examples for LLM context
    fn context_for_llm(&self) -> String {
        let examples = self
            .trigger()
            .examples()
            .iter()
            .map(|ex| format!("  - {ex}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Workflow: {}\nDescription: {}\nExample commands:\n{examples}\n",
            self.name(),
            self.description()
        )
    }
}

/// Placeholder returned when no workflows are registered
const NO_CAPABILITIES: &str = "No special capabilities are currently configured.";

/// Insertion-ordered workflow registry and matcher
///
/// Registration order drives the tie-break: [`Self::find_matching`] keeps
/// overwriting its candidate with every match, so the last registered match
/// wins. Overwriting an existing name keeps its original position; new names
/// append.
#[derive(Default)]
pub struct WorkflowManager {
    workflows: IndexMap<String, Box<dyn Workflow>>,
}

impl WorkflowManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow, keyed by its name
    ///
    /// Re-registering an existing name replaces the workflow in place
    /// (keeping its position in the scan order); a new name is appended and
    /// therefore wins ties against everything registered before it.
    pub fn register(&mut self, workflow: Box<dyn Workflow>) {
        let name = workflow.name().to_string();
        tracing::debug!(workflow = %name, "registered workflow");
        self.workflows.insert(name, workflow);
    }

    /// Remove a workflow by name; no-op if absent
    pub fn unregister(&mut self, name: &str) {
        if self.workflows.shift_remove(name).is_some() {
            tracing::debug!(workflow = name, "unregistered workflow");
        }
    }

    /// Look up a workflow by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Workflow> {
        self.workflows.get(name).map(AsRef::as_ref)
    }

    /// Find the workflow that should handle the given text
    ///
    /// Scans the full registry in insertion order and keeps the **last**
    /// matching workflow. This is deliberate: integrations registered later
    /// shadow earlier template workflows when both match. There is no
    /// scoring or specificity ranking.
    #[must_use]
    pub fn find_matching(&self, text: &str) -> Option<&dyn Workflow> {
        let mut matched: Option<&dyn Workflow> = None;
        for workflow in self.workflows.values() {
            if workflow.matches(text) {
                matched = Some(workflow.as_ref());
            }
        }
        matched
    }

    /// Render every registered workflow's description for LLM context
    ///
    /// Deterministic for a fixed registry; returns a fixed placeholder when
    /// the registry is empty.
    #[must_use]
    pub fn context_for_llm(&self) -> String {
        if self.workflows.is_empty() {
            return NO_CAPABILITIES.to_string();
        }

        self.workflows
            .values()
            .map(|w| w.context_for_llm())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Names of all registered workflows, in scan order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }

    /// Number of registered workflows
    #[must_use]
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

/// Build a manager with the template workflows
///
/// Doorbell, thermostat, weather, and timer are registered without real
/// controllers; swap them out with [`WorkflowManager::register`] once you
/// have actual integrations. [`MediaWorkflow`] is not registered by default
/// because its trigger keywords ("movie", "play", "pause") overlap the
/// Philips Hue mood triggers; register it explicitly when a real media
/// controller is configured.
#[must_use]
pub fn default_manager() -> WorkflowManager {
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(DoorbellWorkflow::unconfigured()));
    manager.register(Box::new(ThermostatWorkflow::unconfigured()));
    manager.register(Box::new(WeatherWorkflow::new()));
    manager.register(Box::new(TimerWorkflow::new()));
    manager
}

/// Build a manager with every integration the environment is configured for
///
/// Starts from [`default_manager`] and layers in real integrations. The
/// order here matters (see the module docs): Hue lights, then Home
/// Assistant, which replaces whichever lights workflow is present and adds
/// lock and climate control.
#[must_use]
pub fn manager_from_env() -> WorkflowManager {
    let mut manager = default_manager();

    if std::env::var("HUE_BRIDGE_IP").is_ok_and(|ip| !ip.is_empty()) {
        tracing::info!("Philips Hue integration enabled");
        manager.unregister("lights");
        manager.register(Box::new(HueLightsWorkflow::from_env()));
    }

    if std::env::var("HASS_TOKEN").is_ok_and(|t| !t.is_empty()) {
        tracing::info!("Home Assistant integration enabled");
        if manager.get("hue_lights").is_some() {
            manager.unregister("hue_lights");
        } else {
            manager.unregister("lights");
        }
        manager.register(Box::new(HassLightsWorkflow::from_env()));
        manager.register(Box::new(HassLockWorkflow::from_env()));
        manager.register(Box::new(HassClimateWorkflow::from_env()));
    }

    manager
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        name: &'static str,
        trigger: Trigger,
    }

    impl Probe {
        fn new(name: &'static str, keywords: &[&str]) -> Self {
            Self {
                name,
                trigger: Trigger::new(keywords, &[], &[]),
            }
        }
    }

    #[async_trait]
    impl Workflow for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "probe"
        }

        fn trigger(&self) -> &Trigger {
            &self.trigger
        }

        async fn execute(&self, _utterance: &str, _entities: &Entities) -> WorkflowResult {
            WorkflowResult::success("ok", serde_json::Value::Null)
        }
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let trigger = Trigger::new(&["Lights"], &[], &[]);
        assert!(trigger.matches("turn on the LIGHTS"));
        assert!(!trigger.matches("good evening"));
    }

    #[test]
    fn pattern_matching_is_a_search_not_full_match() {
        let trigger = Trigger::new(&[], &[r"turn (on|off) .*(light|lamp)"], &[]);
        assert!(trigger.matches("please turn on the desk lamp now"));
        assert!(!trigger.matches("the lamp is nice"));
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let trigger = Trigger::new(&["door"], &["(unclosed"], &[]);
        assert!(trigger.matches("the door"));
    }

    #[test]
    fn last_registered_match_wins() {
        let mut manager = WorkflowManager::new();
        manager.register(Box::new(Probe::new("a", &["light"])));
        manager.register(Box::new(Probe::new("b", &["light"])));

        let found = manager.find_matching("turn on the light").unwrap();
        assert_eq!(found.name(), "b");
    }

    #[test]
    fn reregistering_keeps_original_position() {
        let mut manager = WorkflowManager::new();
        manager.register(Box::new(Probe::new("a", &["light"])));
        manager.register(Box::new(Probe::new("b", &["light"])));
        // Overwrite "a"; it keeps slot 0 so "b" still wins
        manager.register(Box::new(Probe::new("a", &["light"])));

        assert_eq!(manager.names(), vec!["a", "b"]);
        assert_eq!(manager.find_matching("light").unwrap().name(), "b");
    }

    #[test]
    fn unregister_is_a_noop_for_unknown_names() {
        let mut manager = WorkflowManager::new();
        manager.register(Box::new(Probe::new("a", &["light"])));
        manager.unregister("missing");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn empty_registry_yields_placeholder_context() {
        let manager = WorkflowManager::new();
        assert_eq!(
            manager.context_for_llm(),
            "No special capabilities are currently configured."
        );
    }

    #[test]
    fn context_is_idempotent() {
        let mut manager = WorkflowManager::new();
        manager.register(Box::new(Probe::new("a", &["light"])));
        assert_eq!(manager.context_for_llm(), manager.context_for_llm());
    }

    #[test]
    fn default_manager_registration_order() {
        let manager = default_manager();
        assert_eq!(
            manager.names(),
            vec!["doorbell", "thermostat", "weather", "timer"]
        );
    }
}
