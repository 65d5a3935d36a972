//! End-to-end dispatch tests: registry tie-breaks, entity flow into
//! workflows, and the LLM fallback path.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use valet::workflows::{DoorbellWorkflow, HueLightsWorkflow, ThermostatWorkflow};
use valet::{
    Action, Assistant, Entities, Error, LanguageModel, Result, Trigger, Workflow, WorkflowManager,
    WorkflowResult, WorkflowStatus,
};

/// Echoes every prompt it receives, so tests can see exactly what reached
/// the language model.
struct EchoModel {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl EchoModel {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (Self { prompts: Arc::clone(&prompts) }, prompts)
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate_response(&mut self, user_input: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(user_input.to_string());
        Ok(format!("echo: {user_input}"))
    }

    fn clear_history(&mut self) {}

    fn name(&self) -> String {
        "echo".to_string()
    }
}

struct NamedStub {
    name: &'static str,
    trigger: Trigger,
    result: WorkflowResult,
}

impl NamedStub {
    fn succeeding(name: &'static str, keywords: &[&str], message: &str) -> Self {
        Self {
            name,
            trigger: Trigger::new(keywords, &[], &[]),
            result: WorkflowResult::success(message, serde_json::json!({})),
        }
    }

    fn failing(name: &'static str, keywords: &[&str], message: &str, error: &str) -> Self {
        Self {
            name,
            trigger: Trigger::new(keywords, &[], &[]),
            result: WorkflowResult::failure(message, error),
        }
    }
}

#[async_trait]
impl Workflow for NamedStub {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test stub"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, _entities: &Entities) -> WorkflowResult {
        self.result.clone()
    }
}

/// Records the entities it was handed.
struct EntitySink {
    trigger: Trigger,
    seen: Arc<Mutex<Option<Entities>>>,
}

#[async_trait]
impl Workflow for EntitySink {
    fn name(&self) -> &str {
        "entity_sink"
    }

    fn description(&self) -> &str {
        "records extracted entities"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        *self.seen.lock().unwrap() = Some(entities.clone());
        WorkflowResult::success("Recorded, sir.", serde_json::json!({}))
    }
}

#[tokio::test]
async fn unmatched_utterance_reaches_llm_verbatim() {
    let (model, prompts) = EchoModel::new();
    let mut assistant = Assistant::new(WorkflowManager::new(), Box::new(model));

    let reply = assistant.process_input("what is the meaning of life").await;

    assert_eq!(reply, "echo: what is the meaning of life");
    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.as_slice(), ["what is the meaning of life"]);
}

#[tokio::test]
async fn later_registration_wins_ties() {
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(NamedStub::succeeding("a", &["lights"], "from a")));
    manager.register(Box::new(NamedStub::succeeding("b", &["lights"], "from b")));

    let (model, _) = EchoModel::new();
    let mut assistant = Assistant::new(manager, Box::new(model));

    assert_eq!(assistant.process_input("lights please").await, "from b");
}

#[tokio::test]
async fn failure_is_rephrased_never_raw() {
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(NamedStub::failing(
        "hue_lights",
        &["lights"],
        "Trouble with the lights, sir.",
        "connection refused (bridge 192.168.1.40)",
    )));

    let (model, prompts) = EchoModel::new();
    let mut assistant = Assistant::new(manager, Box::new(model));

    let reply = assistant.process_input("turn on the lights").await;

    // The reply comes from the LLM, not from the workflow's error field.
    assert!(reply.starts_with("echo: "));

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("The user asked: 'turn on the lights'"));
    assert!(
        prompts[0]
            .contains("The hue_lights system responded with an error: connection refused")
    );
}

#[tokio::test]
async fn failure_without_error_falls_back_to_message() {
    let mut manager = WorkflowManager::new();
    let mut stub = NamedStub::failing("locks", &["lock"], "The lock system is down, sir.", "x");
    stub.result.error = None;
    manager.register(Box::new(stub));

    let (model, prompts) = EchoModel::new();
    let mut assistant = Assistant::new(manager, Box::new(model));

    assistant.process_input("lock the door").await;
    let prompts = prompts.lock().unwrap();
    assert!(prompts[0].contains("an error: The lock system is down, sir."));
}

#[tokio::test]
async fn entities_flow_into_the_matched_workflow() {
    let seen = Arc::new(Mutex::new(None));
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(DoorbellWorkflow::unconfigured()));
    manager.register(Box::new(EntitySink {
        trigger: Trigger::new(&["lock"], &[], &[]),
        seen: Arc::clone(&seen),
    }));

    let (model, _) = EchoModel::new();
    let mut assistant = Assistant::new(manager, Box::new(model));
    assistant.process_input("lock the front door").await;

    let entities = seen.lock().unwrap().clone().expect("workflow not reached");
    assert_eq!(entities.action, Some(Action::Lock));
    assert_eq!(entities.door.as_deref(), Some("front"));
}

#[tokio::test]
async fn registry_context_is_idempotent() {
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(DoorbellWorkflow::unconfigured()));
    manager.register(Box::new(ThermostatWorkflow::unconfigured()));

    let first = manager.context_for_llm();
    let second = manager.context_for_llm();
    assert_eq!(first, second);
    assert!(first.contains("Workflow: doorbell"));
    assert!(first.contains("Workflow: thermostat"));
}

#[tokio::test]
async fn swap_sequence_leaves_single_lights_workflow() {
    let mut manager = WorkflowManager::new();
    manager.register(Box::new(NamedStub::succeeding(
        "lights",
        &["lights"],
        "template lights",
    )));
    manager.unregister("lights");
    manager.register(Box::new(HueLightsWorkflow::new(None)));

    assert_eq!(manager.names(), ["hue_lights"]);
    let matched = manager.find_matching("turn on the lights").expect("no match");
    assert_eq!(matched.name(), "hue_lights");
}

#[tokio::test]
async fn unconfigured_workflow_failure_status_is_surfaced() {
    let doorbell = DoorbellWorkflow::unconfigured();
    let result = doorbell.execute("lock the front door", &Entities::default()).await;
    assert_eq!(result.status, WorkflowStatus::Failure);
    assert!(result.error.is_some());
}

// Sanity-check the Error display shapes tests rely on elsewhere.
#[test]
fn error_variants_render_their_domain() {
    let err = Error::Workflow("no controller".to_string());
    assert!(err.to_string().contains("no controller"));
}
