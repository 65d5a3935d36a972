//! Home Assistant integration
//!
//! REST client for the Home Assistant API plus the lights, locks, and
//! climate workflows built on it. Configure with the `HASS_URL` and
//! `HASS_TOKEN` environment variables (long-lived access token).

use async_trait::async_trait;
use serde_json::json;

use crate::{Error, Result};

use super::{Action, Entities, Trigger, Workflow, WorkflowResult};

/// Home Assistant connection settings
#[derive(Debug, Clone, Default)]
pub struct HassConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`
    pub url: String,
    /// Long-lived access token
    pub token: String,
}

impl HassConfig {
    /// Read settings from `HASS_URL` / `HASS_TOKEN`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("HASS_URL").unwrap_or_else(|_| "http://localhost:8123".to_string()),
            token: std::env::var("HASS_TOKEN").unwrap_or_default(),
        }
    }

    /// Whether a token is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Client for the Home Assistant REST API
pub struct HassClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HassClient {
    /// Create a client from connection settings
    #[must_use]
    pub fn new(config: &HassConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// Create a client from the environment, if a token is set
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let config = HassConfig::from_env();
        config.is_configured().then(|| Self::new(&config))
    }

    /// Call a Home Assistant service
    ///
    /// # Arguments
    ///
    /// * `domain` - service domain (e.g. "light", "lock", "climate")
    /// * `service` - service name (e.g. "turn_on", "lock", "set_temperature")
    /// * `entity_id` - target entity (e.g. "light.living_room"), if any
    /// * `data` - additional service data merged into the payload
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API responds with an error
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        data: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/api/services/{domain}/{service}", self.base_url);

        let mut payload = data.unwrap_or_else(|| json!({}));
        if let (Some(entity), Some(map)) = (entity_id, payload.as_object_mut()) {
            map.insert("entity_id".to_string(), json!(entity));
        }

        tracing::debug!(domain, service, entity = ?entity_id, "calling home assistant service");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "home assistant service call failed");
            return Err(Error::HomeAssistant(format!(
                "service {domain}.{service} failed with {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Get the state of a specific entity
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the entity is unknown
    pub async fn get_state(&self, entity_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/api/states/{entity_id}", self.base_url);

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HomeAssistant(format!(
                "state query for {entity_id} failed with {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

/// Map a room name to its light entity ID
fn light_entity_for_room(room: &str) -> String {
    match room {
        "living room" => "light.living_room".to_string(),
        "bedroom" | "kitchen" | "bathroom" | "office" => format!("light.{room}"),
        "all" => "all".to_string(),
        other => format!("light.{}", other.replace(' ', "_")),
    }
}

/// Map a door name to its lock entity ID
fn lock_entity_for_door(door: &str) -> String {
    format!("lock.{door}_door")
}

/// Lights control through Home Assistant
pub struct HassLightsWorkflow {
    trigger: Trigger,
    client: Option<HassClient>,
}

impl HassLightsWorkflow {
    /// Build with an explicit client
    #[must_use]
    pub fn new(client: Option<HassClient>) -> Self {
        Self {
            trigger: Trigger::new(
                &["light", "lights", "lamp", "illuminate", "bright", "dim"],
                &[
                    r"turn (on|off) .*(light|lamp)",
                    r"(light|lamp).* (on|off)",
                    r"dim .*(light|lamp)",
                    r"set .*(light|lamp).* to",
                ],
                &[
                    "Turn on the living room lights",
                    "Dim the bedroom lights to 50%",
                    "Turn off all the lights",
                ],
            ),
            client,
        }
    }

    /// Build from `HASS_URL` / `HASS_TOKEN`
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HassClient::from_env())
    }
}

#[async_trait]
impl Workflow for HassLightsWorkflow {
    fn name(&self) -> &str {
        "hass_lights"
    }

    fn description(&self) -> &str {
        "Control lights through Home Assistant"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        let Some(client) = &self.client else {
            return WorkflowResult::failure(
                "Home Assistant is not configured. Please set HASS_URL and HASS_TOKEN environment variables.",
                "No Home Assistant client",
            );
        };

        let action = entities.action.unwrap_or(Action::Toggle);
        let room = entities.room.as_deref().unwrap_or("living room");
        let brightness = entities.brightness;
        let entity_id = light_entity_for_room(room);

        let outcome = match action {
            Action::On => {
                let data = brightness.map(|pct| json!({ "brightness_pct": pct }));
                let call = if entity_id == "all" {
                    client
                        .call_service("light", "turn_on", None, Some(json!({ "entity_id": "all" })))
                        .await
                } else {
                    client
                        .call_service("light", "turn_on", Some(&entity_id), data)
                        .await
                };

                call.map(|_| {
                    brightness.map_or_else(
                        || format!("I've illuminated the {room}, sir."),
                        |pct| format!("I've set the {room} lights to {pct}%, sir."),
                    )
                })
            }
            Action::Off => {
                let call = if entity_id == "all" {
                    client
                        .call_service("light", "turn_off", None, Some(json!({ "entity_id": "all" })))
                        .await
                } else {
                    client.call_service("light", "turn_off", Some(&entity_id), None).await
                };

                call.map(|_| format!("The {room} is now dark, sir. Do try not to stub your toe."))
            }
            Action::Dim if brightness.is_some() => {
                let pct = brightness.unwrap_or_default();
                client
                    .call_service(
                        "light",
                        "turn_on",
                        Some(&entity_id),
                        Some(json!({ "brightness_pct": pct })),
                    )
                    .await
                    .map(|_| format!("I've dimmed the {room} lights to {pct}%, sir."))
            }
            _ => client
                .call_service("light", "toggle", Some(&entity_id), None)
                .await
                .map(|_| format!("I've toggled the {room} lights, sir.")),
        };

        match outcome {
            Ok(message) => WorkflowResult::success(
                message,
                json!({ "room": room, "action": action.as_str(), "brightness": brightness }),
            ),
            Err(e) => WorkflowResult::failure(
                format!("I encountered difficulty with the lights, sir. The error was: {e}"),
                e.to_string(),
            ),
        }
    }
}

/// Door lock control through Home Assistant
pub struct HassLockWorkflow {
    trigger: Trigger,
    client: Option<HassClient>,
}

impl HassLockWorkflow {
    /// Build with an explicit client
    #[must_use]
    pub fn new(client: Option<HassClient>) -> Self {
        Self {
            trigger: Trigger::new(
                &["lock", "unlock", "door", "secure"],
                &[
                    r"(lock|unlock).*(door|entrance)",
                    r"(secure|unsecure)",
                    r"is .* (locked|unlocked)",
                ],
                &[
                    "Lock the front door",
                    "Unlock the back door",
                    "Is the garage locked?",
                    "Secure all doors",
                ],
            ),
            client,
        }
    }

    /// Build from `HASS_URL` / `HASS_TOKEN`
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HassClient::from_env())
    }
}

#[async_trait]
impl Workflow for HassLockWorkflow {
    fn name(&self) -> &str {
        "hass_locks"
    }

    fn description(&self) -> &str {
        "Control door locks through Home Assistant"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        let Some(client) = &self.client else {
            return WorkflowResult::failure(
                "Home Assistant is not configured for lock control, sir.",
                "No Home Assistant client",
            );
        };

        let action = entities.action.unwrap_or(Action::Lock);
        let door = entities.door.as_deref().unwrap_or("front");
        let entity_id = lock_entity_for_door(door);

        let outcome = match action {
            Action::Lock => client
                .call_service("lock", "lock", Some(&entity_id), None)
                .await
                .map(|_| format!("The {door} door is now secured, sir.")),
            Action::Unlock => client
                .call_service("lock", "unlock", Some(&entity_id), None)
                .await
                .map(|_| format!("I've unlocked the {door} door, sir. Do exercise appropriate caution.")),
            Action::Check => client.get_state(&entity_id).await.map(|state| {
                let locked = state.get("state").and_then(|s| s.as_str()) == Some("locked");
                if locked {
                    format!("The {door} door is securely locked, sir.")
                } else {
                    format!("The {door} door is currently unlocked, sir. Shall I secure it?")
                }
            }),
            _ => Ok("Lock action completed, sir.".to_string()),
        };

        match outcome {
            Ok(message) => WorkflowResult::success(
                message,
                json!({ "door": door, "action": action.as_str() }),
            ),
            Err(e) => WorkflowResult::failure(
                "There was a complication with the door lock, sir.",
                e.to_string(),
            ),
        }
    }
}

/// Thermostat control through Home Assistant
pub struct HassClimateWorkflow {
    trigger: Trigger,
    client: Option<HassClient>,
    climate_entity: String,
}

impl HassClimateWorkflow {
    /// Build with an explicit client and climate entity
    #[must_use]
    pub fn new(client: Option<HassClient>, climate_entity: impl Into<String>) -> Self {
        Self {
            trigger: Trigger::new(
                &["temperature", "thermostat", "heat", "cool", "AC", "warm", "cold"],
                &[
                    r"set.*(temp|temperature|thermostat)",
                    r"(warm|heat|cool).*up",
                    r"turn (on|off).*(heat|AC)",
                    r"make it (warm|cool|cold)",
                ],
                &[
                    "Set the temperature to 72",
                    "Turn on the AC",
                    "Make it warmer in here",
                ],
            ),
            client,
            climate_entity: climate_entity.into(),
        }
    }

    /// Build from `HASS_URL` / `HASS_TOKEN` with the default thermostat entity
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HassClient::from_env(), "climate.thermostat")
    }
}

#[async_trait]
impl Workflow for HassClimateWorkflow {
    fn name(&self) -> &str {
        "hass_climate"
    }

    fn description(&self) -> &str {
        "Control thermostat through Home Assistant"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        let Some(client) = &self.client else {
            return WorkflowResult::failure(
                "Home Assistant climate control is not configured, sir.",
                "No Home Assistant client",
            );
        };

        let outcome = if let Some(temperature) = entities.temperature {
            client
                .call_service(
                    "climate",
                    "set_temperature",
                    Some(&self.climate_entity),
                    Some(json!({ "temperature": temperature })),
                )
                .await
                .map(|_| {
                    format!("I've set the temperature to {temperature} degrees, sir. Comfort is en route.")
                })
        } else {
            client.get_state(&self.climate_entity).await.map(|state| {
                let attrs = state.get("attributes");
                let current = attrs
                    .and_then(|a| a.get("current_temperature"))
                    .map_or_else(|| "unknown".to_string(), ToString::to_string);
                let target = attrs
                    .and_then(|a| a.get("temperature"))
                    .map_or_else(|| "unknown".to_string(), ToString::to_string);
                format!(
                    "The current temperature is {current} degrees, with the target set to {target}, sir."
                )
            })
        };

        match outcome {
            Ok(message) => WorkflowResult::success(
                message,
                json!({ "temperature": entities.temperature }),
            ),
            Err(e) => WorkflowResult::failure(
                "The climate system is being uncooperative, sir.",
                e.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkflowStatus;
    use crate::workflows::extract_entities;

    #[test]
    fn light_entity_mapping() {
        assert_eq!(light_entity_for_room("living room"), "light.living_room");
        assert_eq!(light_entity_for_room("kitchen"), "light.kitchen");
        assert_eq!(light_entity_for_room("all"), "all");
        assert_eq!(light_entity_for_room("guest room"), "light.guest_room");
    }

    #[test]
    fn lock_entity_mapping() {
        assert_eq!(lock_entity_for_door("front"), "lock.front_door");
        assert_eq!(lock_entity_for_door("garage"), "lock.garage_door");
    }

    #[tokio::test]
    async fn unconfigured_lights_fail_with_diagnostic() {
        let workflow = HassLightsWorkflow::new(None);
        let entities = extract_entities("turn on the kitchen lights");
        let result = workflow.execute("turn on the kitchen lights", &entities).await;

        assert_eq!(result.status, WorkflowStatus::Failure);
        assert_eq!(result.error.as_deref(), Some("No Home Assistant client"));
    }

    #[test]
    fn lights_trigger_matches() {
        let workflow = HassLightsWorkflow::new(None);
        assert!(workflow.matches("turn on the living room lights"));
        assert!(workflow.matches("dim the bedroom lamp"));
        assert!(!workflow.matches("lock the front entrance"));
    }
}
