//! Philips Hue integration
//!
//! REST client for the Hue Bridge plus a lights workflow with mood presets.
//! The bridge serves HTTPS with a self-signed certificate, so certificate
//! verification is disabled for this client only. Configure with
//! `HUE_BRIDGE_IP`, `HUE_BRIDGE_PORT` (default 443), and `HUE_USERNAME`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::OnceCell;

use crate::{Error, Result};

use super::{Action, Entities, Mood, Trigger, Workflow, WorkflowResult};

/// Hue Bridge connection settings
#[derive(Debug, Clone, Default)]
pub struct HueConfig {
    pub bridge_ip: String,
    pub bridge_port: u16,
    /// API application key ("username")
    pub username: String,
}

impl HueConfig {
    /// Read settings from `HUE_BRIDGE_IP` / `HUE_BRIDGE_PORT` / `HUE_USERNAME`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bridge_ip: std::env::var("HUE_BRIDGE_IP").unwrap_or_default(),
            bridge_port: std::env::var("HUE_BRIDGE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(443),
            username: std::env::var("HUE_USERNAME").unwrap_or_default(),
        }
    }

    /// Whether both bridge address and application key are present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.bridge_ip.is_empty() && !self.username.is_empty()
    }
}

/// Name-to-ID lookup maps built by discovery
#[derive(Debug, Default)]
struct NameMaps {
    lights: HashMap<String, String>,
    groups: HashMap<String, String>,
}

/// Client for the Hue Bridge REST API
///
/// Light and group names are discovered lazily on first use and cached for
/// the lifetime of the client.
pub struct HueClient {
    client: reqwest::Client,
    base_url: String,
    names: OnceCell<NameMaps>,
}

impl HueClient {
    /// Create a client from connection settings
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &HueConfig) -> Result<Self> {
        // The bridge presents a self-signed certificate
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Hue(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!(
                "https://{}:{}/api/{}",
                config.bridge_ip, config.bridge_port, config.username
            ),
            names: OnceCell::new(),
        })
    }

    /// Create a client from the environment, if fully configured
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let config = HueConfig::from_env();
        config.is_configured().then(|| Self::new(&config).ok()).flatten()
    }

    /// `GET /lights` - all lights keyed by ID
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge reports an error
    pub async fn get_lights(&self) -> Result<serde_json::Value> {
        self.get("lights").await
    }

    /// `GET /groups` - all groups/rooms keyed by ID
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge reports an error
    pub async fn get_groups(&self) -> Result<serde_json::Value> {
        self.get("groups").await
    }

    /// `PUT /lights/{id}/state` - set state for a single light
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge reports an error
    pub async fn set_light_state(&self, light_id: &str, state: &serde_json::Value) -> Result<()> {
        self.put(&format!("lights/{light_id}/state"), state).await
    }

    /// `PUT /groups/{id}/action` - set action for a group/room
    ///
    /// Group "0" is the special Hue group covering all lights.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge reports an error
    pub async fn set_group_action(&self, group_id: &str, action: &serde_json::Value) -> Result<()> {
        self.put(&format!("groups/{group_id}/action"), action).await
    }

    /// Case-insensitive light name lookup; discovers names on first call
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails
    pub async fn find_light_id(&self, name: &str) -> Result<Option<String>> {
        let maps = self.discover().await?;
        Ok(maps.lights.get(&name.to_lowercase()).cloned())
    }

    /// Case-insensitive group/room name lookup; discovers names on first call
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails
    pub async fn find_group_id(&self, name: &str) -> Result<Option<String>> {
        let maps = self.discover().await?;
        Ok(maps.groups.get(&name.to_lowercase()).cloned())
    }

    /// Fetch lights and groups once, building the name lookup maps
    async fn discover(&self) -> Result<&NameMaps> {
        self.names
            .get_or_try_init(|| async {
                let lights = collect_names(&self.get_lights().await?);
                let groups = collect_names(&self.get_groups().await?);

                tracing::info!(
                    lights = lights.len(),
                    groups = groups.len(),
                    "hue discovery complete"
                );

                Ok(NameMaps { lights, groups })
            })
            .await
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{path}", self.base_url);
        let data: serde_json::Value = self.client.get(&url).send().await?.json().await?;
        check_hue_errors(&data)?;
        Ok(data)
    }

    async fn put(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let url = format!("{}/{path}", self.base_url);
        let data: serde_json::Value = self.client.put(&url).json(body).send().await?.json().await?;
        check_hue_errors(&data)
    }
}

/// Build a lowercased name-to-ID map from a `/lights` or `/groups` response
fn collect_names(data: &serde_json::Value) -> HashMap<String, String> {
    data.as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(id, info)| {
                    info.get("name")
                        .and_then(|n| n.as_str())
                        .map(|name| (name.to_lowercase(), id.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The bridge returns HTTP 200 even for errors: the body is a list whose
/// items carry an `error` object when something went wrong
fn check_hue_errors(data: &serde_json::Value) -> Result<()> {
    if let Some(items) = data.as_array() {
        for item in items {
            if let Some(err) = item.get("error") {
                let kind = err.get("type").map_or_else(|| "?".to_string(), ToString::to_string);
                let description = err
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("unknown");
                return Err(Error::Hue(format!("bridge error {kind}: {description}")));
            }
        }
    }
    Ok(())
}

/// Convert brightness 0-100% to Hue's 0-254 scale
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn pct_to_bri(pct: u8) -> u8 {
    (f32::from(pct.min(100)) * 254.0 / 100.0).round() as u8
}

/// Hue state payload for each mood preset
///
/// `bri` is 0-254; `ct` is colour temperature in mireds (153 cool daylight,
/// 500 warm candlelight); `hue` 0-65535; `sat` 0-254.
fn mood_state(mood: Mood) -> serde_json::Value {
    match mood {
        Mood::Romantic => json!({ "on": true, "bri": 77, "ct": 500 }),
        Mood::Relax => json!({ "on": true, "bri": 127, "ct": 447 }),
        Mood::Energize => json!({ "on": true, "bri": 254, "ct": 250 }),
        Mood::Party => json!({ "on": true, "bri": 254, "sat": 254, "hue": 47000 }),
        Mood::Bedtime => json!({ "on": true, "bri": 25, "ct": 500 }),
        Mood::Focus => json!({ "on": true, "bri": 254, "ct": 300 }),
        Mood::Movie => json!({ "on": true, "bri": 38, "ct": 400 }),
        Mood::Morning => json!({ "on": true, "bri": 200, "ct": 350 }),
    }
}

/// Spoken confirmation for each mood preset
const fn mood_response(mood: Mood) -> &'static str {
    match mood {
        Mood::Romantic => "I've set the mood for a romantic evening, sir. Dim and warm, as one does.",
        Mood::Relax => "The lights are now set for relaxation, sir. Do take it easy.",
        Mood::Energize => "Bright and invigorating, sir. Ready to conquer the day.",
        Mood::Party => "Party mode engaged, sir. I trust the neighbours have been forewarned.",
        Mood::Bedtime => "The lights are dimmed for bedtime, sir. Sweet dreams.",
        Mood::Focus => "Bright and focused, sir. Productivity awaits.",
        Mood::Movie => "Lights dimmed for cinema mode, sir. Popcorn is your department.",
        Mood::Morning => "Good morning, sir. The lights are set to ease you into the day.",
    }
}

/// Lights control through a Philips Hue Bridge
///
/// Prefers group (room) control and falls back to individual light lookup.
/// Mood commands with no room specified target all lights via group "0".
pub struct HueLightsWorkflow {
    trigger: Trigger,
    client: Option<HueClient>,
}

impl HueLightsWorkflow {
    /// Build with an explicit client
    #[must_use]
    pub fn new(client: Option<HueClient>) -> Self {
        Self {
            trigger: Trigger::new(
                &[
                    "light", "lights", "lamp", "illuminate", "bright", "dim",
                    "romantic", "romance", "relax", "chill", "calm",
                    "energize", "energetic", "party", "celebrate",
                    "bedtime", "sleep", "going to bed", "good night",
                    "focus", "concentrate", "study",
                    "movie", "cinema", "movie night",
                    "morning", "wake up", "good morning",
                    "mood",
                ],
                &[
                    r"turn (on|off) .*(light|lamp)",
                    r"(light|lamp).* (on|off)",
                    r"dim .*(light|lamp)",
                    r"set .*(light|lamp).* to",
                    r"(bright|dark)en",
                    r"(romantic|relax|party|bedtime|focus|movie|morning|energize)\s*(mood|mode|setting|vibe)?",
                    r"(i am |i'm |feeling |in a ).*(romantic|relaxed|sleepy|party|focused)",
                    r"(going to |time for ).*(bed|sleep)",
                    r"(good\s*(night|morning))",
                ],
                &[
                    "Turn on the living room lights",
                    "Dim the bedroom lights to 50%",
                    "Turn off all the lights",
                    "I am in a romantic mood",
                    "Set the lights to party mode",
                    "I'm going to bed",
                    "Movie night",
                    "Good morning",
                ],
            ),
            client,
        }
    }

    /// Build from `HUE_BRIDGE_IP` / `HUE_USERNAME`
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HueClient::from_env())
    }

    /// Apply a state payload to the requested room, preferring groups
    async fn apply_state(
        client: &HueClient,
        room: &str,
        state: &serde_json::Value,
    ) -> Result<()> {
        if matches!(room, "all" | "everywhere" | "everything" | "every room") {
            return client.set_group_action("0", state).await;
        }

        if let Some(group_id) = client.find_group_id(room).await? {
            return client.set_group_action(&group_id, state).await;
        }

        if let Some(light_id) = client.find_light_id(room).await? {
            return client.set_light_state(&light_id, state).await;
        }

        Err(Error::Hue(format!("unknown light or room: {room}")))
    }

    /// Spoken confirmation for the non-mood actions
    fn build_response(action: Action, room: &str, brightness: Option<u8>) -> String {
        match action {
            Action::On => brightness.map_or_else(
                || format!("I've illuminated the {room}, sir."),
                |pct| format!("I've set the {room} lights to {pct}%, sir."),
            ),
            Action::Off => format!("The {room} is now dark, sir. Do try not to stub your toe."),
            Action::Dim if brightness.is_some() => format!(
                "I've dimmed the {room} lights to {}%, sir.",
                brightness.unwrap_or_default()
            ),
            _ => format!("I've toggled the {room} lights, sir."),
        }
    }
}

#[async_trait]
impl Workflow for HueLightsWorkflow {
    fn name(&self) -> &str {
        "hue_lights"
    }

    fn description(&self) -> &str {
        "Control lights through Philips Hue Bridge"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        let Some(client) = &self.client else {
            return WorkflowResult::failure(
                "Philips Hue is not configured. Please set HUE_BRIDGE_IP and HUE_USERNAME environment variables.",
                "No Hue client",
            );
        };

        let action = entities.action.unwrap_or(Action::Toggle);
        let room = entities.room.as_deref().unwrap_or("all");
        let brightness = entities.brightness;
        let mood = entities.mood;

        let state = match (action, mood) {
            (Action::Mood, Some(m)) => mood_state(m),
            (Action::On, _) => {
                let mut state = json!({ "on": true });
                if let (Some(pct), Some(map)) = (brightness, state.as_object_mut()) {
                    map.insert("bri".to_string(), json!(pct_to_bri(pct)));
                }
                state
            }
            (Action::Off, _) => json!({ "on": false }),
            (Action::Dim, _) if brightness.is_some() => {
                json!({ "on": true, "bri": pct_to_bri(brightness.unwrap_or_default()) })
            }
            // The bridge has no native group toggle; on is the sane default
            _ => json!({ "on": true }),
        };

        if let Err(e) = Self::apply_state(client, room, &state).await {
            let message = if matches!(e, Error::Hue(ref msg) if msg.starts_with("unknown light")) {
                format!("I could not find a light or room called '{room}', sir.")
            } else {
                format!("I encountered difficulty with the lights, sir. The error was: {e}")
            };
            return WorkflowResult::failure(message, e.to_string());
        }

        let message = match (action, mood) {
            (Action::Mood, Some(m)) => mood_response(m).to_string(),
            _ => Self::build_response(action, room, brightness),
        };

        WorkflowResult::success(
            message,
            json!({
                "room": room,
                "action": action.as_str(),
                "brightness": brightness,
                "mood": mood.map(Mood::as_str),
            }),
        )
    }
}
