//! Template workflows
//!
//! Capability shells without real controllers behind them. They demonstrate
//! the workflow contract and answer in character; callers replace them with
//! real integrations (Home Assistant, Philips Hue) at registration time.

use async_trait::async_trait;
use serde_json::json;

use super::{Action, Entities, Trigger, Workflow, WorkflowResult};

/// Doorbell events and door lock control
pub struct DoorbellWorkflow {
    trigger: Trigger,
    configured: bool,
}

impl DoorbellWorkflow {
    /// Template instance with no door controller attached
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            trigger: Trigger::new(
                &["door", "doorbell", "lock", "unlock", "visitor", "entrance"],
                &[
                    r"who.*(at|the) door",
                    r"(lock|unlock).*(door|entrance)",
                    r"check.*(door|entrance|visitor)",
                    r"let .* in",
                    r"open .* door",
                ],
                &[
                    "Who's at the door?",
                    "Lock the front door",
                    "Unlock the back door",
                    "Check the doorbell camera",
                    "Let them in",
                ],
            ),
            configured: false,
        }
    }
}

#[async_trait]
impl Workflow for DoorbellWorkflow {
    fn name(&self) -> &str {
        "doorbell"
    }

    fn description(&self) -> &str {
        "Check doorbell camera, see who's at the door, lock/unlock doors"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        let action = entities.action.unwrap_or(Action::Check);
        let door = entities.door.as_deref().unwrap_or("front");

        if !self.configured {
            return WorkflowResult::failure(
                "The door systems are not yet configured, sir. I suggest we remedy that.",
                "No door controller configured",
            );
        }

        let message = match action {
            Action::Check => "I'm checking the door camera now, sir.".to_string(),
            Action::Lock => format!("The {door} door is now secured, sir."),
            Action::Unlock => format!(
                "I've unlocked the {door} door, sir. Do try not to let in anyone unsavoury."
            ),
            _ => "Door action completed, sir.".to_string(),
        };

        WorkflowResult::success(message, json!({ "door": door, "action": action.as_str() }))
    }
}

/// Thermostat and temperature control
pub struct ThermostatWorkflow {
    trigger: Trigger,
    configured: bool,
}

impl ThermostatWorkflow {
    /// Template instance with no thermostat controller attached
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            trigger: Trigger::new(
                &[
                    "temperature",
                    "thermostat",
                    "heat",
                    "cool",
                    "warm",
                    "cold",
                    "AC",
                    "heating",
                ],
                &[
                    r"set.*(temp|temperature|thermostat)",
                    r"(warm|heat|cool).*up",
                    r"turn (on|off).*(heat|AC|cooling|heating)",
                    r"(too|it's).*(hot|cold|warm)",
                    r"make it (warm|cool|cold)",
                ],
                &[
                    "Set the temperature to 72 degrees",
                    "It's too cold in here",
                    "Turn on the AC",
                    "Warm it up a bit",
                ],
            ),
            configured: false,
        }
    }
}

#[async_trait]
impl Workflow for ThermostatWorkflow {
    fn name(&self) -> &str {
        "thermostat"
    }

    fn description(&self) -> &str {
        "Control thermostat - set temperature, change modes"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        if !self.configured {
            return WorkflowResult::failure(
                "The climate control system awaits configuration, sir.",
                "No thermostat controller configured",
            );
        }

        let message = entities.temperature.map_or_else(
            || "I've adjusted the temperature to something more agreeable, sir.".to_string(),
            |t| format!("I've set the temperature to {t} degrees, sir. Comfort should arrive shortly."),
        );

        WorkflowResult::success(message, json!({ "temperature": entities.temperature }))
    }
}

/// TV, speakers, and media playback
///
/// Not registered by default: its keywords ("movie", "play") collide with
/// the Hue mood triggers.
pub struct MediaWorkflow {
    trigger: Trigger,
    configured: bool,
}

impl MediaWorkflow {
    /// Template instance with no media controller attached
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            trigger: Trigger::new(
                &[
                    "TV", "television", "music", "play", "pause", "volume", "speaker", "movie",
                ],
                &[
                    r"turn (on|off).*(TV|television)",
                    r"play .*(music|song|movie)",
                    r"(pause|stop|resume)",
                    r"(volume|louder|quieter)",
                    r"(mute|unmute)",
                    r"watch .*(netflix|youtube|movie)",
                ],
                &[
                    "Turn on the TV",
                    "Play some jazz music",
                    "Pause the movie",
                    "Turn up the volume",
                ],
            ),
            configured: false,
        }
    }
}

#[async_trait]
impl Workflow for MediaWorkflow {
    fn name(&self) -> &str {
        "media"
    }

    fn description(&self) -> &str {
        "Control TV, speakers, music playback"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, entities: &Entities) -> WorkflowResult {
        if !self.configured {
            return WorkflowResult::failure(
                "The entertainment systems require configuration, sir.",
                "No media controller configured",
            );
        }

        let action = entities.action.unwrap_or(Action::Toggle);
        let message = match action {
            Action::On => "Powering on the television, sir.".to_string(),
            Action::Off => "The television is now off, sir. Perhaps a book instead?".to_string(),
            _ => "Media command executed, sir.".to_string(),
        };

        WorkflowResult::success(message, json!({ "action": action.as_str() }))
    }
}

/// Weather information
///
/// Placeholder until a weather API is wired in; still succeeds so the user
/// gets an honest in-character answer rather than an error.
pub struct WeatherWorkflow {
    trigger: Trigger,
}

impl WeatherWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trigger: Trigger::new(
                &["weather", "temperature", "rain", "sunny", "forecast", "outside"],
                &[
                    r"(what|how).*(weather|outside)",
                    r"is it.*(rain|sunny|cold|hot)",
                    r"(will|going to) .*(rain|snow)",
                    r"forecast",
                    r"should i .*(umbrella|jacket)",
                ],
                &[
                    "What's the weather like?",
                    "Is it going to rain today?",
                    "What's the forecast for tomorrow?",
                    "Should I bring an umbrella?",
                ],
            ),
        }
    }
}

impl Default for WeatherWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Workflow for WeatherWorkflow {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get current weather and forecasts"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, _utterance: &str, _entities: &Entities) -> WorkflowResult {
        WorkflowResult::success(
            "I would check the weather, sir, but I haven't been connected to a weather service yet.",
            serde_json::Value::Null,
        )
    }
}

/// Timers, alarms, and reminders
pub struct TimerWorkflow {
    trigger: Trigger,
}

impl TimerWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trigger: Trigger::new(
                &["timer", "alarm", "remind", "reminder", "wake", "minutes", "hours"],
                &[
                    r"set.*(timer|alarm|reminder)",
                    r"remind me",
                    r"in \d+ (minute|hour|second)",
                    r"wake me",
                    r"(cancel|stop).*(timer|alarm)",
                ],
                &[
                    "Set a timer for 10 minutes",
                    "Remind me in an hour",
                    "Wake me up at 7am",
                    "Cancel the timer",
                ],
            ),
        }
    }
}

impl Default for TimerWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Workflow for TimerWorkflow {
    fn name(&self) -> &str {
        "timer"
    }

    fn description(&self) -> &str {
        "Set timers, alarms, and reminders"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn execute(&self, utterance: &str, _entities: &Entities) -> WorkflowResult {
        let lower = utterance.to_lowercase();
        let message = if lower.contains("cancel") || lower.contains("stop") {
            "Timer cancelled, sir."
        } else {
            "I've set the timer, sir. I shall alert you when it expires."
        };

        WorkflowResult::success(message, serde_json::Value::Null)
    }
}
