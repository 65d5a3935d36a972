//! Entity extraction
//!
//! A deterministic keyword/regex pass over the utterance. This is
//! intentionally simple: workflows depend on its exact output shape, so it
//! must stay a fixed rule scan rather than anything statistical.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Action requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    On,
    Off,
    Dim,
    Lock,
    Unlock,
    Check,
    /// Set a mood preset; always paired with [`Entities::mood`]
    Mood,
    /// Workflow-side default only, never produced by extraction
    Toggle,
}

impl Action {
    /// Stable lowercase name, used in structured result data
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Dim => "dim",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Check => "check",
            Self::Mood => "mood",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named lighting preset
///
/// Declaration order is the scan order: the first mood whose keyword list
/// hits the utterance wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Romantic,
    Relax,
    Energize,
    Party,
    Bedtime,
    Focus,
    Movie,
    Morning,
}

impl Mood {
    /// All moods in scan-priority order
    pub const ALL: [Self; 8] = [
        Self::Romantic,
        Self::Relax,
        Self::Energize,
        Self::Party,
        Self::Bedtime,
        Self::Focus,
        Self::Movie,
        Self::Morning,
    ];

    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Romantic => "romantic",
            Self::Relax => "relax",
            Self::Energize => "energize",
            Self::Party => "party",
            Self::Bedtime => "bedtime",
            Self::Focus => "focus",
            Self::Movie => "movie",
            Self::Morning => "morning",
        }
    }

    /// Keywords whose presence selects this mood
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Romantic => &["romantic", "romance", "date night", "intimate", "candlelight"],
            Self::Relax => &[
                "relax", "relaxing", "chill", "calm", "unwind", "wind down", "peaceful",
            ],
            Self::Energize => &[
                "energize", "energetic", "energy", "pump up", "motivated", "productive",
            ],
            Self::Party => &["party", "dance", "celebrate", "celebration", "fiesta"],
            Self::Bedtime => &[
                "bed",
                "sleep",
                "bedtime",
                "good night",
                "goodnight",
                "going to bed",
                "sleepy",
                "night night",
            ],
            Self::Focus => &["focus", "concentrate", "study", "reading", "work mode"],
            Self::Movie => &["movie", "cinema", "film", "movie night", "watching"],
            Self::Morning => &["morning", "wake up", "sunrise", "good morning"],
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rooms recognised by the extractor, in scan order
const ROOMS: [&str; 8] = [
    "living room",
    "bedroom",
    "kitchen",
    "bathroom",
    "office",
    "garage",
    "basement",
    "attic",
];

/// Doors recognised by the extractor, in scan order
const DOORS: [&str; 4] = ["front", "back", "side", "garage"];

/// Attribute bag extracted from a single utterance
///
/// Created fresh per utterance and discarded afterwards. Absent attributes
/// are `None`; workflows supply their own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub action: Option<Action>,
    pub room: Option<String>,
    pub door: Option<String>,
    pub mood: Option<Mood>,
    /// Brightness percentage, set when the first number is <= 100
    pub brightness: Option<u8>,
    /// Temperature, set when the first number exceeds 100
    pub temperature: Option<u32>,
}

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit regex is valid"))
}

/// Extract entities from an utterance
///
/// Rules, in order:
/// 1. action phrases (on/off/dim/lock/unlock/check), first match wins
/// 2. room, door: first listed name found as a substring
/// 3. mood table in [`Mood::ALL`] order; a hit overrides the action to
///    [`Action::Mood`]
/// 4. first digit run: <= 100 is brightness, anything larger temperature
///
/// This function never fails; unmatched attributes stay `None`.
#[must_use]
pub fn extract_entities(text: &str) -> Entities {
    let lower = text.to_lowercase();
    let mut entities = Entities::default();

    // Action, first rule wins
    if ["turn on", "switch on", "enable"].iter().any(|p| lower.contains(p)) {
        entities.action = Some(Action::On);
    } else if ["turn off", "switch off", "disable"].iter().any(|p| lower.contains(p)) {
        entities.action = Some(Action::Off);
    } else if lower.contains("dim") {
        entities.action = Some(Action::Dim);
    } else if lower.contains("lock") && !lower.contains("unlock") {
        entities.action = Some(Action::Lock);
    } else if lower.contains("unlock") {
        entities.action = Some(Action::Unlock);
    } else if lower.contains("check") || lower.contains("who") {
        entities.action = Some(Action::Check);
    }

    entities.room = ROOMS
        .iter()
        .find(|room| lower.contains(*room))
        .map(ToString::to_string);

    entities.door = DOORS
        .iter()
        .find(|door| lower.contains(*door))
        .map(ToString::to_string);

    // Mood scan runs after the basic action scan and takes precedence
    for mood in Mood::ALL {
        if mood.keywords().iter().any(|kw| lower.contains(kw)) {
            entities.mood = Some(mood);
            entities.action = Some(Action::Mood);
            break;
        }
    }

    // First digit run decides brightness vs temperature via the 100 threshold
    if let Some(m) = digit_run_regex().find(&lower) {
        if let Ok(value) = m.as_str().parse::<u32>() {
            if value <= 100 {
                #[allow(clippy::cast_possible_truncation)]
                {
                    entities.brightness = Some(value as u8);
                }
            } else {
                entities.temperature = Some(value);
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_off_kitchen() {
        let e = extract_entities("turn off the kitchen lights");
        assert_eq!(e.action, Some(Action::Off));
        assert_eq!(e.room.as_deref(), Some("kitchen"));
        assert_eq!(e.mood, None);
    }

    #[test]
    fn mood_overrides_action() {
        let e = extract_entities("I'm going to bed");
        assert_eq!(e.action, Some(Action::Mood));
        assert_eq!(e.mood, Some(Mood::Bedtime));
    }

    #[test]
    fn mood_overrides_explicit_on() {
        // "turn on" sets On first, then the mood scan overrides it
        let e = extract_entities("turn on party mode");
        assert_eq!(e.action, Some(Action::Mood));
        assert_eq!(e.mood, Some(Mood::Party));
    }

    #[test]
    fn number_threshold_brightness() {
        let e = extract_entities("set it to 72");
        assert_eq!(e.brightness, Some(72));
        assert_eq!(e.temperature, None);
    }

    #[test]
    fn number_threshold_temperature() {
        let e = extract_entities("set it to 150");
        assert_eq!(e.brightness, None);
        assert_eq!(e.temperature, Some(150));
    }

    #[test]
    fn first_number_wins() {
        let e = extract_entities("dim to 40 not 90");
        assert_eq!(e.action, Some(Action::Dim));
        assert_eq!(e.brightness, Some(40));
    }

    #[test]
    fn lock_vs_unlock() {
        assert_eq!(extract_entities("lock the door").action, Some(Action::Lock));
        assert_eq!(
            extract_entities("unlock the door").action,
            Some(Action::Unlock)
        );
    }

    #[test]
    fn lock_front_door() {
        let e = extract_entities("lock the front door");
        assert_eq!(e.action, Some(Action::Lock));
        assert_eq!(e.door.as_deref(), Some("front"));
    }

    #[test]
    fn who_maps_to_check() {
        let e = extract_entities("who is at the door");
        assert_eq!(e.action, Some(Action::Check));
    }

    #[test]
    fn room_scan_order_is_fixed() {
        // "garage" appears in both the room and door lists
        let e = extract_entities("open the garage");
        assert_eq!(e.room.as_deref(), Some("garage"));
        assert_eq!(e.door.as_deref(), Some("garage"));
    }

    #[test]
    fn mood_priority_follows_declaration_order() {
        // "relax" precedes "movie" in the table
        let e = extract_entities("a relaxing movie");
        assert_eq!(e.mood, Some(Mood::Relax));
    }

    #[test]
    fn empty_utterance_yields_nothing() {
        assert_eq!(extract_entities(""), Entities::default());
    }

    #[test]
    fn huge_number_is_ignored() {
        // Overflowing digit runs are dropped rather than erroring
        let e = extract_entities("set it to 99999999999999999999");
        assert_eq!(e.brightness, None);
        assert_eq!(e.temperature, None);
    }
}
