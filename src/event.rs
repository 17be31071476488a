//! Interaction model: signal sources, triggers, and MIDI event bindings.
//!
//! A shape's optional [`Interaction`] binds it to one signal source (a
//! landmark layer, the pointer, or the keyboard) and carries the list of MIDI
//! events to fire as the resolved signal point enters, leaves, or stays
//! inside the shape. Events are a tagged union ([`EventKind`]) so trigger
//! handling can match exhaustively instead of probing for fields.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use serde::{Deserialize, Serialize};

/// Identifier of a signal-producing layer, or one of the two literal
/// non-landmark sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalSource {
    /// Raw pointer position.
    Pointer,
    /// Boolean key state; no spatial test.
    Keyboard,
    /// A landmark-producing layer, identified by its layer id.
    Layer(String),
}

impl From<String> for SignalSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pointer" => Self::Pointer,
            "keyboard" => Self::Keyboard,
            _ => Self::Layer(s),
        }
    }
}

impl From<SignalSource> for String {
    fn from(source: SignalSource) -> Self {
        match source {
            SignalSource::Pointer => "pointer".to_string(),
            SignalSource::Keyboard => "keyboard".to_string(),
            SignalSource::Layer(id) => id,
        }
    }
}

/// Destination port for a shape's MIDI events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortSelector {
    /// Emit to every known output.
    Broadcast,
    /// Emit to the named port only.
    Named(String),
}

impl From<String> for PortSelector {
    fn from(s: String) -> Self {
        if s == "broadcast" { Self::Broadcast } else { Self::Named(s) }
    }
}

impl From<PortSelector> for String {
    fn from(port: PortSelector) -> Self {
        match port {
            PortSelector::Broadcast => "broadcast".to_string(),
            PortSelector::Named(name) => name,
        }
    }
}

impl Default for PortSelector {
    fn default() -> Self {
        Self::Broadcast
    }
}

/// Edge-detection policy controlling when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    /// Fire once on entering the shape.
    #[default]
    Enter,
    /// Fire once on leaving the shape.
    Exit,
    /// Fire "on" on enter and the matching "off" on exit.
    EnterExit,
    /// Re-fire at a fixed minimum interval while inside.
    Inside,
}

/// How an event's 7-bit value (velocity or CC value) is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMode {
    /// Use the configured literal value.
    #[default]
    Constant,
    /// Horizontal position within the shape's bounding box, 0..1.
    NormX,
    /// Vertical position within the shape's bounding box, 0..1.
    NormY,
    /// Radial distance from the bounding-box center, 0 at center, 1 at the
    /// half-extent of the larger axis.
    Distance,
}

/// Identifier for an event within an interaction.
pub type EventId = String;

/// The payload of an event, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventKind {
    /// Placeholder slot; never fires.
    None,
    /// MIDI note on/off pair.
    MidiNote {
        /// Edge policy.
        #[serde(default)]
        trigger: Trigger,
        /// MIDI channel, 1-based (1–16).
        channel: u8,
        /// Note number, 0–127.
        note: u8,
        /// Velocity resolution mode.
        #[serde(default)]
        value_mode: ValueMode,
        /// Literal velocity when `value_mode` is `Constant`.
        #[serde(default = "default_value_constant")]
        value_constant: u8,
    },
    /// MIDI control change.
    MidiCc {
        /// Edge policy.
        #[serde(default)]
        trigger: Trigger,
        /// MIDI channel, 1-based (1–16).
        channel: u8,
        /// Controller number, 0–127.
        cc: u8,
        /// Value resolution mode.
        #[serde(default)]
        value_mode: ValueMode,
        /// Literal value when `value_mode` is `Constant`.
        #[serde(default = "default_value_constant")]
        value_constant: u8,
    },
}

fn default_value_constant() -> u8 {
    100
}

/// One configured event on a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier within the interaction.
    pub id: EventId,
    /// Event payload, tagged by `type`.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// The event's trigger policy, if it has one.
    #[must_use]
    pub fn trigger(&self) -> Option<Trigger> {
        match &self.kind {
            EventKind::None => None,
            EventKind::MidiNote { trigger, .. } | EventKind::MidiCc { trigger, .. } => {
                Some(*trigger)
            }
        }
    }
}

/// Mapping configuration binding a shape to a live signal source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Which signal source drives this shape.
    pub stream: SignalSource,
    /// Symbolic landmark key (`"pose.15"`), pointer sub-source (`"button"`),
    /// or key name for the keyboard source.
    #[serde(default)]
    pub landmark: String,
    /// Destination port for every event on this shape.
    #[serde(default)]
    pub midi_port: PortSelector,
    /// Configured events, evaluated independently each tick.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Master switch; disabled shapes are skipped (with note teardown).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Renderer hint: show in the main view.
    #[serde(default = "default_true")]
    pub show_in_main: bool,
    /// Renderer hint: show in the preview view.
    #[serde(default = "default_true")]
    pub show_in_preview: bool,
}

fn default_true() -> bool {
    true
}

impl Interaction {
    /// A minimal enabled interaction on the given source with no events.
    #[must_use]
    pub fn new(stream: SignalSource) -> Self {
        Self {
            stream,
            landmark: String::new(),
            midi_port: PortSelector::Broadcast,
            events: Vec::new(),
            enabled: true,
            show_in_main: true,
            show_in_preview: true,
        }
    }
}
