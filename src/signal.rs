//! Signal resolution: landmark frames, layer viewports, pointer/keyboard.
//!
//! Per-frame landmark payloads arrive from an external detector as arrays of
//! normalized `{x, y, z, visibility}` points grouped by source (pose, hands,
//! face); absence of a group means that source currently has no detection.
//! This module owns the latest frame per layer plus the pointer/keyboard
//! state, and resolves a shape's configured stream to a concrete target:
//! a unit-square point (after mirror and viewport mapping) or a boolean key
//! state.

#[cfg(test)]
#[path = "signal_test.rs"]
mod signal_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::event::{Interaction, SignalSource};
use crate::geom::Point;

/// One normalized landmark from the external detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: Option<f64>,
}

/// A per-frame landmark payload. Missing groups mean no detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    /// Look up a landmark by key; `None` when the group has no detection or
    /// the index is out of range.
    #[must_use]
    pub fn lookup(&self, key: &LandmarkKey) -> Option<Landmark> {
        let group = match key.group {
            LandmarkGroup::Pose => self.pose_landmarks.as_ref(),
            LandmarkGroup::LeftHand => self.left_hand_landmarks.as_ref(),
            LandmarkGroup::RightHand => self.right_hand_landmarks.as_ref(),
            LandmarkGroup::Face => self.face_landmarks.as_ref(),
        };
        group?.get(key.index).copied()
    }
}

/// Which landmark array a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkGroup {
    Pose,
    LeftHand,
    RightHand,
    Face,
}

/// Parsed form of a symbolic landmark key such as `"pose.15"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkKey {
    pub group: LandmarkGroup,
    pub index: usize,
}

impl LandmarkKey {
    /// Parse `"<group>.<index>"`; unknown groups or bad indices yield `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let (group, index) = key.split_once('.')?;
        let group = match group {
            "pose" => LandmarkGroup::Pose,
            "leftHand" => LandmarkGroup::LeftHand,
            "rightHand" => LandmarkGroup::RightHand,
            "face" => LandmarkGroup::Face,
            _ => return None,
        };
        let Ok(index) = index.parse() else {
            return None;
        };
        Some(Self { group, index })
    }
}

/// Destination rectangle a layer's `[0,1]` space maps into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }
    }
}

impl Viewport {
    /// Affine-map a source-normalized point into this rectangle:
    /// `dest = origin + uv ⊙ size`.
    #[must_use]
    pub fn map(&self, uv: Point) -> Point {
        Point::new(self.x + uv.x * self.width, self.y + uv.y * self.height)
    }
}

/// Per-layer configuration for landmark mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Where the layer's unit space lands on the canvas.
    #[serde(default)]
    pub viewport: Viewport,
    /// Horizontal flip applied before viewport mapping.
    #[serde(default)]
    pub mirror: bool,
}

#[derive(Debug, Default)]
struct LayerState {
    config: LayerConfig,
    frame: Option<LandmarkFrame>,
}

/// Normalized pointer state delivered by the input shell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// Pointer position in unit-square coordinates.
    pub position: Point,
    /// Whether the primary button is held.
    pub is_down: bool,
}

/// A resolved signal target for one shape and tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// A spatial point to hit-test against the shape.
    At(Point),
    /// A boolean activation with no spatial test (keyboard source).
    Active(bool),
}

/// Latest signal inputs: one frame per layer, pointer, and key-down set.
#[derive(Debug, Default)]
pub struct SignalState {
    layers: HashMap<String, LayerState>,
    pointer: PointerState,
    keys: HashSet<String>,
}

impl SignalState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a layer's mapping configuration.
    pub fn configure_layer(&mut self, layer: &str, config: LayerConfig) {
        self.layers.entry(layer.to_string()).or_default().config = config;
    }

    /// Store a layer's latest landmark frame.
    pub fn submit_frame(&mut self, layer: &str, frame: LandmarkFrame) {
        self.layers.entry(layer.to_string()).or_default().frame = Some(frame);
    }

    /// Drop a layer's landmark frame (detector lost the subject).
    pub fn clear_frame(&mut self, layer: &str) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.frame = None;
        }
    }

    /// Remove a layer entirely.
    pub fn remove_layer(&mut self, layer: &str) {
        self.layers.remove(layer);
    }

    /// Update the pointer position/button state.
    pub fn set_pointer(&mut self, pointer: PointerState) {
        self.pointer = pointer;
    }

    /// Mark a key as held.
    pub fn key_down(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    /// Mark a key as released.
    pub fn key_up(&mut self, key: &str) {
        self.keys.remove(key);
    }

    /// Current pointer state.
    #[must_use]
    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Resolve an interaction's stream to a target for this tick. `None`
    /// means the shape is skipped (missing layer, no detection, bad key, or
    /// pointer-button source without the button held).
    #[must_use]
    pub fn resolve(&self, interaction: &Interaction) -> Option<Target> {
        match &interaction.stream {
            SignalSource::Pointer => {
                if interaction.landmark == "button" && !self.pointer.is_down {
                    return None;
                }
                Some(Target::At(self.pointer.position))
            }
            SignalSource::Keyboard => {
                Some(Target::Active(self.keys.contains(&interaction.landmark)))
            }
            SignalSource::Layer(id) => {
                let layer = self.layers.get(id)?;
                let frame = layer.frame.as_ref()?;
                let key = LandmarkKey::parse(&interaction.landmark)?;
                let landmark = frame.lookup(&key)?;
                let mut uv = Point::new(landmark.x, landmark.y);
                if layer.config.mirror {
                    uv.x = 1.0 - uv.x;
                }
                Some(Target::At(layer.config.viewport.map(uv)))
            }
        }
    }
}
