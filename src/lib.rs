//! Vector-shape editing and gesture-to-MIDI mapping core.
//!
//! This crate owns the canonical shape state for a canvas of vector shapes
//! drawn over a live video feed, the selection/transform math for editing
//! them, and the per-frame interaction runtime that tests landmark, pointer,
//! and keyboard signals against each shape and emits MIDI through an
//! abstract sink. Rendering, camera/video management, device enumeration,
//! and persistence are the host's concern: it feeds normalized input in and
//! processes the returned [`engine::Action`]s and MIDI messages.
//!
//! All coordinates are unit-square `[0,1]`, independent of device pixels.
//! Evaluation is single-threaded and tick-driven; one editing session at a
//! time, one runtime pass per delivered frame.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editing engine: pointer/key handlers, sessions, [`engine::Action`] |
//! | [`store`] | Insertion-ordered shape repository with transactions |
//! | [`shape`] | Shape data model and JSON wire shape |
//! | [`event`] | Interaction/event model (signal sources, triggers, values) |
//! | [`geom`] | Pure geometry: containment, bounds, simplify, smooth |
//! | [`selection`] | Selection frame and snapshot-relative transforms |
//! | [`input`] | Tools, modifiers, and the session state machine |
//! | [`signal`] | Landmark frames, viewport mapping, pointer/keyboard state |
//! | [`runtime`] | Per-tick trigger state machine driving the MIDI sink |
//! | [`midi`] | MIDI sink trait, status bytes, null/recording sinks |
//! | [`consts`] | Shared numeric constants |

pub mod consts;
pub mod engine;
pub mod event;
pub mod geom;
pub mod input;
pub mod midi;
pub mod runtime;
pub mod selection;
pub mod shape;
pub mod signal;
pub mod store;
