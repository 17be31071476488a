//! Interaction runtime: per-tick signal evaluation and MIDI triggering.
//!
//! Once per incoming video/landmark frame (or input change) the host calls
//! [`Runtime::tick`] with a read-only shape snapshot. For every mapped shape
//! the runtime resolves the configured signal to a target point, hit-tests
//! it, detects enter/exit edges, and advances each configured event's
//! trigger state machine, emitting through a [`MidiSink`].
//!
//! The one hard invariant here is stuck-note safety: a `midiNote` event that
//! has sent a note-on is `engaged`, and every path that could abandon it —
//! shape deleted, interaction disabled, event removed or retyped, runtime
//! shutdown — synthesizes the matching note-off to the exact port, channel,
//! and note last used.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

use std::collections::HashMap;

use crate::consts::{HIT_TOLERANCE, INSIDE_RETRIGGER_MS};
use crate::event::{EventId, EventKind, Interaction, PortSelector, Trigger, ValueMode};
use crate::geom::{self, Point};
use crate::midi::{MidiSink, cc_status, data7, note_off_status, note_on_status, value7};
use crate::shape::{Shape, ShapeId};
use crate::signal::{SignalState, Target};
use crate::store::ShapeStore;

/// Continuous position metrics captured while a target point is inside a
/// shape, all normalized to `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Horizontal position within the shape's bounding box.
    pub norm_x: f64,
    /// Vertical position within the shape's bounding box.
    pub norm_y: f64,
    /// Radial distance from the bounding-box center, normalized by half the
    /// larger extent; 0 at the center.
    pub distance: f64,
}

/// The note a note-on was last sent for, so the matching off can follow it
/// even after the configuration changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SentNote {
    port: PortSelector,
    channel: u8,
    note: u8,
}

/// Trigger bookkeeping for one configured event.
#[derive(Debug, Default)]
struct EventState {
    engaged: bool,
    last_trigger_at: Option<f64>,
    last_continuous_at: Option<f64>,
    last_sent: Option<SentNote>,
}

/// Derived per-shape runtime state; never persisted.
#[derive(Debug, Default)]
pub struct ShapeRuntime {
    /// Whether the resolved signal target is currently inside the shape.
    pub inside: bool,
    /// Whether the raw pointer is currently inside the shape (UI highlight).
    pub hover_inside: bool,
    /// Whether the shape is inside or holds any engaged event.
    pub active: bool,
    /// Metrics from the most recent tick the target was inside.
    pub last_metrics: Option<Metrics>,
    events: HashMap<EventId, EventState>,
}

impl ShapeRuntime {
    /// Whether the given event currently holds an outstanding note-on.
    #[must_use]
    pub fn engaged(&self, event_id: &str) -> bool {
        self.events.get(event_id).is_some_and(|e| e.engaged)
    }
}

/// Tick-driven evaluator owning all derived interaction state.
#[derive(Debug, Default)]
pub struct Runtime {
    /// Latest signal inputs (landmark frames, pointer, keyboard).
    pub signals: SignalState,
    states: HashMap<ShapeId, ShapeRuntime>,
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived state for a shape, if it has been evaluated.
    #[must_use]
    pub fn state(&self, shape_id: &str) -> Option<&ShapeRuntime> {
        self.states.get(shape_id)
    }

    /// Run one evaluation pass over the store snapshot at `now_ms`
    /// (milliseconds on any monotonic clock).
    pub fn tick(&mut self, store: &ShapeStore, now_ms: f64, sink: &mut dyn MidiSink) {
        self.release_stale(store, sink);

        for shape in store.list() {
            let Some(interaction) = shape.interaction.as_ref().filter(|i| i.enabled) else {
                // Unmapped or disabled shapes carry no live state; stale
                // engaged notes were already released above.
                if let Some(rt) = self.states.get_mut(&shape.id) {
                    rt.inside = false;
                    rt.hover_inside = false;
                    rt.active = false;
                }
                continue;
            };
            self.evaluate_shape(shape, interaction, now_ms, sink);
        }
    }

    /// Release every outstanding note immediately (shutdown, stream switch).
    pub fn release_all(&mut self, sink: &mut dyn MidiSink) {
        for rt in self.states.values_mut() {
            for es in rt.events.values_mut() {
                release(es, sink);
            }
            rt.active = false;
        }
    }

    /// Drop all derived state for a shape, releasing its engaged notes.
    pub fn forget_shape(&mut self, shape_id: &str, sink: &mut dyn MidiSink) {
        if let Some(mut rt) = self.states.remove(shape_id) {
            for es in rt.events.values_mut() {
                release(es, sink);
            }
        }
    }

    /// Synthesize note-offs for every engaged event whose shape, interaction,
    /// or event no longer exists (or is no longer a note event), and drop
    /// state rows for shapes gone from the store and for event ids no longer
    /// configured on their interaction.
    fn release_stale(&mut self, store: &ShapeStore, sink: &mut dyn MidiSink) {
        self.states.retain(|shape_id, rt| {
            let shape = store.read(shape_id);
            let live = shape
                .and_then(|s| s.interaction.as_ref())
                .filter(|i| i.enabled);
            for (event_id, es) in &mut rt.events {
                if !es.engaged {
                    continue;
                }
                let still_note = live.is_some_and(|i| {
                    i.events
                        .iter()
                        .any(|e| e.id == *event_id && matches!(e.kind, EventKind::MidiNote { .. }))
                });
                if !still_note {
                    tracing::debug!(shape = %shape_id, event = %event_id, "releasing stale note");
                    release(es, sink);
                }
            }
            // Rows for events removed from the interaction never come back;
            // drop them instead of carrying them for the shape's lifetime.
            rt.events.retain(|event_id, _| {
                live.is_some_and(|i| i.events.iter().any(|e| e.id == *event_id))
            });
            shape.is_some()
        });
    }

    fn evaluate_shape(
        &mut self,
        shape: &Shape,
        interaction: &Interaction,
        now_ms: f64,
        sink: &mut dyn MidiSink,
    ) {
        let target = self.signals.resolve(interaction);
        let pointer = self.signals.pointer();
        let rt = self.states.entry(shape.id.clone()).or_default();

        rt.hover_inside = geom::contains_point(shape, pointer.position, HIT_TOLERANCE);

        // A missing layer/landmark resolves to no target; the shape is
        // treated as not-inside so exits still fire and notes release.
        let (inside, metrics) = match target {
            Some(Target::At(p)) => {
                let inside = geom::contains_point(shape, p, HIT_TOLERANCE);
                let metrics = inside.then(|| metrics_for(shape, p));
                (inside, metrics)
            }
            Some(Target::Active(active)) => (active, None),
            None => (false, None),
        };

        let just_entered = inside && !rt.inside;
        let just_exited = !inside && rt.inside;
        rt.inside = inside;
        if let Some(m) = metrics {
            rt.last_metrics = Some(m);
        }

        for event in &interaction.events {
            let es = rt.events.entry(event.id.clone()).or_default();
            match &event.kind {
                EventKind::None => {}
                EventKind::MidiNote { trigger, channel, note, value_mode, value_constant } => {
                    let velocity = resolve_value(*value_mode, *value_constant, metrics);
                    let fire_on = |es: &mut EventState, sink: &mut dyn MidiSink| {
                        // Re-firing while engaged would abandon the previous
                        // note-on; close it first.
                        release(es, sink);
                        sink.send(
                            note_on_status(*channel),
                            data7(*note),
                            velocity,
                            &interaction.midi_port,
                        );
                        es.engaged = true;
                        es.last_sent = Some(SentNote {
                            port: interaction.midi_port.clone(),
                            channel: *channel,
                            note: *note,
                        });
                        es.last_trigger_at = Some(now_ms);
                    };
                    match trigger {
                        Trigger::Enter => {
                            if just_entered {
                                fire_on(es, sink);
                            }
                        }
                        Trigger::Exit => {
                            if just_exited {
                                if es.engaged {
                                    release(es, sink);
                                } else {
                                    sink.send(
                                        note_off_status(*channel),
                                        data7(*note),
                                        0,
                                        &interaction.midi_port,
                                    );
                                }
                                es.last_trigger_at = Some(now_ms);
                            }
                        }
                        Trigger::EnterExit => {
                            if just_entered {
                                fire_on(es, sink);
                            }
                            if just_exited {
                                release(es, sink);
                                es.last_trigger_at = Some(now_ms);
                            }
                        }
                        Trigger::Inside => {
                            if inside && retrigger_due(es.last_continuous_at, now_ms) {
                                fire_on(es, sink);
                                es.last_continuous_at = Some(now_ms);
                            }
                            if just_exited {
                                release(es, sink);
                                es.last_continuous_at = None;
                            }
                        }
                    }
                }
                EventKind::MidiCc { trigger, channel, cc, value_mode, value_constant } => {
                    let value = resolve_value(*value_mode, *value_constant, metrics);
                    let send_cc = |es: &mut EventState, sink: &mut dyn MidiSink, v: u8| {
                        sink.send(cc_status(*channel), data7(*cc), v, &interaction.midi_port);
                        es.last_trigger_at = Some(now_ms);
                    };
                    match trigger {
                        Trigger::Enter => {
                            if just_entered {
                                send_cc(es, sink, value);
                            }
                        }
                        Trigger::Exit => {
                            if just_exited {
                                send_cc(es, sink, 0);
                            }
                        }
                        Trigger::EnterExit => {
                            if just_entered {
                                send_cc(es, sink, value);
                            }
                            if just_exited {
                                send_cc(es, sink, 0);
                            }
                        }
                        Trigger::Inside => {
                            if inside && retrigger_due(es.last_continuous_at, now_ms) {
                                send_cc(es, sink, value);
                                es.last_continuous_at = Some(now_ms);
                            }
                            if just_exited {
                                es.last_continuous_at = None;
                            }
                        }
                    }
                }
            }
        }

        rt.active = rt.inside || rt.events.values().any(|e| e.engaged);
    }
}

/// Whether enough time has passed for another `inside` firing. Timers are
/// independent per event; there is no global phase alignment.
fn retrigger_due(last: Option<f64>, now_ms: f64) -> bool {
    last.is_none_or(|t| now_ms - t >= INSIDE_RETRIGGER_MS)
}

/// Send the matching note-off for an engaged event, if any, and disengage.
fn release(es: &mut EventState, sink: &mut dyn MidiSink) {
    if !es.engaged {
        return;
    }
    if let Some(sent) = es.last_sent.take() {
        sink.send(note_off_status(sent.channel), data7(sent.note), 0, &sent.port);
    }
    es.engaged = false;
}

/// Position metrics for a target point inside a shape's bounding box.
fn metrics_for(shape: &Shape, p: Point) -> Metrics {
    let bounds = geom::bounds_of(shape);
    let width = bounds.width().max(f64::EPSILON);
    let height = bounds.height().max(f64::EPSILON);
    let center = bounds.center();
    let half_extent = (width.max(height) / 2.0).max(f64::EPSILON);
    Metrics {
        norm_x: ((p.x - bounds.min_x) / width).clamp(0.0, 1.0),
        norm_y: ((p.y - bounds.min_y) / height).clamp(0.0, 1.0),
        distance: (p.dist_sq(center).sqrt() / half_extent).clamp(0.0, 1.0),
    }
}

/// Resolve an event's 7-bit value. Continuous modes fall back to the
/// configured constant when no spatial metrics exist this tick (keyboard
/// sources, or exit edges after the target left).
fn resolve_value(mode: ValueMode, constant: u8, metrics: Option<Metrics>) -> u8 {
    match (mode, metrics) {
        (ValueMode::Constant, _) | (_, None) => data7(constant),
        (ValueMode::NormX, Some(m)) => value7(m.norm_x),
        (ValueMode::NormY, Some(m)) => value7(m.norm_y),
        (ValueMode::Distance, Some(m)) => value7(m.distance),
    }
}
