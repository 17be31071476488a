//! MIDI sink abstraction and status-byte helpers.
//!
//! The core never talks to devices; it emits raw three-byte messages through
//! the [`MidiSink`] trait and the surrounding shell routes them to real
//! outputs (Web MIDI, midir, an OSC relay). [`NullSink`] is the
//! no-registered-outputs behavior — a logged no-op — and [`RecordingSink`]
//! captures messages for assertions.

#[cfg(test)]
#[path = "midi_test.rs"]
mod midi_test;

use crate::event::PortSelector;

/// Note-on status byte for a 1-based channel.
#[must_use]
pub fn note_on_status(channel: u8) -> u8 {
    0x90 | channel_nibble(channel)
}

/// Note-off status byte for a 1-based channel.
#[must_use]
pub fn note_off_status(channel: u8) -> u8 {
    0x80 | channel_nibble(channel)
}

/// Control-change status byte for a 1-based channel.
#[must_use]
pub fn cc_status(channel: u8) -> u8 {
    0xB0 | channel_nibble(channel)
}

/// Low status nibble for a 1-based channel (1–16 → 0–15; out-of-range
/// channels clamp rather than corrupt the high nibble).
#[must_use]
pub fn channel_nibble(channel: u8) -> u8 {
    channel.clamp(1, 16) - 1
}

/// Clamp a data byte to 7 bits.
#[must_use]
pub fn data7(value: u8) -> u8 {
    value & 0x7F
}

/// Map a `0..=1` metric into the 7-bit MIDI range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn value7(normalized: f64) -> u8 {
    (normalized.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// Abstract MIDI output the runtime emits into.
///
/// `port` selects a named output or [`PortSelector::Broadcast`] for all
/// known outputs; routing is the implementor's concern.
pub trait MidiSink {
    /// Emit one three-byte MIDI message to the selected port.
    fn send(&mut self, status: u8, data1: u8, data2: u8, port: &PortSelector);
}

/// Silent sink used when no output port is registered. Sends are dropped
/// (logged at debug) rather than blocking or erroring.
#[derive(Debug, Default)]
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, status: u8, data1: u8, data2: u8, _port: &PortSelector) {
        tracing::debug!(status, data1, data2, "midi send with no outputs, dropped");
    }
}

/// A captured MIDI message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
    pub port: PortSelector,
}

/// Sink that records every message, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Messages in send order.
    pub messages: Vec<SentMessage>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of recorded note-on messages with nonzero velocity.
    #[must_use]
    pub fn note_ons(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.status & 0xF0 == 0x90 && m.data2 > 0)
            .count()
    }

    /// Count of recorded note-off messages (including zero-velocity note-on).
    #[must_use]
    pub fn note_offs(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.status & 0xF0 == 0x80 || (m.status & 0xF0 == 0x90 && m.data2 == 0))
            .count()
    }
}

impl MidiSink for RecordingSink {
    fn send(&mut self, status: u8, data1: u8, data2: u8, port: &PortSelector) {
        self.messages.push(SentMessage { status, data1, data2, port: port.clone() });
    }
}
