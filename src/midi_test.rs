#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

// =============================================================
// Status bytes
// =============================================================

#[test]
fn status_bytes_for_channel_one() {
    assert_eq!(note_on_status(1), 0x90);
    assert_eq!(note_off_status(1), 0x80);
    assert_eq!(cc_status(1), 0xB0);
}

#[test]
fn status_bytes_for_channel_sixteen() {
    assert_eq!(note_on_status(16), 0x9F);
    assert_eq!(note_off_status(16), 0x8F);
    assert_eq!(cc_status(16), 0xBF);
}

#[test]
fn out_of_range_channels_clamp() {
    assert_eq!(channel_nibble(0), 0);
    assert_eq!(channel_nibble(1), 0);
    assert_eq!(channel_nibble(16), 15);
    assert_eq!(channel_nibble(200), 15);
    // The high nibble is never corrupted.
    assert_eq!(note_on_status(200), 0x9F);
}

// =============================================================
// Data bytes
// =============================================================

#[test]
fn data7_masks_high_bit() {
    assert_eq!(data7(0), 0);
    assert_eq!(data7(127), 127);
    assert_eq!(data7(128), 0);
    assert_eq!(data7(255), 127);
}

#[test]
fn value7_maps_unit_range() {
    assert_eq!(value7(0.0), 0);
    assert_eq!(value7(1.0), 127);
    assert_eq!(value7(0.5), 64);
    assert_eq!(value7(-0.3), 0);
    assert_eq!(value7(2.0), 127);
}

// =============================================================
// Sinks
// =============================================================

#[test]
fn recording_sink_captures_in_order() {
    let mut sink = RecordingSink::new();
    sink.send(0x90, 60, 100, &PortSelector::Broadcast);
    sink.send(0x80, 60, 0, &PortSelector::Named("synth".to_string()));
    assert_eq!(sink.messages.len(), 2);
    assert_eq!(sink.messages[0].status, 0x90);
    assert_eq!(sink.messages[1].port, PortSelector::Named("synth".to_string()));
}

#[test]
fn note_counters_classify_messages() {
    let mut sink = RecordingSink::new();
    sink.send(0x90, 60, 100, &PortSelector::Broadcast);
    sink.send(0x80, 60, 0, &PortSelector::Broadcast);
    // Zero-velocity note-on counts as an off.
    sink.send(0x90, 62, 0, &PortSelector::Broadcast);
    sink.send(0xB0, 7, 64, &PortSelector::Broadcast);
    assert_eq!(sink.note_ons(), 1);
    assert_eq!(sink.note_offs(), 2);
}

#[test]
fn null_sink_swallows_sends() {
    let mut sink = NullSink;
    sink.send(0x90, 60, 100, &PortSelector::Broadcast);
}
