//! MIDI wire encoding for hardware sync telegrams.
//!
//! The sync box listens on one fixed MIDI channel for the two values
//! the engine debounces: tempo and beats per bar. [`encode`] turns a
//! [`TelegramEvent`] into the exact message set the device firmware
//! parses. Tempo splits across a CC pair, beats per bar rides a single
//! CC, and both also carry the full value on the pitch wheel for hosts
//! that transmit it.
//!
//! Encoding never fails: out-of-range values clamp to the 7-bit data
//! bytes, and a value the 14-bit wheel cannot hold drops the wheel
//! message while the CCs still go out.
//!
//! # Example
//!
//! ```rust
//! use pulso_core::{TelegramEvent, TelegramKind};
//! use pulso_wire::encode;
//!
//! let event = TelegramEvent {
//!     kind: TelegramKind::Tempo,
//!     value: 135,
//!     offset: 96,
//! };
//! let packet = encode(&event);
//! assert_eq!(packet.offset(), 96);
//! assert_eq!(packet.messages().len(), 3, "CC pair plus pitch wheel");
//! assert_eq!(packet.messages()[0].bytes(), [0xBB, 85, 1]);
//! assert_eq!(packet.messages()[1].bytes(), [0xBB, 86, 7]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

use pulso_core::{TelegramEvent, TelegramKind};

/// MIDI channel the sync device listens on, 0-based (channel 12 on the
/// wire).
pub const SYNC_CHANNEL: u8 = 11;

/// CC carrying the tempo's coarse part (value / 128).
pub const CC_TEMPO_COARSE: u8 = 85;

/// CC carrying the tempo's fine part (value % 128).
pub const CC_TEMPO_FINE: u8 = 86;

/// CC carrying the beats-per-bar count.
pub const CC_BEATS_PER_BAR: u8 = 90;

/// Pitch-wheel bias marking a beats-per-bar value: the coarse seven
/// bits are pinned to 0x7F so the firmware can tell the two value
/// kinds apart.
pub const BEATS_PER_BAR_BIAS: u32 = 0x7F << 7;

/// Largest value the 14-bit pitch wheel can carry.
const WHEEL_MAX: u32 = 0x3FFF;

/// One 3-byte MIDI message addressed to the sync device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiMessage {
    /// Status byte: message type in the high nibble, channel in the
    /// low.
    pub status: u8,
    /// First data byte.
    pub data1: u8,
    /// Second data byte.
    pub data2: u8,
}

impl MidiMessage {
    /// Control change on the sync channel.
    pub const fn control_change(controller: u8, value: u8) -> Self {
        Self {
            status: 0xB0 | SYNC_CHANNEL,
            data1: controller & 0x7F,
            data2: value & 0x7F,
        }
    }

    /// Pitch wheel on the sync channel carrying a 14-bit position,
    /// least significant seven bits first.
    pub const fn pitch_wheel(position: u16) -> Self {
        Self {
            status: 0xE0 | SYNC_CHANNEL,
            data1: (position & 0x7F) as u8,
            data2: ((position >> 7) & 0x7F) as u8,
        }
    }

    /// The raw bytes in wire order.
    #[inline]
    pub const fn bytes(&self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }
}

/// The message set one telegram encodes to, tagged with the telegram's
/// sample offset inside its block.
#[derive(Clone, Copy, Debug)]
pub struct TelegramPacket {
    offset: u32,
    messages: [MidiMessage; 3],
    len: usize,
}

impl TelegramPacket {
    const fn new(offset: u32) -> Self {
        Self {
            offset,
            messages: [MidiMessage::control_change(0, 0); 3],
            len: 0,
        }
    }

    fn push(&mut self, message: MidiMessage) {
        self.messages[self.len] = message;
        self.len += 1;
    }

    /// Sample offset the telegram fired at, carried over unchanged.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The encoded messages, in the order the device expects them.
    #[inline]
    pub fn messages(&self) -> &[MidiMessage] {
        &self.messages[..self.len]
    }
}

/// Encode one telegram as the message set the sync device expects.
///
/// Tempo values split across [`CC_TEMPO_COARSE`] and [`CC_TEMPO_FINE`];
/// beats per bar rides [`CC_BEATS_PER_BAR`]. Both kinds append a pitch
/// wheel carrying the full value, with beats per bar biased by
/// [`BEATS_PER_BAR_BIAS`]. A value the wheel cannot hold drops the
/// wheel message only.
pub fn encode(event: &TelegramEvent) -> TelegramPacket {
    let mut packet = TelegramPacket::new(event.offset);
    let wheel = match event.kind {
        TelegramKind::Tempo => {
            packet.push(MidiMessage::control_change(
                CC_TEMPO_COARSE,
                ((event.value / 128) & 0x7F) as u8,
            ));
            packet.push(MidiMessage::control_change(
                CC_TEMPO_FINE,
                (event.value % 128) as u8,
            ));
            event.value
        }
        TelegramKind::BeatsPerBar => {
            packet.push(MidiMessage::control_change(
                CC_BEATS_PER_BAR,
                (event.value % 128) as u8,
            ));
            // Saturation keeps the sum past the wheel ceiling, so the
            // wheel is dropped rather than wrapped.
            event.value.saturating_add(BEATS_PER_BAR_BIAS)
        }
    };
    if wheel <= WHEEL_MAX {
        packet.push(MidiMessage::pitch_wheel(wheel as u16));
    }
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TelegramKind, value: u32) -> TelegramEvent {
        TelegramEvent {
            kind,
            value,
            offset: 250,
        }
    }

    #[test]
    fn tempo_splits_across_the_cc_pair() {
        let packet = encode(&event(TelegramKind::Tempo, 523));
        let messages = packet.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].bytes(), [0xBB, 85, 4], "coarse: 523 / 128");
        assert_eq!(messages[1].bytes(), [0xBB, 86, 11], "fine: 523 % 128");
        assert_eq!(messages[2].bytes(), [0xEB, 11, 4], "wheel: LSB first");
    }

    #[test]
    fn beats_per_bar_rides_cc_90_with_a_biased_wheel() {
        let packet = encode(&event(TelegramKind::BeatsPerBar, 4));
        let messages = packet.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].bytes(), [0xBB, 90, 4]);
        assert_eq!(
            messages[1].bytes(),
            [0xEB, 4, 0x7F],
            "coarse seven bits pinned to 0x7F"
        );
    }

    #[test]
    fn oversized_tempo_drops_the_wheel_only() {
        let packet = encode(&event(TelegramKind::Tempo, 20_000));
        let messages = packet.messages();
        assert_eq!(messages.len(), 2, "CCs survive, wheel does not");
        assert!(messages.iter().all(|m| m.status == 0xBB));
        assert_eq!(messages[0].data2, (20_000 / 128) as u8 & 0x7F);
        assert_eq!(messages[1].data2, (20_000 % 128) as u8);
    }

    #[test]
    fn oversized_beats_per_bar_drops_the_wheel_only() {
        // 128 + the bias lands one past the 14-bit ceiling.
        let packet = encode(&event(TelegramKind::BeatsPerBar, 128));
        let messages = packet.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].status, 0xBB);
    }

    #[test]
    fn extreme_values_never_panic() {
        for kind in [TelegramKind::Tempo, TelegramKind::BeatsPerBar] {
            let packet = encode(&event(kind, u32::MAX));
            assert!(
                packet.messages().iter().all(|m| m.status == 0xBB),
                "the wheel is dropped for values it cannot hold"
            );
        }
    }

    #[test]
    fn every_message_addresses_the_sync_channel() {
        for ev in [
            event(TelegramKind::Tempo, 120),
            event(TelegramKind::BeatsPerBar, 7),
        ] {
            for message in encode(&ev).messages() {
                assert_eq!(message.status & 0x0F, SYNC_CHANNEL);
            }
        }
    }

    #[test]
    fn offset_carries_through() {
        let packet = encode(&event(TelegramKind::Tempo, 120));
        assert_eq!(packet.offset(), 250);
    }

    #[test]
    fn data_bytes_stay_seven_bit() {
        for value in [0u32, 1, 127, 128, 129, 16_383, 16_384, 1_000_000] {
            for kind in [TelegramKind::Tempo, TelegramKind::BeatsPerBar] {
                for message in encode(&event(kind, value)).messages() {
                    assert!(message.data1 < 0x80, "data1 out of range for {value}");
                    assert!(message.data2 < 0x80, "data2 out of range for {value}");
                }
            }
        }
    }
}
