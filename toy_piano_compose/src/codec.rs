// Three-bit note codec.
//
// Every value that flows through the composition walk is a three-bit group:
// the seed pitch, each oracle outcome, and each derived note. This module
// owns the two views of such a group:
// - `PitchState`: the bit-level view, used as a supply lookup key and
//   written into the composition register. Bits are most significant first,
//   matching the order of the oracle's input-state strings ("011" = 3).
// - `NoteNumber`: the integer scale degree (0-7) decoded from a triplet.
//
// `encode` and `decode` are pure and total; `PitchState` parsing is the only
// fallible operation (rejecting strings that are not three '0'/'1' chars).

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseSampleError;

/// Number of bits (circuit wires) in one pitch state.
pub const NUM_CIRCUIT_WIRES: usize = 3;

/// Number of distinct pitch states (2^3).
pub const DIATONIC_SCALE_OCTAVE_PITCHES: u8 = 8;

/// A group of three bits in register order (most significant first).
pub type Triplet = [bool; NUM_CIRCUIT_WIRES];

/// Pack a triplet into a scale degree: `bit0*4 + bit1*2 + bit2*1`.
pub fn encode(bits: Triplet) -> NoteNumber {
    let value = bits
        .iter()
        .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit));
    NoteNumber(value)
}

/// Expand `index mod 8` into three bits, most significant first.
pub fn decode(index: u8) -> Triplet {
    let index = index % DIATONIC_SCALE_OCTAVE_PITCHES;
    [index & 0b100 != 0, index & 0b010 != 0, index & 0b001 != 0]
}

/// A diatonic scale degree in [0, 7], decoded from a register triplet.
/// Degree 7 is the octave above degree 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteNumber(u8);

impl NoteNumber {
    /// Build a note number, wrapping into range.
    pub fn new(value: u8) -> Self {
        NoteNumber(value % DIATONIC_SCALE_OCTAVE_PITCHES)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Serialize for NoteNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl fmt::Display for NoteNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A three-bit pitch state: the current scale-degree context fed into the
/// next oracle lookup, and also the shape of every oracle outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitchState(Triplet);

impl PitchState {
    /// All eight states in ascending order (`000` first).
    pub fn all() -> impl Iterator<Item = PitchState> {
        (0..DIATONIC_SCALE_OCTAVE_PITCHES).map(PitchState::from_index)
    }

    /// State for a pitch index, taken modulo 8.
    pub fn from_index(index: u8) -> Self {
        PitchState(decode(index))
    }

    /// Wrap an arbitrary (possibly negative) request value into [0, 8).
    pub fn wrapping(index: i64) -> Self {
        let wrapped = index.rem_euclid(i64::from(DIATONIC_SCALE_OCTAVE_PITCHES));
        // rem_euclid keeps the value in [0, 8), so the cast is lossless.
        PitchState::from_index(wrapped as u8)
    }

    pub const fn from_bits(bits: Triplet) -> Self {
        PitchState(bits)
    }

    pub fn bits(self) -> Triplet {
        self.0
    }

    pub fn index(self) -> u8 {
        encode(self.0).value()
    }

    pub fn note(self) -> NoteNumber {
        encode(self.0)
    }
}

impl fmt::Display for PitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for PitchState {
    type Err = ParseSampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != NUM_CIRCUIT_WIRES {
            return Err(ParseSampleError::BitString(s.to_string()));
        }
        let mut bits = [false; NUM_CIRCUIT_WIRES];
        for (bit, &byte) in bits.iter_mut().zip(bytes) {
            *bit = match byte {
                b'0' => false,
                b'1' => true,
                _ => return Err(ParseSampleError::BitString(s.to_string())),
            };
        }
        Ok(PitchState(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_then_encode_round_trips() {
        for p in 0u8..16 {
            assert_eq!(encode(decode(p)).value(), p % 8, "pitch index {p}");
        }
    }

    #[test]
    fn test_encode_weights() {
        assert_eq!(encode([false, false, false]).value(), 0);
        assert_eq!(encode([true, false, false]).value(), 4);
        assert_eq!(encode([false, true, true]).value(), 3);
        assert_eq!(encode([true, true, true]).value(), 7);
    }

    #[test]
    fn test_decode_msb_first() {
        assert_eq!(decode(2), [false, true, false]);
        assert_eq!(decode(6), [true, true, false]);
    }

    #[test]
    fn test_pitch_state_string_forms() {
        let state: PitchState = "011".parse().unwrap();
        assert_eq!(state.index(), 3);
        assert_eq!(state.to_string(), "011");
        assert_eq!(PitchState::from_index(5).to_string(), "101");
    }

    #[test]
    fn test_pitch_state_rejects_malformed() {
        assert!("01".parse::<PitchState>().is_err());
        assert!("0110".parse::<PitchState>().is_err());
        assert!("0a1".parse::<PitchState>().is_err());
        assert!("".parse::<PitchState>().is_err());
    }

    #[test]
    fn test_wrapping_seed() {
        assert_eq!(PitchState::wrapping(3).index(), 3);
        assert_eq!(PitchState::wrapping(7).index(), 7);
        assert_eq!(PitchState::wrapping(8).index(), 0);
        assert_eq!(PitchState::wrapping(15).index(), 7);
        assert_eq!(PitchState::wrapping(-1).index(), 7);
    }

    #[test]
    fn test_all_states_ascending() {
        let names: Vec<String> = PitchState::all().map(|s| s.to_string()).collect();
        assert_eq!(names, ["000", "001", "010", "011", "100", "101", "110", "111"]);
    }
}
