// Composition walker: the bit-register state walk that turns a Sample Supply
// into melody and harmony note sequences.
//
// The piece lives in a flat register of three-bit slots (`CompositionBits`):
//
//   slot 0 .. 7                 melody notes (slot 0 is the seed)
//   slot 7 + m*f .. 7 + (m+1)*f  harmony-aligned notes for melody beat m
//
// where f is the harmony factor (`2^(species-1)` with harmony on, else 0).
// Each melody beat m reads the melody state in slot m and:
//   a. (all but the last beat) draws a Melody-role sample keyed by that
//      state and writes it into slot m+1;
//   b. (harmony on) draws a Harmony-role sample keyed by the same state and
//      writes it into the first harmony-aligned slot of the beat;
//   c. (f > 1) for each further harmony-aligned slot, draws a Melody-role
//      sample keyed by the previous harmony-aligned slot and writes it
//      forward. These are the melody notes that follow a harmony note.
//
// Every draw consumes exactly one sample. An empty queue yields the fixed
// fallback sample `111` (the upper C) for both roles and is recorded in
// `Composition::fallback_draws`. Slots are write-once.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::{NUM_CIRCUIT_WIRES, NoteNumber, PitchState, encode};
use crate::supply::{Role, SampleKey, SampleSupply};

/// Melody notes in every composition.
pub const TOTAL_MELODY_NOTES: usize = 7;

/// Rotation angles per circuit (consumed by the oracle, not by the walk).
pub const DEGREES_OF_FREEDOM: usize = 6;

/// Substituted when a queue runs dry: a treble-clef C.
pub const FALLBACK_SAMPLE: PitchState = PitchState::from_bits([true, true, true]);

/// Counterpoint species, controlling harmony density.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    First,
    Second,
    Third,
}

impl Species {
    pub fn from_number(number: u8) -> Option<Species> {
        match number {
            1 => Some(Species::First),
            2 => Some(Species::Second),
            3 => Some(Species::Third),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Species::First => 1,
            Species::Second => 2,
            Species::Third => 3,
        }
    }

    /// Harmony notes per melody note: `2^(species-1)`.
    pub fn harmony_factor(self) -> usize {
        1 << (self.number() - 1)
    }
}

/// Inputs to one walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkParams {
    pub seed: PitchState,
    pub species: Species,
    pub harmony: bool,
}

impl WalkParams {
    /// Harmony notes per melody note; zero when harmony is disabled.
    pub fn harmony_factor(&self) -> usize {
        if self.harmony {
            self.species.harmony_factor()
        } else {
            0
        }
    }
}

/// The finished piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub melody: Vec<NoteNumber>,
    /// Empty when harmony is disabled.
    pub harmony: Vec<NoteNumber>,
    /// Keys whose queue was empty when drawn, in draw order.
    #[serde(skip)]
    pub fallback_draws: Vec<SampleKey>,
}

/// Flat register of three-bit slots.
#[derive(Clone, Debug)]
pub struct CompositionBits {
    bits: Vec<bool>,
    written: Vec<bool>,
}

impl CompositionBits {
    pub fn new(num_slots: usize) -> Self {
        CompositionBits {
            bits: vec![false; num_slots * NUM_CIRCUIT_WIRES],
            written: vec![false; num_slots],
        }
    }

    pub fn num_slots(&self) -> usize {
        self.written.len()
    }

    pub fn read(&self, slot: usize) -> PitchState {
        let start = slot * NUM_CIRCUIT_WIRES;
        PitchState::from_bits([self.bits[start], self.bits[start + 1], self.bits[start + 2]])
    }

    /// Write a slot. Each slot is written at most once per walk.
    pub fn write(&mut self, slot: usize, state: PitchState) {
        debug_assert!(!self.written[slot], "slot {slot} written twice");
        self.written[slot] = true;
        let start = slot * NUM_CIRCUIT_WIRES;
        self.bits[start..start + NUM_CIRCUIT_WIRES].copy_from_slice(&state.bits());
    }

    /// Decode every slot, in register order.
    pub fn notes(&self) -> Vec<NoteNumber> {
        self.bits
            .chunks_exact(NUM_CIRCUIT_WIRES)
            .map(|chunk| encode([chunk[0], chunk[1], chunk[2]]))
            .collect()
    }
}

/// Draws from the supply, substituting the fallback on empty queues.
struct Draws<'a> {
    supply: &'a mut SampleSupply,
    fallback_draws: Vec<SampleKey>,
}

impl Draws<'_> {
    fn take(&mut self, key: SampleKey) -> PitchState {
        match self.supply.take(key) {
            Some(sample) => {
                debug!(%key, %sample, "drew sample");
                sample
            }
            None => {
                warn!(%key, fallback = %FALLBACK_SAMPLE, "queue is empty, substituting fallback");
                self.fallback_draws.push(key);
                FALLBACK_SAMPLE
            }
        }
    }
}

/// Walk the register forward from the seed, consuming samples from `supply`.
pub fn compose(supply: &mut SampleSupply, params: &WalkParams) -> Composition {
    let factor = params.harmony_factor();
    let mut bits = CompositionBits::new(TOTAL_MELODY_NOTES * (factor + 1));
    let mut draws = Draws { supply, fallback_draws: Vec::new() };

    bits.write(0, params.seed);

    for melody_idx in 0..TOTAL_MELODY_NOTES {
        let current = bits.read(melody_idx);

        if melody_idx < TOTAL_MELODY_NOTES - 1 {
            let next = draws.take(SampleKey::new(current, Role::Melody));
            bits.write(melody_idx + 1, next);
        }

        if factor > 0 {
            let base = TOTAL_MELODY_NOTES + melody_idx * factor;
            let harmony_note = draws.take(SampleKey::new(current, Role::Harmony));
            bits.write(base, harmony_note);

            for harmony_note_idx in 1..factor {
                let previous = bits.read(base + harmony_note_idx - 1);
                let follower = draws.take(SampleKey::new(previous, Role::Melody));
                bits.write(base + harmony_note_idx, follower);
            }
        }
    }

    let mut melody = bits.notes();
    let harmony = melody.split_off(TOTAL_MELODY_NOTES);
    Composition {
        melody,
        harmony,
        fallback_draws: draws.fallback_draws,
    }
}
