// Placement of a composition's notes on an eighth-note timeline.
//
// Shared by the LilyPond, toy-piano and MIDI renderers so that all three
// agree on onsets, durations and octaves. The rules:
// - Without harmony, melody notes are quarter notes an octave up (treble).
// - With harmony, melody notes are half notes in the lower octave (bass)
//   and each melody beat carries `f` harmony notes of `half / f` each.
// - Each part ends with a closing note on the melody's first degree: the
//   melody repeats it with its usual duration, the harmony plays it an
//   octave up as a half note.
//
// Octave and degree combine into a diatonic step above the bass-clef C:
// step 7 is the treble-clef C, step 14 the C above it.

use crate::codec::NoteNumber;
use crate::error::RenderError;

/// Eighth notes in a half note (one melody beat with harmony on).
pub const EIGHTHS_PER_HALF: u32 = 4;

/// Eighth notes in a quarter note.
pub const EIGHTHS_PER_QUARTER: u32 = 2;

/// Scale steps in one diatonic octave.
pub const STEPS_PER_OCTAVE: u32 = 7;

/// A note placed on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedNote {
    pub degree: NoteNumber,
    /// Octaves above the bass-clef register.
    pub octave: u8,
    /// Onset in eighth notes from the start of the piece.
    pub start: u32,
    /// Length in eighth notes.
    pub duration: u32,
}

impl PlacedNote {
    /// Diatonic steps above the bass-clef C.
    pub fn step(&self) -> u32 {
        u32::from(self.octave) * STEPS_PER_OCTAVE + u32::from(self.degree.value())
    }

    pub fn end(&self) -> u32 {
        self.start + self.duration
    }
}

/// Both parts of a composition, closing notes included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Harmony notes per melody note (0 without harmony).
    pub harmony_factor: usize,
    pub melody: Vec<PlacedNote>,
    pub harmony: Vec<PlacedNote>,
}

impl Layout {
    /// Lay out the parts. The harmony length must be a whole multiple of
    /// the melody length, with 0, 1, 2 or 4 notes per melody note.
    pub fn new(melody: &[NoteNumber], harmony: &[NoteNumber]) -> Result<Self, RenderError> {
        let first = *melody.first().ok_or(RenderError::EmptyMelody)?;
        if harmony.len() % melody.len() != 0 {
            return Err(RenderError::UnevenHarmony {
                melody: melody.len(),
                harmony: harmony.len(),
            });
        }
        let harmony_factor = harmony.len() / melody.len();
        let harmony_duration = match harmony_factor {
            0 => 0,
            1 | 2 | 4 => EIGHTHS_PER_HALF / harmony_factor as u32,
            factor => return Err(RenderError::UnsupportedDensity { factor }),
        };
        let harmony_enabled = harmony_factor > 0;

        let (melody_octave, melody_duration) = if harmony_enabled {
            (0, EIGHTHS_PER_HALF)
        } else {
            (1, EIGHTHS_PER_QUARTER)
        };
        let melody = place(melody, first, melody_octave, melody_duration, melody_duration);

        let harmony = if harmony_enabled {
            place(harmony, first, 1, harmony_duration, EIGHTHS_PER_HALF)
        } else {
            Vec::new()
        };

        Ok(Layout {
            harmony_factor,
            melody,
            harmony,
        })
    }

    pub fn harmony_enabled(&self) -> bool {
        self.harmony_factor > 0
    }

    /// Eighth notes from the first onset to the last release.
    pub fn total_eighths(&self) -> u32 {
        self.melody
            .iter()
            .chain(&self.harmony)
            .map(PlacedNote::end)
            .max()
            .unwrap_or(0)
    }
}

/// Place `notes` back to back, then append the closing note.
fn place(
    notes: &[NoteNumber],
    closing: NoteNumber,
    octave: u8,
    duration: u32,
    closing_duration: u32,
) -> Vec<PlacedNote> {
    let mut placed: Vec<PlacedNote> = notes
        .iter()
        .zip(0u32..)
        .map(|(&degree, idx)| PlacedNote {
            degree,
            octave,
            start: idx * duration,
            duration,
        })
        .collect();
    let closing_start = placed.last().map_or(0, PlacedNote::end);
    placed.push(PlacedNote {
        degree: closing,
        octave,
        start: closing_start,
        duration: closing_duration,
    });
    placed
}
