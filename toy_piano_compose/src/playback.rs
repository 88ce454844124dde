// Toy piano playback events.
//
// The web toy piano plays a flat list of `{num, time}` events: `num` is a
// key on its diatonic keyboard and `time` an onset in milliseconds. Events
// from both parts are merged and stable-sorted by onset, so at equal times
// melody events stay ahead of harmony events.

use serde::{Deserialize, Serialize};

use crate::codec::NoteNumber;
use crate::error::RenderError;
use crate::layout::{EIGHTHS_PER_QUARTER, Layout, PlacedNote};

/// Milliseconds per quarter note.
pub const QUARTER_NOTE_MS: u32 = 150;

/// Keyboard key of the bass-clef C (diatonic step 0).
pub const TOY_PIANO_PITCH_OFFSET: u32 = 8;

/// One key press on the toy piano.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// Diatonic keyboard key.
    pub num: u32,
    /// Onset in milliseconds.
    pub time: u32,
}

impl PlaybackEvent {
    fn from_placed(note: &PlacedNote) -> Self {
        PlaybackEvent {
            num: note.step() + TOY_PIANO_PITCH_OFFSET,
            time: note.start * QUARTER_NOTE_MS / EIGHTHS_PER_QUARTER,
        }
    }
}

/// Playback events for a laid-out composition, sorted by onset.
pub fn layout_to_playback(layout: &Layout) -> Vec<PlaybackEvent> {
    let mut events: Vec<PlaybackEvent> = layout
        .melody
        .iter()
        .chain(&layout.harmony)
        .map(PlaybackEvent::from_placed)
        .collect();
    events.sort_by_key(|event| event.time);
    events
}

/// Playback events for melody and harmony note numbers.
pub fn render_playback(
    melody: &[NoteNumber],
    harmony: &[NoteNumber],
) -> Result<Vec<PlaybackEvent>, RenderError> {
    Ok(layout_to_playback(&Layout::new(melody, harmony)?))
}
