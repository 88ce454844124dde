// LilyPond sheet music output for toy piano compositions.
//
// Produces a single-line .ly document in the form the toy piano web client
// embeds and engraves: A5 paper, a fixed title block naming the oracle
// backend as composer, a `melody` variable and (with harmony) a `harmony`
// variable, and a score with one staff per part, harmony on top.
//
// Uses absolute pitches. Scale degrees 0-7 map to c d e f g a b c'; each
// octave of the layout adds one `'` mark.

use std::fmt::Write;
use std::path::Path;

use crate::codec::NoteNumber;
use crate::error::RenderError;
use crate::layout::{EIGHTHS_PER_HALF, EIGHTHS_PER_QUARTER, Layout, PlacedNote, STEPS_PER_OCTAVE};

const TITLE: &str = "Schrodinger's Cat";
const SUBTITLE: &str = "on a Toy Piano";
const TEMPO_BPM: u32 = 100;

/// Note names for the seven diatonic steps, starting at C.
const LY_STEP_NAMES: [&str; 7] = ["c", "d", "e", "f", "g", "a", "b"];

/// Note lengths the layout produces, in eighth notes.
const DURATION_TABLE: [(u32, &str); 3] = [
    (EIGHTHS_PER_HALF, "2"),
    (EIGHTHS_PER_QUARTER, "4"),
    (1, "8"),
];

/// LilyPond duration for a length in eighth notes, if it is a single
/// undotted value.
pub fn ly_duration(eighths: u32) -> Option<&'static str> {
    DURATION_TABLE
        .iter()
        .find(|(value, _)| *value == eighths)
        .map(|(_, name)| *name)
}

/// Absolute LilyPond pitch for a diatonic step above the bass-clef C.
pub fn step_to_ly_pitch(step: u32) -> String {
    let mut pitch = LY_STEP_NAMES[(step % STEPS_PER_OCTAVE) as usize].to_string();
    for _ in 0..step / STEPS_PER_OCTAVE {
        pitch.push('\'');
    }
    pitch
}

fn ly_note(note: &PlacedNote) -> Result<String, RenderError> {
    // Layout durations are always 1, 2 or 4 eighths.
    let duration = ly_duration(note.duration).ok_or(RenderError::UnsupportedDensity {
        factor: (EIGHTHS_PER_HALF / note.duration.max(1)) as usize,
    })?;
    Ok(format!("{}{}", step_to_ly_pitch(note.step()), duration))
}

fn push_notes(ly: &mut String, notes: &[PlacedNote]) -> Result<(), RenderError> {
    for note in notes {
        let _ = write!(ly, " {}", ly_note(note)?);
    }
    Ok(())
}

/// Render a laid-out composition as a LilyPond document.
pub fn layout_to_lilypond(layout: &Layout, composer: &str) -> Result<String, RenderError> {
    let harmony_enabled = layout.harmony_enabled();
    let mut ly = String::new();

    ly.push_str("\\version \"2.18.2\" \\paper {#(set-paper-size \"a5\")} ");
    let _ = write!(
        ly,
        " \\header {{title=\"{}\" subtitle=\"{}\" composer = \"{}\"}} ",
        TITLE,
        SUBTITLE,
        composer.replace('"', "\\\"")
    );

    let clef = if harmony_enabled { "bass" } else { "treble" };
    let _ = write!(
        ly,
        " melody = \\absolute {{ \\clef  \"{}\"  \\numericTimeSignature \\time 4/4 \\tempo 4 = {}",
        clef, TEMPO_BPM
    );
    push_notes(&mut ly, &layout.melody)?;

    if harmony_enabled {
        ly.push_str("} harmony = \\absolute { \\clef \"treble\" \\numericTimeSignature \\time 4/4 ");
        push_notes(&mut ly, &layout.harmony)?;
    }

    ly.push_str("} \\score { << ");
    if harmony_enabled {
        ly.push_str(" \\new Staff \\with {instrumentName = #\"Harmony\"}  { \\harmony } ");
    }
    ly.push_str(" \\new Staff \\with {instrumentName = #\"Melody\"}  { \\melody } >> }");

    Ok(ly)
}

/// Render melody and harmony note numbers as a LilyPond document.
///
/// Fails if the harmony length is not a whole multiple (0, 1, 2 or 4) of the
/// melody length.
pub fn render_lilypond(
    melody: &[NoteNumber],
    harmony: &[NoteNumber],
    composer: &str,
) -> Result<String, RenderError> {
    let layout = Layout::new(melody, harmony)?;
    layout_to_lilypond(&layout, composer)
}

/// Write a LilyPond file for a laid-out composition.
pub fn write_lilypond(
    layout: &Layout,
    composer: &str,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let ly = layout_to_lilypond(layout, composer)?;
    std::fs::write(path, ly)?;
    Ok(())
}
