// MIDI output from laid-out compositions.
//
// Converts a Layout into a Standard MIDI File for offline playback. Track 0
// carries the tempo; each part (Melody, then Harmony when present) gets its
// own track and channel. Diatonic steps map onto C major starting at C3.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1 (multi-track).

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

use crate::layout::{Layout, PlacedNote, STEPS_PER_OCTAVE};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per eighth note (the layout's time unit).
const TICKS_PER_EIGHTH: u32 = TICKS_PER_QUARTER as u32 / 2;

/// Quarter notes per minute, matching the notation's tempo mark.
const TEMPO_BPM: u32 = 100;

/// MIDI pitch of diatonic step 0 (C3).
const BASE_PITCH: u8 = 48;

/// Semitones above C for each step of the major scale.
const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// General MIDI program 0 (acoustic grand).
const PIANO_PROGRAM: u8 = 0;

/// MIDI pitch for a placed note.
pub fn midi_pitch(note: &PlacedNote) -> u8 {
    let step = note.step();
    let octave = (step / STEPS_PER_OCTAVE) as u8;
    BASE_PITCH + octave * 12 + MAJOR_SCALE[(step % STEPS_PER_OCTAVE) as usize]
}

/// Convert a Layout to MIDI and write to a file.
pub fn write_midi(layout: &Layout, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, midi_bytes(layout)?)
}

/// Serialize a Layout as a Standard MIDI File.
pub fn midi_bytes(layout: &Layout) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    layout_to_smf(layout).write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a Layout to an in-memory SMF.
fn layout_to_smf(layout: &Layout) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let tempo_microseconds = 60_000_000 / TEMPO_BPM;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    smf.tracks.push(part_track("Melody", u4::new(0), &layout.melody));
    if layout.harmony_enabled() {
        smf.tracks.push(part_track("Harmony", u4::new(1), &layout.harmony));
    }

    smf
}

/// One monophonic part: notes are back to back, so each note-on is followed
/// directly by its note-off.
fn part_track(name: &'static str, channel: u4, notes: &[PlacedNote]) -> Track<'static> {
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PIANO_PROGRAM),
                },
            },
        },
    ];

    let mut last_event_tick: u32 = 0;
    for note in notes {
        let key = u7::new(midi_pitch(note));
        let start_tick = note.start * TICKS_PER_EIGHTH;
        let end_tick = note.end() * TICKS_PER_EIGHTH;

        track.push(TrackEvent {
            delta: u28::new(start_tick - last_event_tick),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel: u7::new(80) },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(end_tick - start_tick),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel: u7::new(0) },
            },
        });
        last_event_tick = end_tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NoteNumber;

    fn notes(values: &[u8]) -> Vec<NoteNumber> {
        values.iter().copied().map(NoteNumber::new).collect()
    }

    #[test]
    fn test_midi_pitch_mapping() {
        let layout = Layout::new(&notes(&[0, 7]), &[]).unwrap();
        // Melody without harmony sits an octave up: middle C, then the C above.
        assert_eq!(midi_pitch(&layout.melody[0]), 60);
        assert_eq!(midi_pitch(&layout.melody[1]), 72);

        let layout = Layout::new(&notes(&[4]), &notes(&[6])).unwrap();
        assert_eq!(midi_pitch(&layout.melody[0]), 55); // G3
        assert_eq!(midi_pitch(&layout.harmony[0]), 71); // B4
    }

    #[test]
    fn test_track_count() {
        let melody_only = Layout::new(&notes(&[0, 1, 2]), &[]).unwrap();
        assert_eq!(layout_to_smf(&melody_only).tracks.len(), 2);

        let with_harmony = Layout::new(&notes(&[0, 1]), &notes(&[2, 3, 4, 5])).unwrap();
        let smf = layout_to_smf(&with_harmony);
        assert_eq!(smf.tracks.len(), 3);
        // name + program + 2 per note (2 notes + closing) + end of track
        assert_eq!(smf.tracks[1].len(), 2 + 2 * 3 + 1);
    }

    #[test]
    fn test_midi_bytes_header() {
        let layout = Layout::new(&notes(&[0, 1, 2]), &[]).unwrap();
        let bytes = midi_bytes(&layout).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}
