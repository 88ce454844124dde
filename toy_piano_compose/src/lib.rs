// Quantum Toy Piano composition engine.
//
// Turns a batch of three-bit measurement samples from an external quantum
// circuit oracle into a short counterpoint piece: a seven-note melody and,
// optionally, a harmony line whose density follows the counterpoint species
// (1, 2 or 4 harmony notes per melody note).
//
// Architecture:
// - codec.rs: Three-bit pitch states and their scale-degree packing
// - supply.rs: Per-(state, role) FIFO queues of oracle outcomes
// - walker.rs: The bit-register state walk that consumes the supply
// - manifest.rs: The list of single-shot circuits a composition needs
// - oracle.rs: Oracle trait, supply population, seeded and replay backends
// - layout.rs: Eighth-note placement shared by every renderer
// - lilypond.rs: LilyPond notation markup
// - playback.rs: Toy piano {num, time} event list
// - midi.rs: Standard MIDI file export
//
// Everything here is request-scoped: a supply is built, walked once and
// discarded. Given the same supply the walk is fully deterministic.

pub mod codec;
pub mod error;
pub mod layout;
pub mod lilypond;
pub mod manifest;
pub mod midi;
pub mod oracle;
pub mod playback;
pub mod supply;
pub mod walker;
