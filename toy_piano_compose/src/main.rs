// Quantum Toy Piano composer: CLI entry point.
//
// Composes one piece offline and writes it out. The pipeline mirrors the
// service endpoint: manifest -> oracle -> supply -> walk -> renderers.
//
// Usage:
//   cargo run -p toy_piano_compose -- [--pitch-index N] [--species 1|2|3]
//     [--melodic-degrees a,b,c,d,e,f] [--harmonic-degrees a,b,c,d,e,f]
//     [--use-simulator] [--seed N | --replay recording.json]
//     [--ly out.ly] [--midi out.mid] [--record recording.json]

use anyhow::{Context, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use toy_piano_compose::codec::PitchState;
use toy_piano_compose::layout::Layout;
use toy_piano_compose::lilypond::layout_to_lilypond;
use toy_piano_compose::manifest::{CircuitManifest, RotationDegrees};
use toy_piano_compose::midi::write_midi;
use toy_piano_compose::oracle::{Oracle, ReplayOracle, SeededOracle, draw_supply};
use toy_piano_compose::walker::{DEGREES_OF_FREEDOM, Species, WalkParams, compose};

#[derive(Parser)]
#[command(name = "compose", version)]
#[command(about = "Compose a toy piano counterpoint piece from oracle samples")]
struct Cli {
    /// Seed pitch index (wrapped into 0-7)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pitch_index: i64,

    /// Counterpoint species (harmony density)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    species: u8,

    /// Six melody rotation angles in degrees
    #[arg(long, value_delimiter = ',', default_value = "0,0,0,0,0,0")]
    melodic_degrees: Vec<f64>,

    /// Six harmony rotation angles in degrees; enables harmony
    #[arg(long, value_delimiter = ',')]
    harmonic_degrees: Option<Vec<f64>>,

    /// Size the manifest for a simulator backend
    #[arg(long)]
    use_simulator: bool,

    /// Seed for the seeded oracle (OS entropy when absent)
    #[arg(long, conflicts_with = "replay")]
    seed: Option<u64>,

    /// Replay a recorded supply instead of sampling
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write LilyPond notation here
    #[arg(long)]
    ly: Option<PathBuf>,

    /// Write a MIDI file here
    #[arg(long)]
    midi: Option<PathBuf>,

    /// Save the drawn supply here, for later --replay
    #[arg(long)]
    record: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "TOY_PIANO_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let melodic_degrees = six_degrees("--melodic-degrees", &cli.melodic_degrees)?;
    let harmonic_degrees = cli
        .harmonic_degrees
        .as_deref()
        .map(|degrees| six_degrees("--harmonic-degrees", degrees))
        .transpose()?;

    let mut oracle: Box<dyn Oracle> = match (&cli.replay, cli.seed) {
        (Some(path), _) => Box::new(
            ReplayOracle::load(path)
                .with_context(|| format!("loading recording {}", path.display()))?,
        ),
        (None, Some(seed)) => Box::new(SeededOracle::new(seed)),
        (None, None) => Box::new(SeededOracle::from_entropy()),
    };

    let manifest = CircuitManifest::build(melodic_degrees, harmonic_degrees, cli.use_simulator);
    println!("[1/3] Executing {} circuits on {}...", manifest.len(), oracle.name());
    let mut supply = draw_supply(oracle.as_mut(), &manifest)?;

    if let Some(path) = &cli.record {
        let json = serde_json::to_string_pretty(&supply)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("  Recorded supply to {}", path.display());
    }

    println!("[2/3] Walking...");
    let species = Species::from_number(cli.species).context("species out of range")?;
    let params = WalkParams {
        seed: PitchState::wrapping(cli.pitch_index),
        species,
        harmony: manifest.harmony_enabled(),
    };
    let composition = compose(&mut supply, &params);
    println!("  Melody:  {}", join(&composition.melody));
    if !composition.harmony.is_empty() {
        println!("  Harmony: {}", join(&composition.harmony));
    }
    if !composition.fallback_draws.is_empty() {
        println!("  {} draws fell back to the upper C.", composition.fallback_draws.len());
    }

    println!("[3/3] Rendering...");
    let layout = Layout::new(&composition.melody, &composition.harmony)?;
    let ly = layout_to_lilypond(&layout, oracle.name())?;
    match &cli.ly {
        Some(path) => {
            std::fs::write(path, ly).with_context(|| format!("writing {}", path.display()))?;
            println!("  Wrote {}", path.display());
        }
        None => println!("{ly}"),
    }
    if let Some(path) = &cli.midi {
        write_midi(&layout, path).with_context(|| format!("writing {}", path.display()))?;
        println!("  Wrote {}", path.display());
    }

    Ok(())
}

fn six_degrees(flag: &str, values: &[f64]) -> anyhow::Result<RotationDegrees> {
    match <RotationDegrees>::try_from(values) {
        Ok(degrees) => Ok(degrees),
        Err(_) => bail!(
            "{flag} needs {DEGREES_OF_FREEDOM} comma-separated angles, got {}",
            values.len()
        ),
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}
