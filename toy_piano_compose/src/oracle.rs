// Oracle seam: where circuit outcomes come from.
//
// Circuit construction and execution live behind the `Oracle` trait. An
// oracle receives the whole manifest and must answer positionally: element
// `i` of the returned vector is the single-shot outcome of request `i`.
// `draw_supply` then fills the Sample Supply by walking the manifest in
// order, so FIFO order per key is exactly manifest order. This is the
// contract every backend must honor; nothing depends on how a backend
// batches or schedules execution internally.
//
// Two backends ship with the crate:
// - `SeededOracle`: uniform 3-bit outcomes from a seeded `StdRng`. A
//   development stand-in; it does not model the rotations.
// - `ReplayOracle`: answers from a recorded supply (the `full_res_dict` of
//   an earlier response), reproducing that composition exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::debug;

use crate::codec::{DIATONIC_SCALE_OCTAVE_PITCHES, PitchState};
use crate::error::{OracleError, RecordingError};
use crate::manifest::CircuitManifest;
use crate::supply::SampleSupply;

/// A source of single-shot circuit outcomes.
pub trait Oracle {
    /// Backend label, shown as the composer in the notation header.
    fn name(&self) -> &str;

    /// Run every circuit in `manifest`, one outcome per request, in order.
    fn execute(&mut self, manifest: &CircuitManifest) -> Result<Vec<PitchState>, OracleError>;
}

/// Fill a fresh Sample Supply from positional outcomes.
pub fn populate_supply(
    manifest: &CircuitManifest,
    outcomes: Vec<PitchState>,
) -> Result<SampleSupply, OracleError> {
    if outcomes.len() != manifest.len() {
        return Err(OracleError::ResultCountMismatch {
            expected: manifest.len(),
            actual: outcomes.len(),
        });
    }
    let mut supply = SampleSupply::new();
    for (request, outcome) in manifest.requests.iter().zip(outcomes) {
        supply.put(request.key(), outcome);
    }
    Ok(supply)
}

/// Execute `manifest` on `oracle` and organize the outcomes into a supply.
pub fn draw_supply(
    oracle: &mut dyn Oracle,
    manifest: &CircuitManifest,
) -> Result<SampleSupply, OracleError> {
    debug!(backend = oracle.name(), circuits = manifest.len(), "executing manifest");
    let outcomes = oracle.execute(manifest)?;
    populate_supply(manifest, outcomes)
}

/// Uniformly random outcomes from a seeded generator.
pub struct SeededOracle {
    rng: StdRng,
}

impl SeededOracle {
    pub fn new(seed: u64) -> Self {
        SeededOracle {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        SeededOracle {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Oracle for SeededOracle {
    fn name(&self) -> &str {
        "seeded_sampler"
    }

    fn execute(&mut self, manifest: &CircuitManifest) -> Result<Vec<PitchState>, OracleError> {
        Ok(manifest
            .requests
            .iter()
            .map(|_| PitchState::from_index(self.rng.random_range(0..DIATONIC_SCALE_OCTAVE_PITCHES)))
            .collect())
    }
}

/// Replays a recorded supply. Every `execute` starts from the full
/// recording, so repeated requests reproduce the same outcomes.
#[derive(Clone, Debug)]
pub struct ReplayOracle {
    recording: SampleSupply,
}

impl ReplayOracle {
    pub fn new(recording: SampleSupply) -> Self {
        ReplayOracle { recording }
    }

    /// Load a recording from a JSON file in `full_res_dict` form.
    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let data = std::fs::read_to_string(path)?;
        let recording: SampleSupply = serde_json::from_str(&data)?;
        Ok(ReplayOracle::new(recording))
    }
}

impl Oracle for ReplayOracle {
    fn name(&self) -> &str {
        "replay"
    }

    fn execute(&mut self, manifest: &CircuitManifest) -> Result<Vec<PitchState>, OracleError> {
        let mut recording = self.recording.clone();
        manifest
            .requests
            .iter()
            .map(|request| {
                recording.take(request.key()).ok_or_else(|| OracleError::Exhausted {
                    key: request.key().to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::RotationDegrees;
    use crate::supply::{Role, SampleKey};
    use pretty_assertions::assert_eq;

    const DEGREES: RotationDegrees = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

    fn state(s: &str) -> PitchState {
        s.parse().unwrap()
    }

    /// Answers request i with state i mod 8.
    struct CountingOracle;

    impl Oracle for CountingOracle {
        fn name(&self) -> &str {
            "counting"
        }

        fn execute(&mut self, manifest: &CircuitManifest) -> Result<Vec<PitchState>, OracleError> {
            Ok((0..manifest.len())
                .map(|i| PitchState::from_index((i % 8) as u8))
                .collect())
        }
    }

    #[test]
    fn test_supply_filled_in_manifest_order() {
        let manifest = CircuitManifest::build(DEGREES, None, false);
        let supply = draw_supply(&mut CountingOracle, &manifest).unwrap();

        // "000_m" received requests 0..6, answered 0..5.
        let key = SampleKey::new(state("000"), Role::Melody);
        let queued: Vec<u8> = supply.queue(key).map(|s| s.index()).collect();
        assert_eq!(queued, [0, 1, 2, 3, 4, 5]);
        // "001_m" received requests 6..12.
        let key = SampleKey::new(state("001"), Role::Melody);
        let queued: Vec<u8> = supply.queue(key).map(|s| s.index()).collect();
        assert_eq!(queued, [6, 7, 0, 1, 2, 3]);
    }

    #[test]
    fn test_count_mismatch_is_an_error() {
        let manifest = CircuitManifest::build(DEGREES, None, false);
        let result = populate_supply(&manifest, vec![state("000")]);
        assert_eq!(
            result,
            Err(OracleError::ResultCountMismatch { expected: 48, actual: 1 })
        );
    }

    #[test]
    fn test_seeded_oracle_is_deterministic() {
        let manifest = CircuitManifest::build(DEGREES, Some(DEGREES), true);
        let a = SeededOracle::new(7).execute(&manifest).unwrap();
        let b = SeededOracle::new(7).execute(&manifest).unwrap();
        assert_eq!(a.len(), manifest.len());
        assert_eq!(a, b);
    }

    #[test]
    fn test_replay_reproduces_recording() {
        let manifest = CircuitManifest::build(DEGREES, None, false);
        let original = draw_supply(&mut SeededOracle::new(3), &manifest).unwrap();

        let mut replay = ReplayOracle::new(original.clone());
        assert_eq!(draw_supply(&mut replay, &manifest).unwrap(), original);
        // A second execute starts from the full recording again.
        assert_eq!(draw_supply(&mut replay, &manifest).unwrap(), original);
    }

    #[test]
    fn test_replay_exhaustion() {
        let manifest = CircuitManifest::build(DEGREES, None, true);
        let mut replay = ReplayOracle::new(SampleSupply::new());
        assert_eq!(
            replay.execute(&manifest),
            Err(OracleError::Exhausted { key: "000_m".into() })
        );
    }

    #[test]
    fn test_replay_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.json");
        std::fs::write(&path, r#"{"000_m": ["010"], "000_h": ["111"]}"#).unwrap();

        let mut replay = ReplayOracle::load(&path).unwrap();
        let manifest = CircuitManifest::build(DEGREES, None, false);
        assert!(matches!(replay.execute(&manifest), Err(OracleError::Exhausted { .. })));

        std::fs::write(&path, r#"{"000_m": ["012"]}"#).unwrap();
        assert!(matches!(ReplayOracle::load(&path), Err(RecordingError::Json(_))));
    }
}
