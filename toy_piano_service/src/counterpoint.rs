// The counterpoint endpoint pipeline.
//
// One request runs start to finish with no shared state between requests:
//   manifest -> oracle -> Sample Supply (snapshotted) -> walk -> renderers
//
// The supply snapshot is taken before the walk consumes anything, so the
// `full_res_dict` field of the response holds every outcome the oracle
// produced and can be fed back through a `ReplayOracle` to reproduce the
// same piece. In jam mode (species 0) the renderers are skipped and the
// notation and playback fields come back empty.

use serde::Serialize;
use tracing::{info, warn};

use toy_piano_compose::codec::NoteNumber;
use toy_piano_compose::layout::Layout;
use toy_piano_compose::lilypond::layout_to_lilypond;
use toy_piano_compose::manifest::CircuitManifest;
use toy_piano_compose::oracle::{Oracle, draw_supply};
use toy_piano_compose::playback::{PlaybackEvent, layout_to_playback};
use toy_piano_compose::supply::SampleSupply;
use toy_piano_compose::walker::compose;

use crate::error::ServiceError;
use crate::request::CounterpointRequest;

/// JSON body of a successful counterpoint response.
#[derive(Clone, Debug, Serialize)]
pub struct CounterpointResponse {
    pub melody: Vec<NoteNumber>,
    pub harmony: Vec<NoteNumber>,
    pub lilypond: String,
    pub toy_piano: Vec<PlaybackEvent>,
    pub full_res_dict: SampleSupply,
}

/// Compose one piece for `request`, drawing samples from `oracle`.
///
/// Oracle failures abort before the walk runs.
pub fn toy_piano_counterpoint(
    request: &CounterpointRequest,
    oracle: &mut dyn Oracle,
) -> Result<CounterpointResponse, ServiceError> {
    let manifest = CircuitManifest::build(
        request.melodic_degrees,
        request.harmonic_degrees,
        request.use_simulator,
    );
    let mut supply = draw_supply(oracle, &manifest)?;
    let full_res_dict = supply.clone();

    let composition = compose(&mut supply, &request.walk_params());
    if !composition.fallback_draws.is_empty() {
        warn!(
            count = composition.fallback_draws.len(),
            "composition used fallback samples"
        );
    }

    let (lilypond, toy_piano) = if request.jam_only {
        (String::new(), Vec::new())
    } else {
        let layout = Layout::new(&composition.melody, &composition.harmony)?;
        (layout_to_lilypond(&layout, oracle.name())?, layout_to_playback(&layout))
    };

    info!(
        seed = %request.seed,
        species = request.species.number(),
        harmony = request.harmony_enabled(),
        jam_only = request.jam_only,
        circuits = manifest.len(),
        "composed counterpoint"
    );

    Ok(CounterpointResponse {
        melody: composition.melody,
        harmony: composition.harmony,
        lilypond,
        toy_piano,
        full_res_dict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_piano_compose::codec::PitchState;
    use toy_piano_compose::error::OracleError;
    use toy_piano_compose::oracle::{ReplayOracle, SeededOracle};
    use toy_piano_compose::supply::{Role, SampleKey};

    const MELODIC: &str = "melodic_degrees=0,0,0,0,0,0";
    const HARMONIC: &str = "harmonic_degrees=90,90,90,90,90,90";

    fn request(query: &str) -> CounterpointRequest {
        CounterpointRequest::from_query(query).unwrap()
    }

    struct OfflineOracle;

    impl Oracle for OfflineOracle {
        fn name(&self) -> &str {
            "offline"
        }

        fn execute(&mut self, _: &CircuitManifest) -> Result<Vec<PitchState>, OracleError> {
            Err(OracleError::Unavailable("backend offline".into()))
        }
    }

    #[test]
    fn test_melody_only_response() {
        let mut oracle = SeededOracle::new(7);
        let response =
            toy_piano_counterpoint(&request(&format!("pitch_index=3&species=1&{MELODIC}")), &mut oracle)
                .unwrap();
        assert_eq!(response.melody.len(), 7);
        assert!(response.harmony.is_empty());
        assert_eq!(response.toy_piano.len(), 8);
        assert!(response.lilypond.contains("composer = \"seeded_sampler\""));
        assert!(!response.lilypond.contains("\\harmony"));
    }

    #[test]
    fn test_snapshot_holds_every_outcome() {
        let mut oracle = SeededOracle::new(11);
        let query = format!("pitch_index=0&species=3&{MELODIC}&{HARMONIC}");
        let response = toy_piano_counterpoint(&request(&query), &mut oracle).unwrap();
        for key in SampleKey::all() {
            let expected = match key.role {
                Role::Melody => 6,
                Role::Harmony => 3,
            };
            assert_eq!(response.full_res_dict.remaining(key), expected, "{key}");
        }
        assert_eq!(response.harmony.len(), 28);
        assert_eq!(response.toy_piano.len(), 7 + 1 + 28 + 1);
    }

    #[test]
    fn test_jam_mode_skips_rendering() {
        let mut oracle = SeededOracle::new(5);
        let query = format!("pitch_index=1&species=0&{MELODIC}&{HARMONIC}");
        let response = toy_piano_counterpoint(&request(&query), &mut oracle).unwrap();
        assert_eq!(response.melody.len(), 7);
        assert_eq!(response.harmony.len(), 28);
        assert!(response.lilypond.is_empty());
        assert!(response.toy_piano.is_empty());
    }

    #[test]
    fn test_replay_reproduces_composition() {
        let query = format!("pitch_index=6&species=2&{MELODIC}&{HARMONIC}");
        let first =
            toy_piano_counterpoint(&request(&query), &mut SeededOracle::new(99)).unwrap();
        let mut replay = ReplayOracle::new(first.full_res_dict.clone());
        let second = toy_piano_counterpoint(&request(&query), &mut replay).unwrap();
        assert_eq!(first.melody, second.melody);
        assert_eq!(first.harmony, second.harmony);
        assert_eq!(first.toy_piano, second.toy_piano);
        assert_eq!(first.full_res_dict, second.full_res_dict);
    }

    #[test]
    fn test_oracle_failure_is_unavailable() {
        let err = toy_piano_counterpoint(
            &request(&format!("pitch_index=0&species=1&{MELODIC}")),
            &mut OfflineOracle,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_response_json_fields() {
        let mut oracle = SeededOracle::new(1);
        let response =
            toy_piano_counterpoint(&request(&format!("pitch_index=0&species=1&{MELODIC}")), &mut oracle)
                .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        for field in ["melody", "harmony", "lilypond", "toy_piano", "full_res_dict"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert!(json["full_res_dict"].get("000_m").is_some());
        assert!(json["melody"][0].is_u64());
    }
}
