// Query-string parsing for the counterpoint endpoint.
//
// Parameters (all strings in the URL query):
//   pitch_index       integer; wrapped into 0-7 (negative values included)
//   species           0-3; 0 means "compute species 3 but return only the
//                     note numbers" (jam mode: no notation or playback)
//   melodic_degrees   six comma-separated angles in degrees
//   harmonic_degrees  six angles, or empty/absent to disable harmony
//   use_simulator     "true" (any case) sizes the manifest for a simulator
//
// Validation is all-or-nothing: either a complete `CounterpointRequest` is
// produced or a `RequestError` names the first offending parameter.

use std::collections::HashMap;

use toy_piano_compose::codec::PitchState;
use toy_piano_compose::manifest::RotationDegrees;
use toy_piano_compose::walker::{DEGREES_OF_FREEDOM, Species, WalkParams};

use crate::error::RequestError;

/// A validated counterpoint request.
#[derive(Clone, Debug, PartialEq)]
pub struct CounterpointRequest {
    pub seed: PitchState,
    pub species: Species,
    /// Species was sent as 0: skip notation and playback output.
    pub jam_only: bool,
    pub melodic_degrees: RotationDegrees,
    /// `None` disables harmony.
    pub harmonic_degrees: Option<RotationDegrees>,
    pub use_simulator: bool,
}

impl CounterpointRequest {
    /// Parse and validate a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Result<Self, RequestError> {
        let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let get = |name: &'static str| params.get(name).map(String::as_str);

        let pitch_index = parse_integer("pitch_index", get("pitch_index"))?;
        let species_number = parse_integer("species", get("species"))?;
        let (species, jam_only) = match species_number {
            0 => (Species::Third, true),
            1..=3 => (species_from(species_number)?, false),
            other => return Err(RequestError::SpeciesOutOfRange(other)),
        };

        let melodic = get("melodic_degrees").ok_or(RequestError::Missing("melodic_degrees"))?;
        let melodic_degrees = parse_degrees("melodic_degrees", melodic)?;
        let harmonic_degrees = match get("harmonic_degrees") {
            Some(harmonic) if !harmonic.is_empty() => {
                Some(parse_degrees("harmonic_degrees", harmonic)?)
            }
            _ => None,
        };

        let use_simulator = get("use_simulator").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(CounterpointRequest {
            seed: PitchState::wrapping(pitch_index),
            species,
            jam_only,
            melodic_degrees,
            harmonic_degrees,
            use_simulator,
        })
    }

    pub fn harmony_enabled(&self) -> bool {
        self.harmonic_degrees.is_some()
    }

    pub fn walk_params(&self) -> WalkParams {
        WalkParams {
            seed: self.seed,
            species: self.species,
            harmony: self.harmony_enabled(),
        }
    }
}

fn parse_integer(param: &'static str, value: Option<&str>) -> Result<i64, RequestError> {
    let value = value.ok_or(RequestError::Missing(param))?;
    value.trim().parse().map_err(|_| RequestError::NotAnInteger {
        param,
        value: value.to_string(),
    })
}

fn species_from(number: i64) -> Result<Species, RequestError> {
    u8::try_from(number)
        .ok()
        .and_then(Species::from_number)
        .ok_or(RequestError::SpeciesOutOfRange(number))
}

fn parse_degrees(param: &'static str, value: &str) -> Result<RotationDegrees, RequestError> {
    let angles = value
        .split(',')
        .map(|angle| {
            angle.trim().parse::<f64>().map_err(|_| RequestError::InvalidDegree {
                param,
                value: angle.to_string(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    RotationDegrees::try_from(angles.as_slice()).map_err(|_| RequestError::DegreeCount {
        param,
        expected: DEGREES_OF_FREEDOM,
        actual: angles.len(),
    })
}
