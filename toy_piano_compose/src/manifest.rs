// Circuit manifest: the list of single-shot circuits a composition needs.
//
// One circuit is requested per (input state, role, repetition). The
// repetition counts bound how many samples each supply queue can hold, so
// they are sized to cover a typical walk: a simulator backend accepts a
// larger batch than a remote device. Request order is significant: the
// oracle answers requests positionally, and the supply is filled in this
// order, so repetition 0 of a key is the first sample that key yields.

use std::fmt;

use crate::codec::PitchState;
use crate::supply::{Role, SampleKey};
use crate::walker::DEGREES_OF_FREEDOM;

/// Rotation angles, in degrees, for one circuit family.
pub type RotationDegrees = [f64; DEGREES_OF_FREEDOM];

/// Melody circuits per state on a simulator backend.
const SIMULATOR_MELODY_REPETITIONS: usize = 11;
/// Melody circuits per state on a device (smaller batch limit).
const DEVICE_MELODY_REPETITIONS: usize = 6;
const SIMULATOR_HARMONY_REPETITIONS: usize = 8;
const DEVICE_HARMONY_REPETITIONS: usize = 3;

/// One single-shot circuit: prepare `state`, apply the role's rotations,
/// measure once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitRequest {
    pub state: PitchState,
    pub role: Role,
    pub repetition: usize,
}

impl CircuitRequest {
    /// The supply queue this circuit's outcome belongs to.
    pub fn key(&self) -> SampleKey {
        SampleKey::new(self.state, self.role)
    }
}

impl fmt::Display for CircuitRequest {
    /// Circuit name, e.g. `010_m_03`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:02}", self.key(), self.repetition)
    }
}

/// Everything the oracle needs to produce a request's samples.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitManifest {
    pub melodic_degrees: RotationDegrees,
    /// `None` when harmony is disabled.
    pub harmonic_degrees: Option<RotationDegrees>,
    pub use_simulator: bool,
    pub requests: Vec<CircuitRequest>,
}

impl CircuitManifest {
    /// Build the manifest: all melody circuits (states ascending, then
    /// repetitions), followed by all harmony circuits when enabled.
    pub fn build(
        melodic_degrees: RotationDegrees,
        harmonic_degrees: Option<RotationDegrees>,
        use_simulator: bool,
    ) -> Self {
        let mut manifest = CircuitManifest {
            melodic_degrees,
            harmonic_degrees,
            use_simulator,
            requests: Vec::new(),
        };
        for role in Role::ALL {
            let repetitions = manifest.repetitions(role);
            for state in PitchState::all() {
                manifest.requests.extend(
                    (0..repetitions).map(|repetition| CircuitRequest { state, role, repetition }),
                );
            }
        }
        manifest
    }

    /// Circuits requested per input state for `role`.
    pub fn repetitions(&self, role: Role) -> usize {
        match (role, self.use_simulator) {
            (Role::Melody, true) => SIMULATOR_MELODY_REPETITIONS,
            (Role::Melody, false) => DEVICE_MELODY_REPETITIONS,
            (Role::Harmony, _) if self.harmonic_degrees.is_none() => 0,
            (Role::Harmony, true) => SIMULATOR_HARMONY_REPETITIONS,
            (Role::Harmony, false) => DEVICE_HARMONY_REPETITIONS,
        }
    }

    pub fn harmony_enabled(&self) -> bool {
        self.harmonic_degrees.is_some()
    }

    /// Rotation angles applied to circuits of `role`.
    pub fn degrees(&self, role: Role) -> Option<&RotationDegrees> {
        match role {
            Role::Melody => Some(&self.melodic_degrees),
            Role::Harmony => self.harmonic_degrees.as_ref(),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEGREES: RotationDegrees = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0];

    #[test]
    fn test_simulator_manifest_sizes() {
        let manifest = CircuitManifest::build(DEGREES, Some(DEGREES), true);
        assert_eq!(manifest.len(), 8 * 11 + 8 * 8);
        assert_eq!(manifest.repetitions(Role::Harmony), 8);
    }

    #[test]
    fn test_device_manifest_sizes() {
        let manifest = CircuitManifest::build(DEGREES, Some(DEGREES), false);
        assert_eq!(manifest.len(), 8 * 6 + 8 * 3);
    }

    #[test]
    fn test_no_harmony_circuits_without_harmony() {
        let manifest = CircuitManifest::build(DEGREES, None, true);
        assert_eq!(manifest.len(), 8 * 11);
        assert!(manifest.requests.iter().all(|r| r.role == Role::Melody));
        assert!(manifest.degrees(Role::Harmony).is_none());
        assert!(!manifest.harmony_enabled());
    }

    #[test]
    fn test_request_order_and_names() {
        let manifest = CircuitManifest::build(DEGREES, Some(DEGREES), false);
        let names: Vec<String> = manifest.requests.iter().map(|r| r.to_string()).collect();
        assert_eq!(names[0], "000_m_00");
        assert_eq!(names[5], "000_m_05");
        assert_eq!(names[6], "001_m_00");
        assert_eq!(names[48], "000_h_00");
        assert_eq!(names.last().map(String::as_str), Some("111_h_02"));
    }
}
