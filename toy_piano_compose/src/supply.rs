// Sample Supply: per-state, per-role FIFO queues of oracle outcomes.
//
// The oracle answers one single-shot circuit per (state, role, repetition).
// Those outcomes are organized here into 16 queues, one per `SampleKey`
// (8 pitch states x 2 roles). The composition walk consumes them one draw
// per transition, so the piece is a deterministic function of the order in
// which samples were `put`.
//
// The table is fixed-size and always holds all 16 queues, even when harmony
// is disabled: a lookup can find an empty queue, never a missing one.
//
// Serialization uses the `"SSS_r"` string keys of the service's
// `full_res_dict` response field (`"010_m"`, `"010_h"`), which doubles as
// the recording format read back by `ReplayOracle`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::codec::{DIATONIC_SCALE_OCTAVE_PITCHES, PitchState};
use crate::error::ParseSampleError;

/// Which queue family a state belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Melody = 0,
    Harmony = 1,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Melody, Role::Harmony];

    /// One-letter suffix used in supply keys and circuit names.
    pub fn letter(self) -> char {
        match self {
            Role::Melody => 'm',
            Role::Harmony => 'h',
        }
    }

    fn from_suffix(suffix: &str) -> Option<Role> {
        match suffix {
            "m" => Some(Role::Melody),
            "h" => Some(Role::Harmony),
            _ => None,
        }
    }
}

/// Address of one FIFO queue: input state plus role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub state: PitchState,
    pub role: Role,
}

impl SampleKey {
    pub fn new(state: PitchState, role: Role) -> Self {
        SampleKey { state, role }
    }

    /// Every key, states ascending, melody before harmony within a state.
    pub fn all() -> impl Iterator<Item = SampleKey> {
        PitchState::all().flat_map(|state| Role::ALL.map(|role| SampleKey::new(state, role)))
    }

    fn slot(self) -> usize {
        usize::from(self.state.index()) * Role::ALL.len() + self.role as usize
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.state, self.role.letter())
    }
}

impl FromStr for SampleKey {
    type Err = ParseSampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (state, role) = s
            .split_once('_')
            .ok_or_else(|| ParseSampleError::Key(s.to_string()))?;
        let role = Role::from_suffix(role).ok_or_else(|| ParseSampleError::Key(s.to_string()))?;
        let state = state
            .parse::<PitchState>()
            .map_err(|_| ParseSampleError::Key(s.to_string()))?;
        Ok(SampleKey::new(state, role))
    }
}

const NUM_KEYS: usize = DIATONIC_SCALE_OCTAVE_PITCHES as usize * Role::ALL.len();

/// The request-scoped table of outcome queues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SupplyRecord", try_from = "SupplyRecord")]
pub struct SampleSupply {
    queues: [VecDeque<PitchState>; NUM_KEYS],
}

impl Default for SampleSupply {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSupply {
    /// An empty supply with all 16 queues present.
    pub fn new() -> Self {
        SampleSupply {
            queues: std::array::from_fn(|_| VecDeque::new()),
        }
    }

    /// Append a sample to the back of `key`'s queue.
    pub fn put(&mut self, key: SampleKey, sample: PitchState) {
        self.queues[key.slot()].push_back(sample);
    }

    /// Pop the oldest sample for `key`, or `None` if the queue is empty.
    pub fn take(&mut self, key: SampleKey) -> Option<PitchState> {
        self.queues[key.slot()].pop_front()
    }

    /// Number of samples remaining for `key`.
    pub fn remaining(&self, key: SampleKey) -> usize {
        self.queues[key.slot()].len()
    }

    /// Remaining samples for `key`, oldest first.
    pub fn queue(&self, key: SampleKey) -> impl Iterator<Item = PitchState> + '_ {
        self.queues[key.slot()].iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }
}

/// Wire form: `{"000_h": ["101", ...], "000_m": [...], ...}`.
type SupplyRecord = BTreeMap<String, Vec<String>>;

impl From<SampleSupply> for SupplyRecord {
    fn from(supply: SampleSupply) -> Self {
        SampleKey::all()
            .map(|key| {
                let samples = supply.queue(key).map(|s| s.to_string()).collect();
                (key.to_string(), samples)
            })
            .collect()
    }
}

impl TryFrom<SupplyRecord> for SampleSupply {
    type Error = ParseSampleError;

    fn try_from(record: SupplyRecord) -> Result<Self, Self::Error> {
        let mut supply = SampleSupply::new();
        for (key, samples) in record {
            let key: SampleKey = key.parse()?;
            for sample in samples {
                supply.put(key, sample.parse()?);
            }
        }
        Ok(supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(s: &str) -> PitchState {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_supply_has_sixteen_empty_queues() {
        let mut supply = SampleSupply::new();
        assert_eq!(SampleKey::all().count(), 16);
        for key in SampleKey::all() {
            assert_eq!(supply.remaining(key), 0);
            assert_eq!(supply.take(key), None);
        }
        assert!(supply.is_empty());
    }

    #[test]
    fn test_fifo_within_key() {
        let mut supply = SampleSupply::new();
        let key = SampleKey::new(state("010"), Role::Melody);
        supply.put(key, state("011"));
        supply.put(key, state("100"));
        assert_eq!(supply.take(key), Some(state("011")));
        assert_eq!(supply.take(key), Some(state("100")));
        assert_eq!(supply.take(key), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut supply = SampleSupply::new();
        let melody = SampleKey::new(state("010"), Role::Melody);
        let harmony = SampleKey::new(state("010"), Role::Harmony);
        supply.put(melody, state("001"));
        assert_eq!(supply.take(harmony), None);
        assert_eq!(supply.remaining(melody), 1);
    }

    #[test]
    fn test_key_string_form() {
        let key = SampleKey::new(state("110"), Role::Harmony);
        assert_eq!(key.to_string(), "110_h");
        assert_eq!("110_h".parse::<SampleKey>().unwrap(), key);
        assert!("110_x".parse::<SampleKey>().is_err());
        assert!("110".parse::<SampleKey>().is_err());
        assert!("1a0_m".parse::<SampleKey>().is_err());
    }

    #[test]
    fn test_serializes_all_keys_sorted() {
        let mut supply = SampleSupply::new();
        supply.put(SampleKey::new(state("000"), Role::Melody), state("111"));
        let json = serde_json::to_value(&supply).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 16);
        assert_eq!(object.keys().next().map(String::as_str), Some("000_h"));
        assert_eq!(json["000_m"], serde_json::json!(["111"]));
        assert_eq!(json["111_h"], serde_json::json!([]));
    }

    #[test]
    fn test_deserialize_fills_missing_keys() {
        let supply: SampleSupply =
            serde_json::from_str(r#"{"010_m": ["011", "001"]}"#).unwrap();
        let key = SampleKey::new(state("010"), Role::Melody);
        let queued: Vec<String> = supply.queue(key).map(|s| s.to_string()).collect();
        assert_eq!(queued, ["011", "001"]);
        assert_eq!(supply.remaining(SampleKey::new(state("010"), Role::Harmony)), 0);
    }

    #[test]
    fn test_deserialize_rejects_bad_samples() {
        assert!(serde_json::from_str::<SampleSupply>(r#"{"010_m": ["21"]}"#).is_err());
        assert!(serde_json::from_str::<SampleSupply>(r#"{"010_q": []}"#).is_err());
    }
}
