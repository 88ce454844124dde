// Error types for the composition library.
//
// The walk itself never fails (empty queues degrade to the fallback sample),
// so errors only arise at the edges: parsing recorded samples, talking to an
// oracle backend, and rendering a composition whose shape is inconsistent.

use thiserror::Error;

/// A sample or supply key string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSampleError {
    #[error("expected three '0'/'1' characters, got {0:?}")]
    BitString(String),
    #[error("unknown supply key {0:?} (expected e.g. \"010_m\" or \"010_h\")")]
    Key(String),
}

/// Failure to obtain outcomes from the oracle backend. When this is
/// returned the walk must not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle returned {actual} outcomes for {expected} circuit requests")]
    ResultCountMismatch { expected: usize, actual: usize },
    #[error("recorded supply has no remaining sample for {key}")]
    Exhausted { key: String },
}

/// A composition whose part lengths the renderers cannot lay out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("melody is empty")]
    EmptyMelody,
    #[error("harmony length {harmony} is not a multiple of melody length {melody}")]
    UnevenHarmony { melody: usize, harmony: usize },
    #[error("unsupported harmony density: {factor} notes per melody note")]
    UnsupportedDensity { factor: usize },
}

/// Failure to load a recorded supply from disk.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
}
