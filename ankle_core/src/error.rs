// ankle_core/src/error.rs

use thiserror::Error;

/// Identifies which bound input series a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Excitation,
    /// One of the four external-state channels, `0..4`.
    External(usize),
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Excitation => write!(f, "excitation"),
            Channel::External(i) => write!(f, "external[{}]", i),
        }
    }
}

/// Every way a forward simulation run can abort.
///
/// None of these are recoverable inside a run: the caller gets the offending
/// time (and state, where one exists) and decides what to do with the run.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A sample lookup fell outside the supplied series.
    #[error("{channel} series has no sample {index} (len {len}) for t = {time}")]
    InputBounds {
        channel: Channel,
        time: f64,
        /// Requested index; negative when `time` itself was negative.
        index: i64,
        len: usize,
        /// State the lookup was made for. `None` for direct sampler queries,
        /// filled in when the lookup happens inside a derivative evaluation.
        state: Option<Vec<f64>>,
    },

    /// The solver could not advance the state.
    #[error("integration failed at t = {time} with state {state:?}: {reason}")]
    Integration {
        time: f64,
        /// Last accepted state.
        state: Vec<f64>,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Attaches the evaluated state to an `InputBounds` error that has none yet.
    pub fn with_state(self, x: &[f64]) -> Self {
        match self {
            ModelError::InputBounds {
                channel,
                time,
                index,
                len,
                state: None,
            } => ModelError::InputBounds {
                channel,
                time,
                index,
                len,
                state: Some(x.to_vec()),
            },
            other => other,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
