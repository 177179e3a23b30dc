use thiserror::Error;

use crate::processing::metrics::PipelineState;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write config file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("invalid configuration: `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The controller is not in a state that accepts this call.
    #[error("pipeline is {state}, call rejected")]
    Rejected { state: PipelineState },

    #[error("non-finite intensity sample: {value}")]
    NonFiniteSample { value: f64 },

    /// A stage produced an unusable value; the controller is now `Errored`.
    #[error("processing stage failed: {reason}")]
    StageFailure { reason: String },
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: `{value}` is not a number")]
    Parse { line: u64, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
