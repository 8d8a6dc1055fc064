use thiserror::Error;

use crate::models::{GenderGroup, Metric};

/// Recoverable problems with the data handed to the statistics core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("empty group: {0}")]
    EmptyGroup(String),

    #[error("empty sample: {0}")]
    EmptySample(&'static str),

    #[error("cannot draw {requested} values without replacement from a pool of {available}")]
    SampleExceedsPool { requested: usize, available: usize },

    #[error("unknown metric '{0}' (expected Speaks, Ranks, Wins or Points)")]
    UnknownMetric(String),

    #[error("record '{record}' has no {metric} value")]
    MissingMetric { record: String, metric: Metric },

    #[error("record '{record}' has a non-finite {metric} value")]
    NonFiniteMetric { record: String, metric: Metric },

    #[error("malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("need two non-empty gender groups to compare, found {found:?}")]
    InsufficientGroups { found: Vec<GenderGroup> },

    #[error("resampling needs at least one iteration")]
    ZeroIterations,

    #[error("resampling worker did not finish: {0}")]
    WorkerCancelled(String),

    #[error("invalid normal distribution: {0}")]
    InvalidDistribution(String),
}

/// Failures reading an input table. Fatal to the run.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: String, column: &'static str },

    #[error("{0} contains no data rows")]
    Empty(String),

    #[error("{path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: DomainError,
    },
}
