use thiserror::Error;

/// Top-level error type for the wiring planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Errors raised while building or querying the vehicle model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("invalid edge {edge}: {reason}")]
    InvalidEdge { edge: String, reason: String },

    #[error("invalid panel {panel}: {reason}")]
    InvalidPanel { panel: String, reason: String },

    #[error("signal chain through edge {0} forms a cycle")]
    SignalCycle(String),

    #[error("conflicting signal chain at edge {edge}: {reason}")]
    SignalConflict { edge: String, reason: String },
}

/// Fatal planning failures. None of these are recoverable; the operator
/// fixes the input data or the capacity constants and re-runs.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("{target} cannot take {requested:.3} more (available {available:.3})")]
    CapacityExceeded {
        target: String,
        requested: f64,
        available: f64,
    },

    #[error("no eligible target: {0}")]
    NoEligibleTarget(String),

    #[error(
        "controller {controller} is {distance_feet:.2} ft from the first pixel of {target} \
         (limit {limit_feet:.2} ft)"
    )]
    DistanceValidationFailure {
        controller: String,
        target: String,
        distance_feet: f64,
        limit_feet: f64,
    },

    #[error("data integrity mismatch: {0}")]
    DataIntegrityMismatch(String),
}

/// Errors related to reading geometry, signal paths, and configuration.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tsv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error("{file} row {row}: {message}")]
    MalformedRow {
        file: String,
        row: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for results using [`PlannerError`].
pub type Result<T> = std::result::Result<T, PlannerError>;
