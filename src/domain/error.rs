// Error taxonomy for declarations, expressions, the lifecycle and solution access

use super::solver_service::BackendError;
use super::value_objects::{EntityKind, SolutionParam};

/// Errors raised by the naming framework
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NameError {
    #[error("No valid name generator available")]
    NoGenerator,

    #[error("Number of prefixes provided ({provided}) does not match index count {expected}")]
    ArityMismatch { expected: usize, provided: usize },

    #[error("Validator slot {slot} is outside the index count {index_count}")]
    SlotOutOfRange { slot: usize, index_count: usize },

    #[error("{0}")]
    Rejected(String),
}

/// Errors raised while declaring, initializing or reading a model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{kind} identifier cannot be empty")]
    EmptyIdentifier { kind: EntityKind },

    #[error("{kind} with identifier ({identifier}) already exists")]
    DuplicateEntity {
        kind: EntityKind,
        identifier: String,
    },

    #[error("{kind} with identifier {identifier} not found in model")]
    UnknownEntity {
        kind: EntityKind,
        identifier: String,
    },

    #[error("{kind} group identifier ({identifier}) already exists")]
    DuplicateGroup {
        kind: EntityKind,
        identifier: String,
    },

    #[error("{kind} group identifier ({identifier}) not found in the model")]
    UnknownGroup {
        kind: EntityKind,
        identifier: String,
    },

    #[error("Lower bound {lower} of variable {identifier} cannot be greater than upper bound {upper}")]
    InvalidBounds {
        identifier: String,
        lower: f64,
        upper: f64,
    },

    #[error("Constraint {identifier} has no terms on either side")]
    EmptyExpression { identifier: String },

    #[error("Variable {identifier} is not registered on the model owning this expression")]
    ForeignVariable { identifier: String },

    #[error("Expressions belong to different models")]
    ForeignExpression,

    #[error("Naming error: {0}")]
    Name(#[from] NameError),

    #[error("Objective function has not been defined")]
    MissingObjective,

    #[error("Solution parameter {0} is not available")]
    MissingSolutionParam(SolutionParam),

    #[error("Solution parameter {param} holds a {found} value, expected {expected}")]
    SolutionParamType {
        param: SolutionParam,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Model validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Lifecycle violation: {0}")]
    Lifecycle(String),

    #[error("Backend failure during {phase}: {source}")]
    Backend {
        phase: &'static str,
        #[source]
        source: BackendError,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
