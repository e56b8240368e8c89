// Domain layer: entities, expressions, value objects and the adapter contract
pub mod domain;

// Groups, name generators and prefix validators
pub mod group;

// Model aggregate: declarations, lifecycle and solution access
pub mod model;

// Application layer: DTO mapping and persistence contracts
pub mod application;

// Infrastructure layer: JSON file store
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverBackend
pub mod solver;

// Re-export commonly used types
pub use domain::{
    BackendError, CanonicalRow, Constant, Constraint, EntityKind, Expression, ModelError,
    ModelToken, NameError, Objective, ObjectiveType, Operator, SolutionParam, SolutionParams,
    SolutionStatus, SolutionValue, SolverBackend, SolverConfig, Term, Var, VarType,
};

pub use group::{
    ConstantGroup, ConstraintGroup, Group, GroupContext, GroupInitializer, NameGenerator, Prefix,
    PrefixNameGenerator, VarGroup,
};

pub use model::{LifecyclePhase, Model, ModelConfig, ModelState};

pub use application::{ExchangeError, ModelDocument, ModelExporter, ModelImporter};

pub use infrastructure::{JsonFileConfig, JsonFileExporter, JsonFileImporter};

pub use solver::SkeletonBackend;

#[cfg(feature = "cbc")]
pub use solver::CbcBackend;

#[cfg(feature = "highs")]
pub use solver::HighsBackend;
