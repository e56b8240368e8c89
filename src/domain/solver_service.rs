// Adapter contract a solver binding implements to back a `Model`
// Each adapter owns its native handle types; the core only stores them

use super::error::Result;
use super::expression::Expression;
use super::models::{CanonicalRow, Constraint, ModelToken, Objective, Var};
use super::value_objects::{Operator, SolutionParams, VarType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Failures reported by a solver adapter
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Native model has not been initialized")]
    NotInitialized,

    #[error("No native handle for variable {0}")]
    MissingVarHandle(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Native handles keyed by entity identifier
pub type Handles<H> = BTreeMap<String, H>;

/// Resolves the native handle of variable `identifier`.
pub fn var_handle<'a, H>(vars: &'a Handles<H>, identifier: &str) -> BackendResult<&'a H> {
    vars.get(identifier)
        .ok_or_else(|| BackendError::MissingVarHandle(identifier.to_string()))
}

/// Builds variables at declaration time
pub trait VarFactory: Send + Sync {
    fn create(
        &self,
        owner: ModelToken,
        identifier: &str,
        var_type: VarType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Var>;
}

/// Builds constraints at declaration time
pub trait ConstraintFactory: Send + Sync {
    fn create(
        &self,
        identifier: &str,
        lhs: Expression,
        operator: Operator,
        rhs: Expression,
    ) -> Result<Constraint>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVarFactory;

impl VarFactory for DefaultVarFactory {
    fn create(
        &self,
        owner: ModelToken,
        identifier: &str,
        var_type: VarType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Var> {
        Var::new(owner, identifier, var_type, lower_bound, upper_bound)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConstraintFactory;

impl ConstraintFactory for DefaultConstraintFactory {
    fn create(
        &self,
        identifier: &str,
        lhs: Expression,
        operator: Operator,
        rhs: Expression,
    ) -> Result<Constraint> {
        Constraint::new(identifier, lhs, operator, rhs)
    }
}

/// Contract that every solver binding must follow
///
/// The model drives these hooks in a fixed order: `init_model`, then
/// `init_var` for every variable, `init_constraint` for every constraint,
/// `init_objective`, and later `compute` and `extract_results` on request.
pub trait SolverBackend: Send + Sync {
    /// Native model or environment
    type Model: Send + Sync;
    /// Native variable handle
    type Var: Send + Sync;
    /// Native constraint handle
    type Constraint: Send + Sync;

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Factory used when variables are declared. Captured once by the model.
    fn var_factory(&self) -> Arc<dyn VarFactory> {
        Arc::new(DefaultVarFactory)
    }

    /// Factory used when constraints are declared. Captured once by the model.
    fn constraint_factory(&self) -> Arc<dyn ConstraintFactory> {
        Arc::new(DefaultConstraintFactory)
    }

    /// Native model, `None` before `init_model`.
    fn backend_model(&self) -> Option<&Self::Model>;

    /// Allocate the native model.
    fn init_model(&mut self, identifier: &str) -> BackendResult<()>;

    /// Materialize one variable.
    fn init_var(&mut self, var: &Var) -> BackendResult<Self::Var>;

    /// Materialize one constraint row; every variable already has a handle.
    fn init_constraint(
        &mut self,
        constraint: &Constraint,
        row: &CanonicalRow,
        vars: &Handles<Self::Var>,
    ) -> BackendResult<Self::Constraint>;

    /// Push the objective to the native model.
    fn init_objective(
        &mut self,
        objective: &Objective,
        vars: &Handles<Self::Var>,
    ) -> BackendResult<()>;

    /// Run the solve. Non-optimal outcomes are reported through the returned
    /// status, not as errors.
    fn compute(&mut self, vars: &Handles<Self::Var>) -> BackendResult<SolutionParams>;

    /// Read back the value of every variable after a solve.
    fn extract_results(&mut self, vars: &Handles<Self::Var>) -> BackendResult<BTreeMap<String, f64>>;
}
