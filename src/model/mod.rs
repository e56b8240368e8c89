//! The model aggregate: registry of groups and entities, objective holder and
//! driver of the backend lifecycle.
//!
//! Declarations take `&self` and may run from several threads; each entity
//! kind is guarded by its own lock. Lifecycle calls take `&mut self`.

mod declare;
mod lifecycle;
mod registry;
mod solution;
mod validation;

use crate::domain::{
    Constant, Constraint, ConstraintFactory, Expression, Handles, Objective, ObjectiveType,
    SolutionParams, SolverBackend, Var, VarFactory,
};
use crate::domain::{ModelToken, Result};
use crate::group::{ConstantKind, ConstraintKind, GroupInitializer, VarKind};
use registry::Registry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Optional settings applied at construction
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    /// Parent span for the model's own `model` span
    pub span: Option<tracing::Span>,
}

impl ModelConfig {
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// The seven initialization phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecyclePhase {
    InitModel,
    InitConstantGroups,
    InitVarGroups,
    InitVars,
    InitConstraintGroups,
    InitConstraints,
    InitObjective,
}

impl LifecyclePhase {
    pub fn name(&self) -> &'static str {
        match self {
            LifecyclePhase::InitModel => "init_model",
            LifecyclePhase::InitConstantGroups => "init_constant_groups",
            LifecyclePhase::InitVarGroups => "init_var_groups",
            LifecyclePhase::InitVars => "init_vars",
            LifecyclePhase::InitConstraintGroups => "init_constraint_groups",
            LifecyclePhase::InitConstraints => "init_constraints",
            LifecyclePhase::InitObjective => "init_obj_function_generator",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Declaring,
    Initializing(LifecyclePhase),
    Initialized,
    Solved,
    Failed,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Declaring => write!(f, "Declaring"),
            ModelState::Initializing(phase) => write!(f, "Initializing ({})", phase),
            ModelState::Initialized => write!(f, "Initialized"),
            ModelState::Solved => write!(f, "Solved"),
            ModelState::Failed => write!(f, "Failed"),
        }
    }
}

type Initializers<B, K> = BTreeMap<String, Box<dyn GroupInitializer<B, K>>>;

type ObjectiveFn<B> = Box<dyn Fn(&Model<B>) -> Result<Expression> + Send + Sync>;

pub(crate) struct ObjectiveGenerator<B: SolverBackend> {
    objective_type: ObjectiveType,
    generate: ObjectiveFn<B>,
}

/// Backend-agnostic LP/MIP model bound to one solver adapter
pub struct Model<B: SolverBackend> {
    identifier: String,
    token: ModelToken,
    backend: B,
    var_factory: Arc<dyn VarFactory>,
    constraint_factory: Arc<dyn ConstraintFactory>,

    vars: Mutex<Registry<Var, VarKind>>,
    constraints: Mutex<Registry<Constraint, ConstraintKind>>,
    constants: Mutex<Registry<Constant, ConstantKind>>,

    var_initializers: Mutex<Initializers<B, VarKind>>,
    constraint_initializers: Mutex<Initializers<B, ConstraintKind>>,
    constant_initializers: Mutex<Initializers<B, ConstantKind>>,

    objective: Mutex<Option<Objective>>,
    objective_generator: Mutex<Option<ObjectiveGenerator<B>>>,
    solution: Mutex<SolutionParams>,

    var_handles: Handles<B::Var>,
    constraint_handles: Handles<B::Constraint>,

    state: ModelState,
    span: tracing::Span,
}

impl<B: SolverBackend> Model<B> {
    /// Creates a model with the three default groups.
    pub fn new(identifier: impl Into<String>, backend: B) -> Self {
        Self::with_config(identifier, backend, ModelConfig::default())
    }

    pub fn with_config(identifier: impl Into<String>, backend: B, config: ModelConfig) -> Self {
        let identifier = identifier.into();
        let span = match &config.span {
            Some(parent) => tracing::info_span!(parent: parent, "model", model = %identifier),
            None => tracing::info_span!("model", model = %identifier),
        };
        tracing::debug!(
            parent: &span,
            component = "model",
            backend = backend.name(),
            "Model created"
        );
        Self {
            token: ModelToken::next(),
            var_factory: backend.var_factory(),
            constraint_factory: backend.constraint_factory(),
            backend,
            vars: Mutex::new(Registry::with_default_group()),
            constraints: Mutex::new(Registry::with_default_group()),
            constants: Mutex::new(Registry::with_default_group()),
            var_initializers: Mutex::new(BTreeMap::new()),
            constraint_initializers: Mutex::new(BTreeMap::new()),
            constant_initializers: Mutex::new(BTreeMap::new()),
            objective: Mutex::new(None),
            objective_generator: Mutex::new(None),
            solution: Mutex::new(SolutionParams::new()),
            var_handles: Handles::new(),
            constraint_handles: Handles::new(),
            state: ModelState::Declaring,
            span,
            identifier,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn token(&self) -> ModelToken {
        self.token
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Empty expression owned by this model.
    pub fn expression(&self) -> Expression {
        Expression::new(self.token)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Native model, `None` before `init_model` ran.
    pub fn backend_model(&self) -> Option<&B::Model> {
        self.backend.backend_model()
    }

    /// Native handle of a materialized variable.
    pub fn var_handle(&self, identifier: &str) -> Option<&B::Var> {
        self.var_handles.get(identifier)
    }

    /// Native handle of a materialized constraint.
    pub fn constraint_handle(&self, identifier: &str) -> Option<&B::Constraint> {
        self.constraint_handles.get(identifier)
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl<B: SolverBackend> fmt::Debug for Model<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("identifier", &self.identifier)
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .finish()
    }
}

// A panic while a lock is held leaves the data consistent: every mutation is
// a single insert, so poisoned guards are recovered.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn exclusive<T>(mutex: &mut Mutex<T>) -> &mut T {
    mutex.get_mut().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SkeletonBackend;

    #[test]
    fn new_model_starts_declaring_with_default_groups() {
        let model = Model::new("M", SkeletonBackend::new());
        assert_eq!(model.state(), ModelState::Declaring);
        assert_eq!(model.var_group_ids(), vec!["Default".to_string()]);
        assert_eq!(
            model.constraint_group_ids(),
            vec!["Default_Constraints".to_string()]
        );
        assert_eq!(
            model.constant_group_ids(),
            vec!["Default_Constants".to_string()]
        );
        assert!(model.backend_model().is_none());
    }

    #[test]
    fn models_get_distinct_tokens() {
        let a = Model::new("A", SkeletonBackend::new());
        let b = Model::new("B", SkeletonBackend::new());
        assert_ne!(a.token(), b.token());
        assert_eq!(a.expression().owner(), a.token());
    }

    #[test]
    fn phases_are_ordered() {
        assert!(LifecyclePhase::InitModel < LifecyclePhase::InitConstantGroups);
        assert!(LifecyclePhase::InitVars < LifecyclePhase::InitConstraintGroups);
        assert_eq!(
            LifecyclePhase::InitObjective.to_string(),
            "init_obj_function_generator"
        );
    }
}
