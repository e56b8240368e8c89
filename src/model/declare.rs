// Declaration surface: groups, entities, constants and the objective

use super::registry::Registry;
use super::{lock, Initializers, LifecyclePhase, Model, ModelState, ObjectiveGenerator};
use crate::domain::{
    Constant, Constraint, Expression, ModelError, Objective, ObjectiveType, Operator,
    Result, SolverBackend, Var, VarType,
};
use crate::group::{
    ConstantGroup, ConstantKind, ConstraintGroup, ConstraintKind, Group, GroupInitializer,
    GroupKind, NameGenerator, VarGroup, VarKind,
};
use std::sync::{Arc, Mutex};

impl<B: SolverBackend> Model<B> {
    // ---- variable groups and variables ----

    pub fn create_var_group(&self, identifier: &str, description: &str) -> Result<VarGroup> {
        self.create_var_group_with(identifier, description, None, None)
    }

    /// Creates a variable group with an optional name generator and an
    /// optional initializer, run during `init_var_groups`.
    pub fn create_var_group_with(
        &self,
        identifier: &str,
        description: &str,
        generator: Option<Arc<dyn NameGenerator>>,
        initializer: Option<Box<dyn GroupInitializer<B, VarKind>>>,
    ) -> Result<VarGroup> {
        self.check_window::<VarKind>(Some(LifecyclePhase::InitVarGroups))?;
        self.register_group(
            &self.vars,
            &self.var_initializers,
            Group::new(identifier, description, generator),
            initializer,
        )
    }

    /// Declares a variable in the default group.
    pub fn create_var(
        &self,
        identifier: &str,
        var_type: VarType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Var> {
        let group = self.var_group(VarKind::DEFAULT_GROUP)?;
        self.create_var_in(identifier, var_type, lower_bound, upper_bound, &group)
    }

    pub fn create_var_in(
        &self,
        identifier: &str,
        var_type: VarType,
        lower_bound: f64,
        upper_bound: f64,
        group: &VarGroup,
    ) -> Result<Var> {
        self.check_window::<VarKind>(Some(LifecyclePhase::InitVarGroups))?;
        let mut vars = lock(&self.vars);
        vars.group(group.identifier())?;
        vars.ensure_absent(identifier)?;
        let var = self
            .var_factory
            .create(self.token, identifier, var_type, lower_bound, upper_bound)?;
        vars.insert(group.identifier(), identifier, var.clone())?;
        tracing::debug!(
            parent: &self.span,
            component = "model",
            operation = "create_var",
            var = identifier,
            group = group.identifier(),
            "Variable declared"
        );
        Ok(var)
    }

    // ---- constraint groups and constraints ----

    pub fn create_constraint_group(
        &self,
        identifier: &str,
        description: &str,
    ) -> Result<ConstraintGroup> {
        self.create_constraint_group_with(identifier, description, None, None)
    }

    pub fn create_constraint_group_with(
        &self,
        identifier: &str,
        description: &str,
        generator: Option<Arc<dyn NameGenerator>>,
        initializer: Option<Box<dyn GroupInitializer<B, ConstraintKind>>>,
    ) -> Result<ConstraintGroup> {
        self.check_window::<ConstraintKind>(Some(LifecyclePhase::InitConstraintGroups))?;
        self.register_group(
            &self.constraints,
            &self.constraint_initializers,
            Group::new(identifier, description, generator),
            initializer,
        )
    }

    /// Declares `lhs op rhs` in the default constraint group.
    pub fn add_constraint(
        &self,
        identifier: &str,
        lhs: Expression,
        operator: Operator,
        rhs: Expression,
    ) -> Result<Constraint> {
        let group = self.constraint_group(ConstraintKind::DEFAULT_GROUP)?;
        self.add_constraint_in(identifier, lhs, operator, rhs, &group)
    }

    pub fn add_constraint_in(
        &self,
        identifier: &str,
        lhs: Expression,
        operator: Operator,
        rhs: Expression,
        group: &ConstraintGroup,
    ) -> Result<Constraint> {
        self.check_window::<ConstraintKind>(Some(LifecyclePhase::InitConstraintGroups))?;
        self.check_owned(&lhs)?;
        self.check_owned(&rhs)?;

        let mut constraints = lock(&self.constraints);
        constraints.group(group.identifier())?;
        constraints.ensure_absent(identifier)?;
        let constraint = self
            .constraint_factory
            .create(identifier, lhs, operator, rhs)?;
        constraints.insert(group.identifier(), identifier, constraint.clone())?;
        tracing::debug!(
            parent: &self.span,
            component = "model",
            operation = "add_constraint",
            constraint = identifier,
            group = group.identifier(),
            "Constraint declared"
        );
        Ok(constraint)
    }

    // ---- constant groups and constants ----

    pub fn create_constant_group(
        &self,
        identifier: &str,
        description: &str,
    ) -> Result<ConstantGroup> {
        self.create_constant_group_with(identifier, description, None, None)
    }

    pub fn create_constant_group_with(
        &self,
        identifier: &str,
        description: &str,
        generator: Option<Arc<dyn NameGenerator>>,
        initializer: Option<Box<dyn GroupInitializer<B, ConstantKind>>>,
    ) -> Result<ConstantGroup> {
        self.check_window::<ConstantKind>(None)?;
        self.register_group(
            &self.constants,
            &self.constant_initializers,
            Group::new(identifier, description, generator),
            initializer,
        )
    }

    pub fn create_constant(&self, identifier: &str, value: f64) -> Result<Constant> {
        let group = self.constant_group(ConstantKind::DEFAULT_GROUP)?;
        self.create_constant_in(identifier, value, &group)
    }

    pub fn create_constant_in(
        &self,
        identifier: &str,
        value: f64,
        group: &ConstantGroup,
    ) -> Result<Constant> {
        self.check_window::<ConstantKind>(None)?;
        let constant = Constant::new(identifier, value)?;
        lock(&self.constants).insert(group.identifier(), identifier, constant.clone())?;
        tracing::debug!(
            parent: &self.span,
            component = "model",
            operation = "create_constant",
            constant = identifier,
            value,
            "Constant declared"
        );
        Ok(constant)
    }

    /// Updates a constant; expressions built earlier keep the old value.
    pub fn set_constant_value(&self, identifier: &str, value: f64) -> Result<()> {
        lock(&self.constants).get_mut(identifier)?.set_value(value);
        Ok(())
    }

    // ---- objective ----

    pub fn set_objective(&self, expression: Expression, objective_type: ObjectiveType) -> Result<()> {
        self.check_objective_window()?;
        self.check_owned(&expression)?;
        *lock(&self.objective) = Some(Objective::new(expression, objective_type));
        Ok(())
    }

    pub fn objective(&self) -> Result<Objective> {
        lock(&self.objective)
            .clone()
            .ok_or(ModelError::MissingObjective)
    }

    /// Registers the closure that builds the objective during the last
    /// lifecycle phase. Replaces any previous generator.
    pub fn attach_objective_generator<F>(&self, objective_type: ObjectiveType, generate: F) -> Result<()>
    where
        F: Fn(&Model<B>) -> Result<Expression> + Send + Sync + 'static,
    {
        self.check_objective_window()?;
        *lock(&self.objective_generator) = Some(ObjectiveGenerator {
            objective_type,
            generate: Box::new(generate),
        });
        Ok(())
    }

    // ---- lookups ----

    /// Snapshot of variable `identifier`.
    pub fn var(&self, identifier: &str) -> Result<Var> {
        lock(&self.vars).get(identifier).cloned()
    }

    pub fn constraint(&self, identifier: &str) -> Result<Constraint> {
        lock(&self.constraints).get(identifier).cloned()
    }

    pub fn constant(&self, identifier: &str) -> Result<Constant> {
        lock(&self.constants).get(identifier).cloned()
    }

    pub fn vars(&self) -> Vec<Var> {
        lock(&self.vars).values()
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        lock(&self.constraints).values()
    }

    pub fn constants(&self) -> Vec<Constant> {
        lock(&self.constants).values()
    }

    pub fn var_group(&self, identifier: &str) -> Result<VarGroup> {
        lock(&self.vars).group(identifier).cloned()
    }

    pub fn constraint_group(&self, identifier: &str) -> Result<ConstraintGroup> {
        lock(&self.constraints).group(identifier).cloned()
    }

    pub fn constant_group(&self, identifier: &str) -> Result<ConstantGroup> {
        lock(&self.constants).group(identifier).cloned()
    }

    pub fn var_group_ids(&self) -> Vec<String> {
        lock(&self.vars).group_ids()
    }

    pub fn constraint_group_ids(&self) -> Vec<String> {
        lock(&self.constraints).group_ids()
    }

    pub fn constant_group_ids(&self) -> Vec<String> {
        lock(&self.constants).group_ids()
    }

    /// Identifiers of the variables in group `group`.
    pub fn var_ids_in(&self, group: &str) -> Result<Vec<String>> {
        lock(&self.vars).member_ids(group)
    }

    pub fn constraint_ids_in(&self, group: &str) -> Result<Vec<String>> {
        lock(&self.constraints).member_ids(group)
    }

    pub fn constant_ids_in(&self, group: &str) -> Result<Vec<String>> {
        lock(&self.constants).member_ids(group)
    }

    // ---- helpers ----

    fn register_group<E: Clone, K: GroupKind>(
        &self,
        registry: &Mutex<Registry<E, K>>,
        initializers: &Mutex<Initializers<B, K>>,
        group: Group<K>,
        initializer: Option<Box<dyn GroupInitializer<B, K>>>,
    ) -> Result<Group<K>> {
        if group.identifier().trim().is_empty() {
            return Err(ModelError::EmptyIdentifier { kind: K::ENTITY });
        }
        lock(registry).add_group(group.clone())?;
        if let Some(initializer) = initializer {
            lock(initializers).insert(group.identifier().to_string(), initializer);
        }
        tracing::debug!(
            parent: &self.span,
            component = "model",
            operation = "create_group",
            kind = %K::ENTITY,
            group = group.identifier(),
            "Group created"
        );
        Ok(group)
    }

    /// Declarations of kind `K` are open while declaring and, during
    /// `init`, up to and including phase `last` (every phase when `None`).
    fn check_window<K: GroupKind>(&self, last: Option<LifecyclePhase>) -> Result<()> {
        let open = match self.state {
            ModelState::Declaring => true,
            ModelState::Initializing(phase) => last.map_or(true, |last| phase <= last),
            _ => false,
        };
        if open {
            Ok(())
        } else {
            Err(ModelError::Lifecycle(format!(
                "{} declarations are closed in state {}",
                K::ENTITY,
                self.state
            )))
        }
    }

    fn check_objective_window(&self) -> Result<()> {
        match self.state {
            ModelState::Declaring | ModelState::Initializing(_) => Ok(()),
            state => Err(ModelError::Lifecycle(format!(
                "Objective cannot change in state {}",
                state
            ))),
        }
    }

    /// The expression belongs to this model and every variable it names is
    /// registered here.
    fn check_owned(&self, expression: &Expression) -> Result<()> {
        if expression.owner() != self.token {
            return Err(ModelError::ForeignExpression);
        }
        let vars = lock(&self.vars);
        for term in expression.terms() {
            if let Some(id) = term.var_identifier() {
                if !vars.contains(id) {
                    return Err(ModelError::ForeignVariable {
                        identifier: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
