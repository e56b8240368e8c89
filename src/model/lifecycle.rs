// Initialization phases, solve and result extraction

use super::registry::Registry;
use super::{exclusive, lock, Initializers, LifecyclePhase, Model, ModelState};
use crate::domain::{
    BackendError, ModelError, Result, SolutionParam, SolutionStatus, SolutionValue, SolverBackend,
};
use crate::group::{Group, GroupContext, GroupKind};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

fn backend_error(phase: &'static str) -> impl FnOnce(BackendError) -> ModelError {
    move |source| ModelError::Backend { phase, source }
}

impl<B: SolverBackend> Model<B> {
    /// Validates the declarations, then runs the seven phases in order:
    /// native model, constant groups, variable groups, variables, constraint
    /// groups, constraints and objective. Any failure leaves the model
    /// `Failed`.
    pub fn init(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.state != ModelState::Declaring {
            return Err(ModelError::Lifecycle(format!(
                "init() requires a declaring model, state is {}",
                self.state
            )));
        }
        self.ensure_valid()?;

        tracing::info!(
            component = "model",
            operation = "init",
            backend = self.backend.name(),
            "Initializing model"
        );
        let started = Instant::now();
        match self.run_phases() {
            Ok(()) => {
                self.state = ModelState::Initialized;
                tracing::info!(
                    component = "model",
                    operation = "init",
                    vars = self.var_handles.len(),
                    constraints = self.constraint_handles.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Model initialized"
                );
                Ok(())
            }
            Err(err) => {
                let phase = self.state;
                self.state = ModelState::Failed;
                tracing::error!(
                    component = "model",
                    operation = "init",
                    state = %phase,
                    error = %err,
                    "Model initialization failed"
                );
                Err(err)
            }
        }
    }

    fn run_phases(&mut self) -> Result<()> {
        self.init_model()?;
        self.init_constant_groups()?;
        self.init_var_groups()?;
        self.init_vars()?;
        self.init_constraint_groups()?;
        // initializers may have declared entities the first check never saw
        self.ensure_valid()?;
        self.init_constraints()?;
        self.init_obj_function_generator()
    }

    fn enter_phase(&mut self, phase: LifecyclePhase) {
        self.state = ModelState::Initializing(phase);
        tracing::info!(component = "model", phase = phase.name(), "Entering phase");
    }

    fn init_model(&mut self) -> Result<()> {
        self.enter_phase(LifecyclePhase::InitModel);
        self.backend
            .init_model(&self.identifier)
            .map_err(backend_error(LifecyclePhase::InitModel.name()))
    }

    fn init_constant_groups(&mut self) -> Result<()> {
        self.run_group_phase(
            LifecyclePhase::InitConstantGroups,
            |model| &mut model.constant_initializers,
            |model| &model.constants,
        )
    }

    fn init_var_groups(&mut self) -> Result<()> {
        self.run_group_phase(
            LifecyclePhase::InitVarGroups,
            |model| &mut model.var_initializers,
            |model| &model.vars,
        )
    }

    fn init_vars(&mut self) -> Result<()> {
        self.enter_phase(LifecyclePhase::InitVars);
        let vars = exclusive(&mut self.vars);
        for (identifier, var) in &vars.entities {
            let handle = self
                .backend
                .init_var(var)
                .map_err(backend_error(LifecyclePhase::InitVars.name()))?;
            self.var_handles.insert(identifier.clone(), handle);
        }
        tracing::debug!(
            component = "model",
            phase = LifecyclePhase::InitVars.name(),
            count = self.var_handles.len(),
            "Variables materialized"
        );
        Ok(())
    }

    fn init_constraint_groups(&mut self) -> Result<()> {
        self.run_group_phase(
            LifecyclePhase::InitConstraintGroups,
            |model| &mut model.constraint_initializers,
            |model| &model.constraints,
        )
    }

    fn init_constraints(&mut self) -> Result<()> {
        self.enter_phase(LifecyclePhase::InitConstraints);
        let constraints = exclusive(&mut self.constraints);
        for (identifier, constraint) in &constraints.entities {
            let row = constraint.canonical_row();
            let handle = self
                .backend
                .init_constraint(constraint, &row, &self.var_handles)
                .map_err(backend_error(LifecyclePhase::InitConstraints.name()))?;
            self.constraint_handles.insert(identifier.clone(), handle);
        }
        tracing::debug!(
            component = "model",
            phase = LifecyclePhase::InitConstraints.name(),
            count = self.constraint_handles.len(),
            "Constraints materialized"
        );
        Ok(())
    }

    fn init_obj_function_generator(&mut self) -> Result<()> {
        self.enter_phase(LifecyclePhase::InitObjective);
        if let Some(generator) = exclusive(&mut self.objective_generator).take() {
            let generated = (generator.generate)(self);
            let objective_type = generator.objective_type;
            *exclusive(&mut self.objective_generator) = Some(generator);
            self.set_objective(generated?, objective_type)?;
        }

        match exclusive(&mut self.objective).clone() {
            Some(objective) => self
                .backend
                .init_objective(&objective, &self.var_handles)
                .map_err(backend_error(LifecyclePhase::InitObjective.name())),
            None => {
                tracing::warn!(
                    component = "model",
                    phase = LifecyclePhase::InitObjective.name(),
                    "No objective function defined, backend objective left empty"
                );
                Ok(())
            }
        }
    }

    /// Runs every registered initializer of kind `K`, including those
    /// registered by other initializers while the phase is running.
    fn run_group_phase<E: Clone, K: GroupKind>(
        &mut self,
        phase: LifecyclePhase,
        initializers: fn(&mut Self) -> &mut Mutex<Initializers<B, K>>,
        registry: fn(&Self) -> &Mutex<Registry<E, K>>,
    ) -> Result<()> {
        self.enter_phase(phase);
        let mut done: Initializers<B, K> = BTreeMap::new();
        let result = loop {
            let pending = std::mem::take(exclusive(initializers(self)));
            if pending.is_empty() {
                break Ok(());
            }
            let groups = lock(registry(self)).groups.clone();
            let outcome = self.run_initializers(phase, &pending, &groups);
            done.extend(pending);
            if let Err(err) = outcome {
                break Err(err);
            }
        };
        exclusive(initializers(self)).extend(done);
        result
    }

    fn run_initializers<K: GroupKind>(
        &self,
        phase: LifecyclePhase,
        pending: &Initializers<B, K>,
        groups: &BTreeMap<String, Group<K>>,
    ) -> Result<()> {
        for (group_id, initializer) in pending {
            let Some(group) = groups.get(group_id) else {
                tracing::warn!(
                    component = "model",
                    phase = phase.name(),
                    group = %group_id,
                    "Initializer registered for a missing group, skipped"
                );
                continue;
            };
            tracing::debug!(
                component = "model",
                phase = phase.name(),
                group = %group_id,
                "Running group initializer"
            );
            initializer
                .run(&GroupContext::new(self, group))
                .inspect_err(|err| {
                    tracing::error!(
                        component = "model",
                        phase = phase.name(),
                        group = %group_id,
                        error = %err,
                        "Group initializer failed"
                    )
                })?;
        }
        Ok(())
    }

    /// Solves the initialized model and stores the backend's solution
    /// parameters. A missing status is reported as `Unknown`. Results of an
    /// earlier solve are dropped; a backend failure leaves the model `Failed`
    /// with no solution.
    pub fn compute_model(&mut self) -> Result<SolutionStatus> {
        let span = self.span.clone();
        let _enter = span.enter();

        if !matches!(self.state, ModelState::Initialized | ModelState::Solved) {
            return Err(ModelError::Lifecycle(format!(
                "compute_model() requires an initialized model, state is {}",
                self.state
            )));
        }

        tracing::info!(component = "model", operation = "compute_model", "Computing model");
        self.clear_solution();
        let params = match self.backend.compute(&self.var_handles) {
            Ok(params) => params,
            Err(err) => {
                self.state = ModelState::Failed;
                tracing::error!(
                    component = "model",
                    operation = "compute_model",
                    error = %err,
                    "Solver failed"
                );
                return Err(backend_error("compute_model")(err));
            }
        };

        let status = match params.get(&SolutionParam::Status) {
            Some(SolutionValue::Status(status)) => *status,
            _ => SolutionStatus::Unknown,
        };
        *exclusive(&mut self.solution) = params;
        self.state = ModelState::Solved;
        tracing::info!(
            component = "model",
            operation = "compute_model",
            status = %status,
            "Model computed"
        );
        Ok(status)
    }

    /// Drops the parameters and variable values of the previous solve.
    fn clear_solution(&mut self) {
        exclusive(&mut self.solution).clear();
        for var in exclusive(&mut self.vars).entities.values_mut() {
            var.clear_result();
        }
    }

    /// Copies every variable value the backend reports onto the model.
    pub fn extract_results(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.state != ModelState::Solved {
            return Err(ModelError::Lifecycle(format!(
                "extract_results() requires a solved model, state is {}",
                self.state
            )));
        }

        let values = self
            .backend
            .extract_results(&self.var_handles)
            .map_err(backend_error("extract_results"))?;
        let vars = exclusive(&mut self.vars);
        for (identifier, value) in &values {
            match vars.get_mut(identifier) {
                Ok(var) => var.set_result(*value),
                Err(_) => tracing::warn!(
                    component = "model",
                    operation = "extract_results",
                    var = %identifier,
                    "Backend reported a value for an unknown variable"
                ),
            }
        }
        tracing::debug!(
            component = "model",
            operation = "extract_results",
            count = values.len(),
            "Results extracted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObjectiveType, Operator, VarType};
    use crate::group::{initializer, ConstraintKind, PrefixNameGenerator, VarKind};
    use crate::prefixes;
    use crate::solver::SkeletonBackend;
    use std::sync::Arc;

    fn knapsack() -> Model<SkeletonBackend> {
        let model = Model::new("K", SkeletonBackend::new());
        let x = model.create_var("x", VarType::Boolean, 0.0, 1.0).unwrap();
        let y = model.create_var("y", VarType::Boolean, 0.0, 1.0).unwrap();
        let mut lhs = model.expression();
        lhs.add_var(&x).unwrap().add_scaled(2.0, &y).unwrap();
        let mut rhs = model.expression();
        rhs.add_constant(2.0);
        model
            .add_constraint("cap", lhs, Operator::LessEqual, rhs)
            .unwrap();
        model
    }

    #[test]
    fn init_materializes_vars_then_constraints() {
        let mut model = knapsack();
        model.init().unwrap();
        assert_eq!(model.state(), ModelState::Initialized);
        assert!(model.var_handle("x").is_some());
        assert!(model.constraint_handle("cap").is_some());
        let native = model.backend_model().unwrap();
        assert_eq!(native.identifier(), "K");
        assert_eq!(native.rows().len(), 1);
    }

    #[test]
    fn second_init_is_rejected() {
        let mut model = knapsack();
        model.init().unwrap();
        assert!(matches!(model.init(), Err(ModelError::Lifecycle(_))));
    }

    #[test]
    fn compute_requires_init_and_extract_requires_compute() {
        let mut model = knapsack();
        assert!(matches!(model.compute_model(), Err(ModelError::Lifecycle(_))));
        model.init().unwrap();
        assert!(matches!(model.extract_results(), Err(ModelError::Lifecycle(_))));
        assert_eq!(model.compute_model().unwrap(), SolutionStatus::Unknown);
        model.extract_results().unwrap();
    }

    #[test]
    fn declarations_close_after_init() {
        let mut model = knapsack();
        model.init().unwrap();
        assert!(matches!(
            model.create_var("z", VarType::Double, 0.0, 1.0),
            Err(ModelError::Lifecycle(_))
        ));
        assert!(matches!(
            model.create_constant("k", 1.0),
            Err(ModelError::Lifecycle(_))
        ));
    }

    #[test]
    fn group_initializers_generate_members() {
        let mut model = Model::new("G", SkeletonBackend::new());
        model
            .create_var_group_with(
                "Items",
                "one boolean per item",
                Some(Arc::new(PrefixNameGenerator::new("I", 1))),
                Some(initializer(|ctx| {
                    for item in 0..3 {
                        let name = ctx.name(&prefixes![item])?;
                        ctx.model()
                            .create_var_in(&name, VarType::Boolean, 0.0, 1.0, ctx.group())?;
                    }
                    Ok(())
                })),
            )
            .unwrap();
        model
            .create_constraint_group_with(
                "Budget",
                "",
                None,
                Some(initializer(|ctx| {
                    let model = ctx.model();
                    let mut lhs = model.expression();
                    for id in model.var_ids_in("Items")? {
                        lhs.add_var(&model.var(&id)?)?;
                    }
                    let mut rhs = model.expression();
                    rhs.add_constant(2.0);
                    model.add_constraint_in("budget", lhs, Operator::LessEqual, rhs, ctx.group())?;
                    Ok(())
                })),
            )
            .unwrap();

        model.init().unwrap();
        assert_eq!(model.var_ids_in("Items").unwrap().len(), 3);
        assert!(model.var_handle("I-/-2").is_some());
        let row = &model.backend_model().unwrap().rows()[0];
        assert_eq!(row.terms.len(), 3);
    }

    #[test]
    fn late_variable_declaration_from_constraint_phase_fails() {
        let mut model = Model::new("Late", SkeletonBackend::new());
        model
            .create_constraint_group_with(
                "C",
                "",
                None,
                Some(initializer::<SkeletonBackend, ConstraintKind, _>(|ctx| {
                    ctx.model().create_var("late", VarType::Double, 0.0, 1.0)?;
                    Ok(())
                })),
            )
            .unwrap();
        assert!(matches!(model.init(), Err(ModelError::Lifecycle(_))));
        assert_eq!(model.state(), ModelState::Failed);
        assert!(matches!(model.init(), Err(ModelError::Lifecycle(_))));
    }

    #[test]
    fn initializer_errors_fail_the_model() {
        let mut model = Model::new("Broken", SkeletonBackend::new());
        model
            .create_var_group_with(
                "Unnamed",
                "",
                None,
                Some(initializer::<SkeletonBackend, VarKind, _>(|ctx| {
                    ctx.name(&prefixes![1])?;
                    Ok(())
                })),
            )
            .unwrap();
        assert!(matches!(model.init(), Err(ModelError::Name(_))));
        assert_eq!(model.state(), ModelState::Failed);
    }

    #[test]
    fn objective_generator_runs_last() {
        let mut model = knapsack();
        model
            .attach_objective_generator(ObjectiveType::Maximize, |model| {
                let mut expr = model.expression();
                for var in model.vars() {
                    expr.add_var(&var)?;
                }
                Ok(expr)
            })
            .unwrap();
        model.init().unwrap();
        let objective = model.objective().unwrap();
        assert_eq!(objective.objective_type, ObjectiveType::Maximize);
        assert_eq!(objective.expression.len(), 2);
        assert!(model.backend_model().unwrap().objective().is_some());
    }

    #[test]
    fn missing_objective_is_not_an_error() {
        let mut model = knapsack();
        model.init().unwrap();
        assert!(model.backend_model().unwrap().objective().is_none());
    }

    #[test]
    fn invalid_model_does_not_start() {
        let mut model = Model::new("Bad", SkeletonBackend::new());
        model
            .create_var("b", VarType::Boolean, 2.0, 3.0)
            .unwrap();
        assert!(matches!(model.init(), Err(ModelError::Invalid(_))));
        assert_eq!(model.state(), ModelState::Declaring);
    }
}
