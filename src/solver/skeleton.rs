// Skeleton adapter
// Records what the model pushes and replays a scripted solve outcome.
// Used wherever a real solver is not needed: tests, dry runs, persistence.

use crate::domain::{
    solver_service::{var_handle, BackendError, BackendResult, Handles, SolverBackend},
    CanonicalRow, Constraint, Objective, SolutionParams, Var,
};
use std::collections::BTreeMap;

/// Native model of the skeleton backend: a plain record of the matrix
#[derive(Debug, Clone, Default)]
pub struct SkeletonModel {
    identifier: String,
    columns: Vec<String>,
    rows: Vec<CanonicalRow>,
    objective: Option<Objective>,
}

impl SkeletonModel {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Variable identifiers in materialization order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SkeletonBackend {
    model: Option<SkeletonModel>,
    outcome: SolutionParams,
    results: BTreeMap<String, f64>,
}

impl SkeletonBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters every `compute` call reports.
    pub fn with_outcome(mut self, outcome: SolutionParams) -> Self {
        self.outcome = outcome;
        self
    }

    /// Variable values `extract_results` reports.
    pub fn with_results(mut self, results: BTreeMap<String, f64>) -> Self {
        self.results = results;
        self
    }

    fn model_mut(&mut self) -> BackendResult<&mut SkeletonModel> {
        self.model.as_mut().ok_or(BackendError::NotInitialized)
    }
}

impl SolverBackend for SkeletonBackend {
    type Model = SkeletonModel;
    /// Column index
    type Var = usize;
    /// Row index
    type Constraint = usize;

    fn name(&self) -> &str {
        "Skeleton"
    }

    fn backend_model(&self) -> Option<&SkeletonModel> {
        self.model.as_ref()
    }

    fn init_model(&mut self, identifier: &str) -> BackendResult<()> {
        self.model = Some(SkeletonModel {
            identifier: identifier.to_string(),
            ..SkeletonModel::default()
        });
        Ok(())
    }

    fn init_var(&mut self, var: &Var) -> BackendResult<usize> {
        let model = self.model_mut()?;
        model.columns.push(var.identifier().to_string());
        Ok(model.columns.len() - 1)
    }

    fn init_constraint(
        &mut self,
        _constraint: &Constraint,
        row: &CanonicalRow,
        vars: &Handles<usize>,
    ) -> BackendResult<usize> {
        for (var, _) in &row.terms {
            var_handle(vars, var)?;
        }
        let model = self.model_mut()?;
        model.rows.push(row.clone());
        Ok(model.rows.len() - 1)
    }

    fn init_objective(&mut self, objective: &Objective, vars: &Handles<usize>) -> BackendResult<()> {
        for var in objective.expression.var_contribution().keys() {
            var_handle(vars, var)?;
        }
        self.model_mut()?.objective = Some(objective.clone());
        Ok(())
    }

    fn compute(&mut self, _vars: &Handles<usize>) -> BackendResult<SolutionParams> {
        self.model_mut()?;
        Ok(self.outcome.clone())
    }

    fn extract_results(&mut self, vars: &Handles<usize>) -> BackendResult<BTreeMap<String, f64>> {
        Ok(self
            .results
            .iter()
            .filter(|(id, _)| vars.contains_key(*id))
            .map(|(id, value)| (id.clone(), *value))
            .collect())
    }
}
