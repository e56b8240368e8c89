// Typed access to the solution parameters and variable results

use super::{lock, Model};
use crate::domain::{
    ModelError, Result, SolutionParam, SolutionParams, SolutionStatus, SolutionValue,
    SolverBackend,
};
use std::collections::BTreeMap;
use std::time::Duration;

fn wrong_type(param: SolutionParam, found: &SolutionValue) -> ModelError {
    ModelError::SolutionParamType {
        param,
        expected: param.value_type(),
        found: found.type_name(),
    }
}

impl<B: SolverBackend> Model<B> {
    /// Snapshot of every parameter reported by the last solve.
    pub fn solution_params(&self) -> SolutionParams {
        lock(&self.solution).clone()
    }

    pub fn solution_param(&self, param: SolutionParam) -> Result<SolutionValue> {
        lock(&self.solution)
            .get(&param)
            .copied()
            .ok_or(ModelError::MissingSolutionParam(param))
    }

    pub fn solution_status(&self) -> Result<SolutionStatus> {
        match self.solution_param(SolutionParam::Status)? {
            SolutionValue::Status(status) => Ok(status),
            other => Err(wrong_type(SolutionParam::Status, &other)),
        }
    }

    pub fn objective_value(&self) -> Result<f64> {
        self.float_param(SolutionParam::Objective)
    }

    pub fn mip_gap(&self) -> Result<f64> {
        self.float_param(SolutionParam::MipGap)
    }

    /// Wall-clock solve time reported by the backend.
    pub fn computation_time(&self) -> Result<Duration> {
        match self.solution_param(SolutionParam::Time)? {
            SolutionValue::Millis(ms) => Ok(Duration::from_millis(ms)),
            other => Err(wrong_type(SolutionParam::Time, &other)),
        }
    }

    /// Extracted value of variable `identifier`, `None` before extraction.
    pub fn var_result(&self, identifier: &str) -> Result<Option<f64>> {
        Ok(self.var(identifier)?.result())
    }

    /// Values of the extracted results keyed by variable, skipping variables
    /// without one.
    pub fn results(&self) -> BTreeMap<String, f64> {
        lock(&self.vars)
            .entities
            .iter()
            .filter_map(|(id, var)| var.result().map(|value| (id.clone(), value)))
            .collect()
    }

    fn float_param(&self, param: SolutionParam) -> Result<f64> {
        match self.solution_param(param)? {
            SolutionValue::Float(value) => Ok(value),
            other => Err(wrong_type(param, &other)),
        }
    }

    /// Replaces the stored parameters; used when a model is restored.
    pub(crate) fn restore_solution(&self, params: SolutionParams) {
        *lock(&self.solution) = params;
    }

    pub(crate) fn restore_var_result(&self, identifier: &str, value: f64) -> Result<()> {
        lock(&self.vars).get_mut(identifier)?.set_result(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VarType;
    use crate::solver::SkeletonBackend;
    use approx::assert_relative_eq;

    fn solved(outcome: SolutionParams) -> Model<SkeletonBackend> {
        let mut model = Model::new(
            "S",
            SkeletonBackend::new()
                .with_outcome(outcome)
                .with_results(BTreeMap::from([("x".to_string(), 1.0)])),
        );
        model.create_var("x", VarType::Integer, 0.0, 5.0).unwrap();
        model.init().unwrap();
        model.compute_model().unwrap();
        model
    }

    #[test]
    fn accessors_fail_before_solve() {
        let model = Model::new("S", SkeletonBackend::new());
        assert!(matches!(
            model.solution_status(),
            Err(ModelError::MissingSolutionParam(SolutionParam::Status))
        ));
        assert!(model.objective_value().is_err());
        assert!(model.solution_params().is_empty());
    }

    #[test]
    fn typed_accessors_read_the_outcome() {
        let model = solved(SolutionParams::from([
            (SolutionParam::Status, SolutionValue::Status(SolutionStatus::Optimal)),
            (SolutionParam::Objective, SolutionValue::Float(12.5)),
            (SolutionParam::MipGap, SolutionValue::Float(0.0)),
            (SolutionParam::Time, SolutionValue::Millis(40)),
        ]));
        assert_eq!(model.solution_status().unwrap(), SolutionStatus::Optimal);
        assert_relative_eq!(model.objective_value().unwrap(), 12.5);
        assert_relative_eq!(model.mip_gap().unwrap(), 0.0);
        assert_eq!(model.computation_time().unwrap(), Duration::from_millis(40));
    }

    #[test]
    fn infeasible_solve_has_no_objective() {
        let model = solved(SolutionParams::from([(
            SolutionParam::Status,
            SolutionValue::Status(SolutionStatus::Infeasible),
        )]));
        assert!(model.solution_status().unwrap().is_infeasible());
        assert!(matches!(
            model.objective_value(),
            Err(ModelError::MissingSolutionParam(SolutionParam::Objective))
        ));
    }

    #[test]
    fn wrongly_typed_parameter_is_reported() {
        let model = solved(SolutionParams::from([(
            SolutionParam::Objective,
            SolutionValue::Millis(3),
        )]));
        assert!(matches!(
            model.objective_value(),
            Err(ModelError::SolutionParamType {
                param: SolutionParam::Objective,
                ..
            })
        ));
    }

    #[test]
    fn results_appear_after_extraction() {
        let mut model = solved(SolutionParams::new());
        assert_eq!(model.var_result("x").unwrap(), None);
        assert!(model.results().is_empty());
        model.extract_results().unwrap();
        assert_eq!(model.var_result("x").unwrap(), Some(1.0));
        assert_eq!(model.var("x").unwrap().result(), Some(1.0));
    }
}
