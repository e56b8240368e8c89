// COIN-OR CBC Solver Adapter
// Goes through good_lp: variables are added to a ProblemVariables set as the
// model materializes them, constraints are built eagerly and the problem is
// assembled on compute. good_lp consumes the variable set, so a CBC model
// can be solved once.

use crate::domain::{
    models::{CanonicalRow, Constraint, Objective, SolverConfig, Var},
    solver_service::{var_handle, BackendError, BackendResult, Handles, SolverBackend},
    value_objects::{ObjectiveType, Operator, SolutionParam, SolutionParams, SolutionStatus, SolutionValue},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ProblemVariables, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// good_lp problem under construction
pub struct CbcModel {
    identifier: String,
    variables: Option<ProblemVariables>,
    constraints: Vec<good_lp::Constraint>,
    objective: Option<(Expression, ObjectiveType)>,
    solution: Option<BTreeMap<String, f64>>,
}

impl CbcModel {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the variable set was already consumed by a solve.
    pub fn is_consumed(&self) -> bool {
        self.variables.is_none()
    }
}

pub struct CbcBackend {
    config: SolverConfig,
    model: Option<CbcModel>,
}

impl CbcBackend {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    fn model_mut(&mut self) -> BackendResult<&mut CbcModel> {
        self.model.as_mut().ok_or(BackendError::NotInitialized)
    }
}

impl Default for CbcBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn linear(terms: &[(String, f64)], vars: &Handles<GoodLpVariable>) -> BackendResult<Expression> {
    let mut expr: Expression = 0.into();
    for (var, coefficient) in terms {
        expr += *coefficient * *var_handle(vars, var)?;
    }
    Ok(expr)
}

impl SolverBackend for CbcBackend {
    type Model = CbcModel;
    type Var = GoodLpVariable;
    type Constraint = usize;

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn backend_model(&self) -> Option<&CbcModel> {
        self.model.as_ref()
    }

    fn init_model(&mut self, identifier: &str) -> BackendResult<()> {
        self.model = Some(CbcModel {
            identifier: identifier.to_string(),
            variables: Some(variables!()),
            constraints: Vec::new(),
            objective: None,
            solution: None,
        });
        Ok(())
    }

    fn init_var(&mut self, var: &Var) -> BackendResult<GoodLpVariable> {
        let model = self.model_mut()?;
        let vars = model.variables.as_mut().ok_or_else(|| {
            BackendError::Unsupported("variables added after the CBC model was solved".into())
        })?;
        let definition = variable().min(var.lower_bound()).max(var.upper_bound());
        let definition = if var.var_type().is_integral() {
            definition.integer()
        } else {
            definition
        };
        Ok(vars.add(definition))
    }

    fn init_constraint(
        &mut self,
        _constraint: &Constraint,
        row: &CanonicalRow,
        vars: &Handles<GoodLpVariable>,
    ) -> BackendResult<usize> {
        let lhs = linear(&row.terms, vars)?;
        let built = match row.operator {
            Operator::LessEqual => lhs.leq(row.rhs),
            Operator::GreaterEqual => lhs.geq(row.rhs),
            Operator::Equal => lhs.eq(row.rhs),
        };
        let model = self.model_mut()?;
        model.constraints.push(built);
        Ok(model.constraints.len() - 1)
    }

    fn init_objective(
        &mut self,
        objective: &Objective,
        vars: &Handles<GoodLpVariable>,
    ) -> BackendResult<()> {
        let reduced = objective.expression.reduce();
        let terms: Vec<(String, f64)> = reduced.var_contribution().into_iter().collect();
        let expr = linear(&terms, vars)? + reduced.constant_contribution();
        self.model_mut()?.objective = Some((expr, objective.objective_type));
        Ok(())
    }

    fn compute(&mut self, vars: &Handles<GoodLpVariable>) -> BackendResult<SolutionParams> {
        let config = self.config.clone();
        let model = self.model_mut()?;
        let problem_vars = model.variables.take().ok_or_else(|| {
            BackendError::Unsupported("a CBC model can only be computed once".into())
        })?;
        let (objective, objective_type) = model
            .objective
            .clone()
            .unwrap_or_else(|| (0.into(), ObjectiveType::Minimize));
        let start_time = Instant::now();

        let mut problem = match objective_type {
            ObjectiveType::Maximize => problem_vars.maximise(objective.clone()),
            ObjectiveType::Minimize => problem_vars.minimise(objective.clone()),
        }
        .using(coin_cbc::coin_cbc);
        problem.set_parameter("logLevel", if config.verbose { "1" } else { "0" });
        if let Some(seconds) = config.time_limit {
            problem.set_parameter("seconds", &seconds.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            problem.set_parameter("ratioGap", &gap.to_string());
        }
        for constraint in model.constraints.drain(..) {
            problem = problem.with(constraint);
        }

        let result = problem.solve();
        let elapsed = start_time.elapsed();
        let mut params = SolutionParams::from([(
            SolutionParam::Time,
            SolutionValue::Millis(elapsed.as_millis() as u64),
        )]);

        let status = match result {
            Ok(solution) => {
                let values: BTreeMap<String, f64> = vars
                    .iter()
                    .map(|(id, &var)| (id.clone(), solution.value(var)))
                    .collect();
                params.insert(
                    SolutionParam::Objective,
                    SolutionValue::Float(solution.eval(objective)),
                );
                model.solution = Some(values);
                // CBC returns its incumbent when the time limit stops it;
                // good_lp does not expose the gap, so none is reported
                match config.time_limit {
                    Some(limit) if elapsed.as_secs_f64() >= limit => SolutionStatus::TimeLimit,
                    _ => SolutionStatus::Optimal,
                }
            }
            Err(ResolutionError::Infeasible) => SolutionStatus::Infeasible,
            Err(ResolutionError::Unbounded) => SolutionStatus::Unbounded,
            Err(e) => return Err(BackendError::ExecutionFailed(format!("{:?}", e))),
        };
        params.insert(SolutionParam::Status, SolutionValue::Status(status));

        tracing::info!(
            component = "solver",
            backend = "COIN-OR CBC",
            model = %model.identifier,
            status = %status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Solve finished"
        );
        Ok(params)
    }

    fn extract_results(
        &mut self,
        vars: &Handles<GoodLpVariable>,
    ) -> BackendResult<BTreeMap<String, f64>> {
        let model = self.model_mut()?;
        let Some(solution) = &model.solution else {
            return Ok(BTreeMap::new());
        };
        Ok(vars
            .keys()
            .filter_map(|id| solution.get(id).map(|v| (id.clone(), *v)))
            .collect())
    }
}
