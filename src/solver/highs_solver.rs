// HiGHS Solver Adapter
// Buffers columns and rows as the model materializes them, then builds a
// HiGHS RowProblem on compute. Column handles are indices into the buffer.

use crate::domain::{
    models::{CanonicalRow, Constraint, Objective, SolverConfig, Var},
    solver_service::{var_handle, BackendError, BackendResult, Handles, SolverBackend},
    value_objects::{ObjectiveType, Operator, SolutionParam, SolutionParams, SolutionStatus, SolutionValue},
};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct HighsColumn {
    pub identifier: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighsRow {
    pub identifier: String,
    pub factors: Vec<(usize, f64)>,
    pub operator: Operator,
    pub rhs: f64,
}

/// Buffered HiGHS model
#[derive(Debug, Clone, Default)]
pub struct HighsModel {
    identifier: String,
    columns: Vec<HighsColumn>,
    rows: Vec<HighsRow>,
    costs: Vec<f64>,
    offset: f64,
    sense: Option<ObjectiveType>,
    solution: Option<Vec<f64>>,
}

impl HighsModel {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn columns(&self) -> &[HighsColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[HighsRow] {
        &self.rows
    }
}

pub struct HighsBackend {
    config: SolverConfig,
    model: Option<HighsModel>,
}

impl HighsBackend {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    fn model_mut(&mut self) -> BackendResult<&mut HighsModel> {
        self.model.as_mut().ok_or(BackendError::NotInitialized)
    }
}

impl Default for HighsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for HighsBackend {
    type Model = HighsModel;
    type Var = usize;
    type Constraint = usize;

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn backend_model(&self) -> Option<&HighsModel> {
        self.model.as_ref()
    }

    fn init_model(&mut self, identifier: &str) -> BackendResult<()> {
        self.model = Some(HighsModel {
            identifier: identifier.to_string(),
            ..HighsModel::default()
        });
        Ok(())
    }

    fn init_var(&mut self, var: &Var) -> BackendResult<usize> {
        let model = self.model_mut()?;
        model.columns.push(HighsColumn {
            identifier: var.identifier().to_string(),
            lower: var.lower_bound(),
            upper: var.upper_bound(),
            integer: var.var_type().is_integral(),
        });
        model.costs.push(0.0);
        Ok(model.columns.len() - 1)
    }

    fn init_constraint(
        &mut self,
        constraint: &Constraint,
        row: &CanonicalRow,
        vars: &Handles<usize>,
    ) -> BackendResult<usize> {
        let factors = row
            .terms
            .iter()
            .map(|(var, coefficient)| Ok((*var_handle(vars, var)?, *coefficient)))
            .collect::<BackendResult<Vec<_>>>()?;
        let model = self.model_mut()?;
        model.rows.push(HighsRow {
            identifier: constraint.identifier().to_string(),
            factors,
            operator: row.operator,
            rhs: row.rhs,
        });
        Ok(model.rows.len() - 1)
    }

    fn init_objective(&mut self, objective: &Objective, vars: &Handles<usize>) -> BackendResult<()> {
        let reduced = objective.expression.reduce();
        let mut costs = Vec::new();
        for (var, coefficient) in reduced.var_contribution() {
            costs.push((*var_handle(vars, &var)?, coefficient));
        }
        let model = self.model_mut()?;
        model.costs.iter_mut().for_each(|c| *c = 0.0);
        for (column, coefficient) in costs {
            if let Some(cost) = model.costs.get_mut(column) {
                *cost += coefficient;
            }
        }
        model.offset = reduced.constant_contribution();
        model.sense = Some(objective.objective_type);
        Ok(())
    }

    fn compute(&mut self, _vars: &Handles<usize>) -> BackendResult<SolutionParams> {
        let config = self.config.clone();
        let model = self.model_mut()?;
        let start_time = Instant::now();

        let mut pb = RowProblem::default();
        let cols: Vec<_> = model
            .columns
            .iter()
            .zip(&model.costs)
            .map(|(column, &cost)| {
                if column.integer {
                    pb.add_integer_column(cost, column.lower..=column.upper)
                } else {
                    pb.add_column(cost, column.lower..=column.upper)
                }
            })
            .collect();

        for row in &model.rows {
            let factors = row
                .factors
                .iter()
                .map(|&(index, coefficient)| {
                    cols.get(index).map(|col| (*col, coefficient)).ok_or_else(|| {
                        BackendError::ExecutionFailed(format!(
                            "Row {} references unknown column {}",
                            row.identifier, index
                        ))
                    })
                })
                .collect::<BackendResult<Vec<_>>>()?;
            match row.operator {
                Operator::LessEqual => pb.add_row(..=row.rhs, &factors),
                Operator::GreaterEqual => pb.add_row(row.rhs.., &factors),
                Operator::Equal => pb.add_row(row.rhs..=row.rhs, &factors),
            }
        }

        let sense = match model.sense {
            Some(ObjectiveType::Maximize) => Sense::Maximise,
            _ => Sense::Minimise,
        };
        let mut solver = pb.optimise(sense);
        solver.set_option("output_flag", config.verbose);
        if let Some(seconds) = config.time_limit {
            solver.set_option("time_limit", seconds);
        }
        if let Some(gap) = config.gap_tolerance {
            solver.set_option("mip_rel_gap", gap);
        }

        let solved = solver.try_solve().map_err(|status| {
            BackendError::ExecutionFailed(format!("HiGHS returned status: {:?}", status))
        })?;
        let elapsed = start_time.elapsed().as_millis() as u64;

        let status = match solved.status() {
            HighsModelStatus::Optimal => SolutionStatus::Optimal,
            HighsModelStatus::Infeasible => SolutionStatus::Infeasible,
            HighsModelStatus::Unbounded => SolutionStatus::Unbounded,
            HighsModelStatus::UnboundedOrInfeasible => SolutionStatus::InfeasibleOrUnbounded,
            HighsModelStatus::ReachedTimeLimit => SolutionStatus::TimeLimit,
            HighsModelStatus::ObjectiveBound | HighsModelStatus::ObjectiveTarget => {
                SolutionStatus::Cutoff
            }
            other => {
                tracing::warn!(
                    component = "solver",
                    backend = "HiGHS",
                    status = ?other,
                    "Unmapped HiGHS model status"
                );
                SolutionStatus::Unknown
            }
        };

        let mut params = SolutionParams::from([
            (SolutionParam::Status, SolutionValue::Status(status)),
            (SolutionParam::Time, SolutionValue::Millis(elapsed)),
        ]);

        let values = solved.get_solution().columns().to_vec();
        if matches!(status, SolutionStatus::Optimal | SolutionStatus::TimeLimit)
            && values.len() == model.columns.len()
        {
            let objective = model.offset
                + model
                    .costs
                    .iter()
                    .zip(&values)
                    .map(|(cost, value)| cost * value)
                    .sum::<f64>();
            // the highs binding exposes no MIP gap, so none is reported
            params.insert(SolutionParam::Objective, SolutionValue::Float(objective));
            model.solution = Some(values);
        } else {
            model.solution = None;
        }

        tracing::info!(
            component = "solver",
            backend = "HiGHS",
            model = %model.identifier,
            status = %status,
            elapsed_ms = elapsed,
            "Solve finished"
        );
        Ok(params)
    }

    fn extract_results(&mut self, vars: &Handles<usize>) -> BackendResult<BTreeMap<String, f64>> {
        let model = self.model_mut()?;
        let Some(solution) = &model.solution else {
            return Ok(BTreeMap::new());
        };
        Ok(vars
            .iter()
            .filter_map(|(id, &column)| solution.get(column).map(|v| (id.clone(), *v)))
            .collect())
    }
}
