// Mappers: Convert between serializable DTOs and the model
// DTOs carry identifiers only; expressions are rebuilt against the target
// model so restored terms belong to it.

use crate::domain::{
    models::{Constant, Constraint, Var},
    value_objects::{ObjectiveType, Operator, SolutionParams, VarType},
    Expression, ModelError, Result, SolverBackend, Term,
};
use crate::group::{ConstantGroup, ConstraintGroup, VarGroup};
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDto {
    pub coefficient: f64,
    /// Variable identifier; absent for a constant term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionDto {
    pub terms: Vec<TermDto>,
}

/// Infinite bounds are stored as `None`, JSON has no infinity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarDto {
    pub identifier: String,
    pub var_type: VarType,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDto {
    pub identifier: String,
    pub lhs: ExpressionDto,
    pub operator: Operator,
    pub rhs: ExpressionDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantDto {
    pub identifier: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarGroupDto {
    pub identifier: String,
    pub description: String,
    pub variables: Vec<VarDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintGroupDto {
    pub identifier: String,
    pub description: String,
    pub constraints: Vec<ConstraintDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantGroupDto {
    pub identifier: String,
    pub description: String,
    pub constants: Vec<ConstantDto>,
}

/// Model header: group identifiers, objective and solution parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDto {
    pub identifier: String,
    pub variable_groups: BTreeSet<String>,
    pub constraint_groups: BTreeSet<String>,
    pub constant_groups: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_fn: Option<ExpressionDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_type: Option<ObjectiveType>,
    #[serde(default)]
    pub solution_params: SolutionParams,
}

fn finite(bound: f64) -> Option<f64> {
    bound.is_finite().then_some(bound)
}

/// Convert an expression to its reduced DTO form
pub fn domain_to_dto_expression(expression: &Expression) -> ExpressionDto {
    let mut terms: Vec<TermDto> = expression
        .reduce()
        .terms()
        .iter()
        .map(|term| TermDto {
            coefficient: term.coefficient(),
            var: term.var_identifier().map(str::to_string),
        })
        .collect();
    // constants cancelling to zero still leave a side on the constraint
    if terms.is_empty() && !expression.is_empty() {
        terms.push(TermDto {
            coefficient: 0.0,
            var: None,
        });
    }
    ExpressionDto { terms }
}

/// Rebuild an expression on `model`; every variable must already exist there
pub fn dto_to_domain_expression<B: SolverBackend>(
    model: &Model<B>,
    dto: &ExpressionDto,
) -> Result<Expression> {
    let mut expression = model.expression();
    for term in &dto.terms {
        match &term.var {
            Some(id) => {
                let var = model.var(id)?;
                expression.add_term(Term::var(term.coefficient, &var))?;
            }
            None => {
                expression.add_constant(term.coefficient);
            }
        }
    }
    Ok(expression)
}

pub fn domain_to_dto_var(var: &Var) -> VarDto {
    VarDto {
        identifier: var.identifier().to_string(),
        var_type: var.var_type(),
        lower_bound: finite(var.lower_bound()),
        upper_bound: finite(var.upper_bound()),
        result: var.result(),
    }
}

pub fn domain_to_dto_constraint(constraint: &Constraint) -> ConstraintDto {
    ConstraintDto {
        identifier: constraint.identifier().to_string(),
        lhs: domain_to_dto_expression(constraint.lhs()),
        operator: constraint.operator(),
        rhs: domain_to_dto_expression(constraint.rhs()),
    }
}

pub fn domain_to_dto_constant(constant: &Constant) -> ConstantDto {
    ConstantDto {
        identifier: constant.identifier().to_string(),
        value: constant.value(),
    }
}

/// Convert the model header
pub fn model_to_dto<B: SolverBackend>(model: &Model<B>) -> ModelDto {
    let objective = model.objective().ok();
    ModelDto {
        identifier: model.identifier().to_string(),
        variable_groups: model.var_group_ids().into_iter().collect(),
        constraint_groups: model.constraint_group_ids().into_iter().collect(),
        constant_groups: model.constant_group_ids().into_iter().collect(),
        objective_fn: objective
            .as_ref()
            .map(|o| domain_to_dto_expression(&o.expression)),
        obj_type: objective.map(|o| o.objective_type),
        solution_params: model.solution_params(),
    }
}

pub fn var_group_to_dto<B: SolverBackend>(model: &Model<B>, group: &VarGroup) -> Result<VarGroupDto> {
    let variables = model
        .var_ids_in(group.identifier())?
        .iter()
        .map(|id| model.var(id).map(|var| domain_to_dto_var(&var)))
        .collect::<Result<Vec<_>>>()?;
    Ok(VarGroupDto {
        identifier: group.identifier().to_string(),
        description: group.description().to_string(),
        variables,
    })
}

pub fn constraint_group_to_dto<B: SolverBackend>(
    model: &Model<B>,
    group: &ConstraintGroup,
) -> Result<ConstraintGroupDto> {
    let constraints = model
        .constraint_ids_in(group.identifier())?
        .iter()
        .map(|id| model.constraint(id).map(|c| domain_to_dto_constraint(&c)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ConstraintGroupDto {
        identifier: group.identifier().to_string(),
        description: group.description().to_string(),
        constraints,
    })
}

pub fn constant_group_to_dto<B: SolverBackend>(
    model: &Model<B>,
    group: &ConstantGroup,
) -> Result<ConstantGroupDto> {
    let constants = model
        .constant_ids_in(group.identifier())?
        .iter()
        .map(|id| model.constant(id).map(|c| domain_to_dto_constant(&c)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ConstantGroupDto {
        identifier: group.identifier().to_string(),
        description: group.description().to_string(),
        constants,
    })
}

fn is_unknown_group(err: &ModelError) -> bool {
    matches!(err, ModelError::UnknownGroup { .. })
}

/// Declare the group's variables on `model`, reusing an existing group
pub fn restore_var_group<B: SolverBackend>(model: &Model<B>, dto: &VarGroupDto) -> Result<()> {
    let group = match model.var_group(&dto.identifier) {
        Err(err) if is_unknown_group(&err) => {
            model.create_var_group(&dto.identifier, &dto.description)?
        }
        other => other?,
    };
    for var in &dto.variables {
        model.create_var_in(
            &var.identifier,
            var.var_type,
            var.lower_bound.unwrap_or(f64::NEG_INFINITY),
            var.upper_bound.unwrap_or(f64::INFINITY),
            &group,
        )?;
        if let Some(result) = var.result {
            model.restore_var_result(&var.identifier, result)?;
        }
    }
    Ok(())
}

pub fn restore_constraint_group<B: SolverBackend>(
    model: &Model<B>,
    dto: &ConstraintGroupDto,
) -> Result<()> {
    let group = match model.constraint_group(&dto.identifier) {
        Err(err) if is_unknown_group(&err) => {
            model.create_constraint_group(&dto.identifier, &dto.description)?
        }
        other => other?,
    };
    for constraint in &dto.constraints {
        let lhs = dto_to_domain_expression(model, &constraint.lhs)?;
        let rhs = dto_to_domain_expression(model, &constraint.rhs)?;
        model.add_constraint_in(&constraint.identifier, lhs, constraint.operator, rhs, &group)?;
    }
    Ok(())
}

pub fn restore_constant_group<B: SolverBackend>(
    model: &Model<B>,
    dto: &ConstantGroupDto,
) -> Result<()> {
    let group = match model.constant_group(&dto.identifier) {
        Err(err) if is_unknown_group(&err) => {
            model.create_constant_group(&dto.identifier, &dto.description)?
        }
        other => other?,
    };
    for constant in &dto.constants {
        model.create_constant_in(&constant.identifier, constant.value, &group)?;
    }
    Ok(())
}

/// Apply the objective and solution parameters of a stored header. Runs
/// after every group was restored so objective variables resolve.
pub fn restore_model_header<B: SolverBackend>(model: &Model<B>, dto: &ModelDto) -> Result<()> {
    match (&dto.objective_fn, dto.obj_type) {
        (Some(expression), Some(objective_type)) => {
            let expression = dto_to_domain_expression(model, expression)?;
            model.set_objective(expression, objective_type)?;
        }
        (Some(_), None) => tracing::warn!(
            component = "mappers",
            model = %dto.identifier,
            "Stored objective has no direction, skipped"
        ),
        _ => {}
    }
    model.restore_solution(dto.solution_params.clone());
    Ok(())
}

/// A whole model as one serializable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    pub model: ModelDto,
    pub var_groups: Vec<VarGroupDto>,
    pub constraint_groups: Vec<ConstraintGroupDto>,
    pub constant_groups: Vec<ConstantGroupDto>,
}

impl ModelDocument {
    pub fn capture<B: SolverBackend>(model: &Model<B>) -> Result<Self> {
        let var_groups = model
            .var_group_ids()
            .iter()
            .map(|id| var_group_to_dto(model, &model.var_group(id)?))
            .collect::<Result<Vec<_>>>()?;
        let constraint_groups = model
            .constraint_group_ids()
            .iter()
            .map(|id| constraint_group_to_dto(model, &model.constraint_group(id)?))
            .collect::<Result<Vec<_>>>()?;
        let constant_groups = model
            .constant_group_ids()
            .iter()
            .map(|id| constant_group_to_dto(model, &model.constant_group(id)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            model: model_to_dto(model),
            var_groups,
            constraint_groups,
            constant_groups,
        })
    }

    /// Declares everything in the document on `model`: constants, then
    /// variables, constraints, objective and solution parameters.
    pub fn restore<B: SolverBackend>(&self, model: &Model<B>) -> Result<()> {
        for group in &self.constant_groups {
            restore_constant_group(model, group)?;
        }
        for group in &self.var_groups {
            restore_var_group(model, group)?;
        }
        for group in &self.constraint_groups {
            restore_constraint_group(model, group)?;
        }
        restore_model_header(model, &self.model)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
