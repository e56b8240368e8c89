// Structural checks run before and during init

use super::{lock, Model};
use crate::domain::{Expression, ModelError, Result, SolverBackend, VarType};

impl<B: SolverBackend> Model<B> {
    /// Every issue that would make the model unsolvable as declared.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let vars = lock(&self.vars);

        for var in vars.entities.values() {
            let (lower, upper) = (var.lower_bound(), var.upper_bound());
            if var.var_type() == VarType::Boolean && (lower > 1.0 || upper < 0.0) {
                issues.push(format!(
                    "Boolean variable {} has bounds [{}, {}] outside [0, 1]",
                    var.identifier(),
                    lower,
                    upper
                ));
            } else if var.var_type().is_integral() && lower.ceil() > upper {
                issues.push(format!(
                    "Variable {} has no integer value within [{}, {}]",
                    var.identifier(),
                    lower,
                    upper
                ));
            }
        }

        let unknown = |expression: &Expression, owner: &str, issues: &mut Vec<String>| {
            for term in expression.terms() {
                if let Some(id) = term.var_identifier() {
                    if !vars.contains(id) {
                        issues.push(format!("{} references unknown variable {}", owner, id));
                    }
                }
            }
        };

        for constraint in lock(&self.constraints).entities.values() {
            if !constraint.canonical_row().has_variables() {
                issues.push(format!(
                    "Constraint {} has no variable term",
                    constraint.identifier()
                ));
            }
            let owner = format!("Constraint {}", constraint.identifier());
            unknown(constraint.lhs(), &owner, &mut issues);
            unknown(constraint.rhs(), &owner, &mut issues);
        }

        if let Some(objective) = lock(&self.objective).as_ref() {
            unknown(&objective.expression, "Objective", &mut issues);
        }

        issues
    }

    pub(crate) fn ensure_valid(&self) -> Result<()> {
        let issues = self.validate();
        if issues.is_empty() {
            return Ok(());
        }
        for issue in &issues {
            tracing::warn!(component = "model", operation = "validate", "{}", issue);
        }
        Err(ModelError::Invalid(issues))
    }
}
