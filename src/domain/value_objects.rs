// Domain value objects shared by entities, the model and the adapters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarType {
    /// Continuous real number (x ∈ ℝ)
    Double,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Boolean,
}

impl VarType {
    pub fn description(&self) -> &'static str {
        match self {
            VarType::Double => "Double variable",
            VarType::Integer => "Integer variable",
            VarType::Boolean => "Boolean variable",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, VarType::Integer | VarType::Boolean)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Double => write!(f, "DOUBLE"),
            VarType::Integer => write!(f, "INTEGER"),
            VarType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// Comparison between the two sides of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Less than or equal (≤)
    LessEqual,
    /// Greater than or equal (≥)
    GreaterEqual,
    /// Equal (=)
    Equal,
}

impl Operator {
    pub fn short_repr(&self) -> &'static str {
        match self {
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "=",
        }
    }

    /// Whether `lhs op rhs` holds within `tolerance`.
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Operator::LessEqual => lhs <= rhs + tolerance,
            Operator::GreaterEqual => lhs + tolerance >= rhs,
            Operator::Equal => (lhs - rhs).abs() <= tolerance,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_repr())
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveType {
    Minimize,
    Maximize,
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveType::Minimize => write!(f, "MINIMIZE"),
            ObjectiveType::Maximize => write!(f, "MAXIMIZE"),
        }
    }
}

/// Status reported by a solver once a solve terminates
///
/// None of these are errors: a broken model surfaces as a `ModelError`, while an
/// infeasible or interrupted one is reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Solver could not tell infeasibility from unboundedness
    InfeasibleOrUnbounded,
    /// Time limit reached
    TimeLimit,
    /// Objective cutoff reached
    Cutoff,
    Unknown,
}

impl SolutionStatus {
    pub fn is_optimal(&self) -> bool {
        *self == SolutionStatus::Optimal
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            SolutionStatus::Infeasible | SolutionStatus::InfeasibleOrUnbounded
        )
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            SolutionStatus::Unbounded | SolutionStatus::InfeasibleOrUnbounded
        )
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::InfeasibleOrUnbounded => write!(f, "Infeasible or Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
            SolutionStatus::Cutoff => write!(f, "Cutoff Reached"),
            SolutionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Keys of the solution-parameter map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionParam {
    Status,
    Objective,
    MipGap,
    Time,
}

impl SolutionParam {
    pub fn description(&self) -> &'static str {
        match self {
            SolutionParam::Status => "Solution Status",
            SolutionParam::Objective => "Objective Function Value",
            SolutionParam::MipGap => "MIP Gap",
            SolutionParam::Time => "Time in milliseconds",
        }
    }

    /// Name of the value type this parameter must hold.
    pub fn value_type(&self) -> &'static str {
        match self {
            SolutionParam::Status => "status",
            SolutionParam::Objective | SolutionParam::MipGap => "float",
            SolutionParam::Time => "milliseconds",
        }
    }
}

impl fmt::Display for SolutionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionParam::Status => write!(f, "STATUS"),
            SolutionParam::Objective => write!(f, "OBJECTIVE"),
            SolutionParam::MipGap => write!(f, "MIP_GAP"),
            SolutionParam::Time => write!(f, "TIME"),
        }
    }
}

/// Value stored against a [`SolutionParam`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolutionValue {
    Status(SolutionStatus),
    Float(f64),
    Millis(u64),
}

impl SolutionValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SolutionValue::Status(_) => "status",
            SolutionValue::Float(_) => "float",
            SolutionValue::Millis(_) => "milliseconds",
        }
    }
}

/// Solution parameters reported by a backend after a solve
pub type SolutionParams = std::collections::BTreeMap<SolutionParam, SolutionValue>;

/// The three kinds of entity a model declares; identifiers are unique per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Var,
    Constraint,
    Constant,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Var => write!(f, "Variable"),
            EntityKind::Constraint => write!(f, "Constraint"),
            EntityKind::Constant => write!(f, "Constant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_holds_with_tolerance() {
        assert!(Operator::LessEqual.holds(4.0000001, 4.0, 1e-6));
        assert!(!Operator::LessEqual.holds(4.1, 4.0, 1e-6));
        assert!(Operator::GreaterEqual.holds(3.9999999, 4.0, 1e-6));
        assert!(Operator::Equal.holds(2.0, 2.0, 0.0));
        assert!(!Operator::Equal.holds(2.0, 2.5, 1e-6));
    }

    #[test]
    fn infeasible_or_unbounded_counts_as_both() {
        let status = SolutionStatus::InfeasibleOrUnbounded;
        assert!(status.is_infeasible());
        assert!(status.is_unbounded());
        assert!(!status.is_optimal());
    }

    #[test]
    fn solution_value_type_matches_param() {
        assert_eq!(
            SolutionValue::Float(1.0).type_name(),
            SolutionParam::Objective.value_type()
        );
        assert_eq!(
            SolutionValue::Millis(5).type_name(),
            SolutionParam::Time.value_type()
        );
        assert_eq!(
            SolutionValue::Status(SolutionStatus::Optimal).type_name(),
            SolutionParam::Status.value_type()
        );
    }

    #[test]
    fn var_type_serializes_in_upper_case() {
        let rendered = serde_json::to_string(&VarType::Boolean).unwrap();
        assert_eq!(rendered, "\"BOOLEAN\"");
        let op: Operator = serde_json::from_str("\"LESS_EQUAL\"").unwrap();
        assert_eq!(op, Operator::LessEqual);
    }
}
