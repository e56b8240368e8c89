use super::error::{ModelError, Result};
use super::expression::Expression;
use super::value_objects::{EntityKind, ObjectiveType, Operator, VarType};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Model`](crate::Model).
///
/// Variables and expressions remember the token of the model that created
/// them, which is how terms from another model are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelToken(u64);

impl ModelToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    pub fn inner(self) -> u64 {
        self.0
    }
}

fn check_identifier(kind: EntityKind, identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(ModelError::EmptyIdentifier { kind });
    }
    Ok(())
}

/// Decision variable declared on a model
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    identifier: String,
    var_type: VarType,
    lower_bound: f64,
    upper_bound: f64,
    owner: ModelToken,
    result: Option<f64>,
}

impl Var {
    /// Builds a variable tagged with `owner`. The model still has to register
    /// it before any expression using it can be attached there.
    pub fn new(
        owner: ModelToken,
        identifier: impl Into<String>,
        var_type: VarType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self> {
        let identifier = identifier.into();
        check_identifier(EntityKind::Var, &identifier)?;
        // NaN bounds fail this comparison too
        if !(lower_bound <= upper_bound) {
            return Err(ModelError::InvalidBounds {
                identifier,
                lower: lower_bound,
                upper: upper_bound,
            });
        }
        Ok(Self {
            identifier,
            var_type,
            lower_bound,
            upper_bound,
            owner,
            result: None,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn owner(&self) -> ModelToken {
        self.owner
    }

    /// Value extracted from the backend, absent until `extract_results` runs.
    pub fn result(&self) -> Option<f64> {
        self.result
    }

    pub(crate) fn set_result(&mut self, value: f64) {
        self.result = Some(value);
    }

    pub(crate) fn clear_result(&mut self) {
        self.result = None;
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[identifier: {}, type: {}, bounds: [{}, {}]]",
            self.identifier, self.var_type, self.lower_bound, self.upper_bound
        )
    }
}

/// Host-side numeric parameter, never materialized on the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    identifier: String,
    value: f64,
}

impl Constant {
    pub fn new(identifier: impl Into<String>, value: f64) -> Result<Self> {
        let identifier = identifier.into();
        check_identifier(EntityKind::Constant, &identifier)?;
        Ok(Self { identifier, value })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Constant] {} : {}", self.identifier, self.value)
    }
}

/// Linear constraint `lhs op rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    identifier: String,
    lhs: Expression,
    operator: Operator,
    rhs: Expression,
}

impl Constraint {
    pub fn new(
        identifier: impl Into<String>,
        lhs: Expression,
        operator: Operator,
        rhs: Expression,
    ) -> Result<Self> {
        let identifier = identifier.into();
        check_identifier(EntityKind::Constraint, &identifier)?;
        if lhs.owner() != rhs.owner() {
            return Err(ModelError::ForeignExpression);
        }
        if lhs.is_empty() && rhs.is_empty() {
            return Err(ModelError::EmptyExpression { identifier });
        }
        Ok(Self {
            identifier,
            lhs,
            operator,
            rhs,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn owner(&self) -> ModelToken {
        self.lhs.owner()
    }

    /// Moves every variable to the left and every constant to the right.
    pub fn canonical_row(&self) -> CanonicalRow {
        let mut terms: Vec<(String, f64)> = Vec::new();
        let sides = [(&self.lhs, 1.0), (&self.rhs, -1.0)];
        for (side, sign) in sides {
            for term in side.reduce().terms() {
                let Some(var) = term.var_identifier() else {
                    continue;
                };
                match terms.iter_mut().find(|(id, _)| id == var) {
                    Some((_, coefficient)) => *coefficient += sign * term.coefficient(),
                    None => terms.push((var.to_string(), sign * term.coefficient())),
                }
            }
        }
        CanonicalRow {
            terms,
            operator: self.operator,
            rhs: self.rhs.constant_contribution() - self.lhs.constant_contribution(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {}",
            self.identifier, self.lhs, self.operator, self.rhs
        )
    }
}

/// One matrix row: `Σ coefficient·var  op  rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub terms: Vec<(String, f64)>,
    pub operator: Operator,
    pub rhs: f64,
}

impl CanonicalRow {
    pub fn has_variables(&self) -> bool {
        !self.terms.is_empty()
    }
}

/// Objective expression and its direction
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub expression: Expression,
    pub objective_type: ObjectiveType,
}

impl Objective {
    pub fn new(expression: Expression, objective_type: ObjectiveType) -> Self {
        Self {
            expression,
            objective_type,
        }
    }
}

/// Configuration shared by the solver adapters
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Wall-clock limit in seconds; reaching it yields `SolutionStatus::TimeLimit`
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the solver may stop
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl SolverConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = Some(gap);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boolean(owner: ModelToken, id: &str) -> Var {
        Var::new(owner, id, VarType::Boolean, 0.0, 1.0).unwrap()
    }

    #[test]
    fn var_rejects_inverted_bounds() {
        let err = Var::new(ModelToken::next(), "x", VarType::Double, 2.0, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn var_rejects_nan_bounds() {
        let err = Var::new(ModelToken::next(), "x", VarType::Double, f64::NAN, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn var_accepts_equal_and_infinite_bounds() {
        let owner = ModelToken::next();
        assert!(Var::new(owner, "a", VarType::Integer, 3.0, 3.0).is_ok());
        assert!(Var::new(owner, "b", VarType::Double, f64::NEG_INFINITY, f64::INFINITY).is_ok());
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(matches!(
            Var::new(ModelToken::next(), "  ", VarType::Double, 0.0, 1.0),
            Err(ModelError::EmptyIdentifier {
                kind: EntityKind::Var
            })
        ));
        assert!(matches!(
            Constant::new("", 1.0),
            Err(ModelError::EmptyIdentifier {
                kind: EntityKind::Constant
            })
        ));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(ModelToken::next(), ModelToken::next());
    }

    #[test]
    fn canonical_row_moves_variables_left_and_constants_right() {
        let owner = ModelToken::next();
        let x = boolean(owner, "x");
        let y = boolean(owner, "y");

        // 2x + 1 <= y + 5  ->  2x - y <= 4
        let mut lhs = Expression::new(owner);
        lhs.add_scaled(2.0, &x).unwrap().add_constant(1.0);
        let mut rhs = Expression::new(owner);
        rhs.add_var(&y).unwrap().add_constant(5.0);

        let row = Constraint::new("c", lhs, Operator::LessEqual, rhs)
            .unwrap()
            .canonical_row();
        assert_eq!(
            row.terms,
            vec![("x".to_string(), 2.0), ("y".to_string(), -1.0)]
        );
        assert_eq!(row.rhs, 4.0);
        assert_eq!(row.operator, Operator::LessEqual);
    }

    #[test]
    fn canonical_row_nets_a_variable_on_both_sides() {
        let owner = ModelToken::next();
        let x = boolean(owner, "x");
        let mut lhs = Expression::new(owner);
        lhs.add_scaled(3.0, &x).unwrap();
        let mut rhs = Expression::new(owner);
        rhs.add_var(&x).unwrap();

        let row = Constraint::new("c", lhs, Operator::Equal, rhs)
            .unwrap()
            .canonical_row();
        assert_eq!(row.terms, vec![("x".to_string(), 2.0)]);
        assert_eq!(row.rhs, 0.0);
    }

    #[test]
    fn constraint_needs_at_least_one_term() {
        let owner = ModelToken::next();
        let err = Constraint::new(
            "c",
            Expression::new(owner),
            Operator::Equal,
            Expression::new(owner),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::EmptyExpression { .. }));
    }

    #[test]
    fn constraint_rejects_sides_from_different_models() {
        let mut lhs = Expression::new(ModelToken::next());
        lhs.add_constant(1.0);
        let mut rhs = Expression::new(ModelToken::next());
        rhs.add_constant(1.0);
        let err = Constraint::new("c", lhs, Operator::Equal, rhs).unwrap_err();
        assert!(matches!(err, ModelError::ForeignExpression));
    }
}
