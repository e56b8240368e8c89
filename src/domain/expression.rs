//! Linear expressions over model variables.
//!
//! An [`Expression`] is an ordered list of [`Term`]s, each either a constant or
//! `coefficient × variable`. Variables are referenced by identifier, and every
//! variable term remembers the model it came from so that terms cannot leak
//! between models.

use super::error::{ModelError, Result};
use super::models::{Constant, ModelToken, Var};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// One summand of an [`Expression`]
#[derive(Debug, Clone)]
pub struct Term {
    coefficient: f64,
    var: Option<String>,
    owner: Option<ModelToken>,
}

impl Term {
    pub fn constant(value: f64) -> Self {
        Self {
            coefficient: value,
            var: None,
            owner: None,
        }
    }

    pub fn var(coefficient: f64, var: &Var) -> Self {
        Self {
            coefficient,
            var: Some(var.identifier().to_string()),
            owner: Some(var.owner()),
        }
    }

    /// `c·var` where the coefficient is the current value of constant `c`.
    pub fn scaled_by_constant(constant: &Constant, var: &Var) -> Self {
        Self::var(constant.value(), var)
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Identifier of the referenced variable, `None` for a constant term.
    pub fn var_identifier(&self) -> Option<&str> {
        self.var.as_deref()
    }

    pub fn is_constant(&self) -> bool {
        self.var.is_none()
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.var
            .cmp(&other.var)
            .then_with(|| self.coefficient.total_cmp(&other.coefficient))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.var == other.var && self.coefficient == other.coefficient
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.var {
            Some(var) => write!(f, "{}.{}", self.coefficient, var),
            None => write!(f, "{}", self.coefficient),
        }
    }
}

/// Additive linear combination of variables and constants
#[derive(Debug, Clone)]
pub struct Expression {
    owner: ModelToken,
    terms: Vec<Term>,
}

impl Expression {
    pub fn new(owner: ModelToken) -> Self {
        Self {
            owner,
            terms: Vec::new(),
        }
    }

    pub fn owner(&self) -> ModelToken {
        self.owner
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Appends `term`, refusing variables that belong to another model.
    pub fn add_term(&mut self, term: Term) -> Result<&mut Self> {
        if let (Some(owner), Some(var)) = (term.owner, term.var.as_deref()) {
            if owner != self.owner {
                return Err(ModelError::ForeignVariable {
                    identifier: var.to_string(),
                });
            }
        }
        self.terms.push(term);
        Ok(self)
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.terms.push(Term::constant(value));
        self
    }

    pub fn add_var(&mut self, var: &Var) -> Result<&mut Self> {
        self.add_term(Term::var(1.0, var))
    }

    pub fn add_scaled(&mut self, coefficient: f64, var: &Var) -> Result<&mut Self> {
        self.add_term(Term::var(coefficient, var))
    }

    pub fn add_constant_value(&mut self, constant: &Constant) -> &mut Self {
        self.add_constant(constant.value())
    }

    pub fn add_scaled_by_constant(&mut self, constant: &Constant, var: &Var) -> Result<&mut Self> {
        self.add_term(Term::scaled_by_constant(constant, var))
    }

    /// Appends every term of `other` without reducing.
    pub fn add(&mut self, other: &Expression) -> Result<&mut Self> {
        if other.owner != self.owner {
            return Err(ModelError::ForeignExpression);
        }
        self.terms.extend(other.terms.iter().cloned());
        Ok(self)
    }

    pub fn multiply(&mut self, scalar: f64) -> &mut Self {
        for term in &mut self.terms {
            term.coefficient *= scalar;
        }
        self
    }

    /// Merges terms per variable (first-appearance order) and folds all
    /// constants into one trailing term, dropped when it sums to zero.
    pub fn reduce(&self) -> Expression {
        let mut vars: Vec<Term> = Vec::new();
        let mut constant = 0.0;
        for term in &self.terms {
            match &term.var {
                None => constant += term.coefficient,
                Some(id) => match vars.iter_mut().find(|t| t.var.as_ref() == Some(id)) {
                    Some(existing) => existing.coefficient += term.coefficient,
                    None => vars.push(term.clone()),
                },
            }
        }
        if constant != 0.0 {
            vars.push(Term::constant(constant));
        }
        Expression {
            owner: self.owner,
            terms: vars,
        }
    }

    pub fn constant_contribution(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.is_constant())
            .map(|t| t.coefficient)
            .sum()
    }

    /// Net coefficient per variable identifier.
    pub fn var_contribution(&self) -> BTreeMap<String, f64> {
        let mut contribution = BTreeMap::new();
        for term in &self.terms {
            if let Some(var) = &term.var {
                *contribution.entry(var.clone()).or_insert(0.0) += term.coefficient;
            }
        }
        contribution
    }

    /// Whether both expressions reduce to the same terms.
    pub fn equivalent(&self, other: &Expression) -> bool {
        self.reduce() == other.reduce()
    }

    /// Evaluates the expression, `None` when a variable has no value.
    pub fn evaluate(&self, values: &BTreeMap<String, f64>) -> Option<f64> {
        self.terms.iter().try_fold(0.0, |acc, term| match &term.var {
            None => Some(acc + term.coefficient),
            Some(var) => values.get(var).map(|v| acc + term.coefficient * v),
        })
    }

    fn sorted_terms(&self) -> Vec<&Term> {
        let mut terms: Vec<&Term> = self.terms.iter().collect();
        terms.sort_by(|a, b| a.sort_key(b));
        terms
    }
}

/// Term-multiset equality; the owning model is not compared.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.terms.len() == other.terms.len() && self.sorted_terms() == other.sorted_terms()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for term in &self.terms {
            if !first {
                f.write_str(" + ")?;
            }
            write!(f, "{}", term)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::VarType;

    fn var(owner: ModelToken, id: &str) -> Var {
        Var::new(owner, id, VarType::Double, 0.0, 10.0).unwrap()
    }

    #[test]
    fn reduce_sums_coefficients_and_constants() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut e = Expression::new(owner);
        e.add_scaled(2.0, &x).unwrap();
        e.add_scaled(3.0, &x).unwrap();
        e.add_constant(5.0);

        let reduced = e.reduce();
        assert_eq!(reduced.terms(), &[Term::var(5.0, &x), Term::constant(5.0)]);
    }

    #[test]
    fn reduce_is_idempotent() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let y = var(owner, "y");
        let mut e = Expression::new(owner);
        e.add_var(&y).unwrap();
        e.add_constant(1.5);
        e.add_scaled(-4.0, &x).unwrap();
        e.add_scaled(2.0, &y).unwrap();
        e.add_constant(-0.5);

        let once = e.reduce();
        assert_eq!(once.reduce(), once);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn reduce_drops_zero_constant_but_keeps_zero_variable_terms() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut e = Expression::new(owner);
        e.add_constant(2.0).add_constant(-2.0);
        e.add_scaled(1.0, &x).unwrap().add_scaled(-1.0, &x).unwrap();

        let reduced = e.reduce();
        assert_eq!(reduced.terms(), &[Term::var(0.0, &x)]);
    }

    #[test]
    fn add_term_rejects_variables_from_other_models() {
        let foreign = var(ModelToken::next(), "x");
        let mut e = Expression::new(ModelToken::next());
        let err = e.add_var(&foreign).unwrap_err();
        assert!(matches!(err, ModelError::ForeignVariable { identifier } if identifier == "x"));
        assert!(e.is_empty());
    }

    #[test]
    fn add_concatenates_without_reducing() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut a = Expression::new(owner);
        a.add_var(&x).unwrap();
        let mut b = Expression::new(owner);
        b.add_var(&x).unwrap().add_constant(3.0);

        a.add(&b).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn add_rejects_expressions_of_other_models() {
        let mut a = Expression::new(ModelToken::next());
        let b = Expression::new(ModelToken::next());
        assert!(matches!(a.add(&b), Err(ModelError::ForeignExpression)));
    }

    #[test]
    fn multiply_scales_every_term() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut e = Expression::new(owner);
        e.add_scaled(2.0, &x).unwrap().add_constant(3.0);
        e.multiply(-2.0);
        assert_eq!(e.terms(), &[Term::var(-4.0, &x), Term::constant(-6.0)]);
    }

    #[test]
    fn copies_are_independent() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut original = Expression::new(owner);
        original.add_scaled(2.0, &x).unwrap();

        let mut copy = original.clone();
        copy.multiply(10.0).add_constant(1.0);

        assert_eq!(original.terms(), &[Term::var(2.0, &x)]);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn contributions_fold_terms() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let y = var(owner, "y");
        let mut e = Expression::new(owner);
        e.add_scaled(2.0, &x).unwrap();
        e.add_constant(4.0);
        e.add_scaled(-1.0, &y).unwrap();
        e.add_scaled(0.5, &x).unwrap();
        e.add_constant(1.0);

        assert_eq!(e.constant_contribution(), 5.0);
        let vars = e.var_contribution();
        assert_eq!(vars.get("x"), Some(&2.5));
        assert_eq!(vars.get("y"), Some(&-1.0));
    }

    #[test]
    fn constant_terms_take_the_current_value() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let c = Constant::new("c", 3.0).unwrap();
        let mut e = Expression::new(owner);
        e.add_scaled_by_constant(&c, &x).unwrap().add_constant_value(&c);
        assert_eq!(e.terms(), &[Term::var(3.0, &x), Term::constant(3.0)]);
    }

    #[test]
    fn equality_ignores_term_order() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let y = var(owner, "y");
        let mut a = Expression::new(owner);
        a.add_var(&x).unwrap().add_scaled(2.0, &y).unwrap();
        let mut b = Expression::new(owner);
        b.add_scaled(2.0, &y).unwrap().add_var(&x).unwrap();
        assert_eq!(a, b);

        let mut c = Expression::new(owner);
        c.add_scaled(3.0, &x).unwrap();
        let mut d = Expression::new(owner);
        d.add_var(&x).unwrap().add_scaled(2.0, &x).unwrap();
        assert_ne!(c, d);
        assert!(c.equivalent(&d));
    }

    #[test]
    fn evaluate_needs_every_variable() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let y = var(owner, "y");
        let mut e = Expression::new(owner);
        e.add_scaled(2.0, &x).unwrap().add_var(&y).unwrap().add_constant(1.0);

        let mut values = BTreeMap::from([("x".to_string(), 3.0)]);
        assert_eq!(e.evaluate(&values), None);
        values.insert("y".to_string(), 4.0);
        assert_eq!(e.evaluate(&values), Some(11.0));
    }

    #[test]
    fn display_joins_terms() {
        let owner = ModelToken::next();
        let x = var(owner, "x");
        let mut e = Expression::new(owner);
        e.add_scaled(2.0, &x).unwrap().add_constant(4.0);
        assert_eq!(e.to_string(), "2.x + 4");
    }
}
