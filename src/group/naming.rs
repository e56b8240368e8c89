//! Structured identifiers for generated entity families.
//!
//! A [`PrefixNameGenerator`] takes a fixed number of [`Prefix`] values, runs
//! the validators attached to each slot, and joins the values onto a fixed
//! prefix string: `C-/-X-/-1` for prefix `C` and slots `("X", 1)`.

use super::validators::PrefixValidator;
use crate::domain::NameError;
use std::fmt;

pub const DEFAULT_SEPARATOR: &str = "-/-";

/// One slot value handed to a name generator
#[derive(Debug, Clone, PartialEq)]
pub enum Prefix {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Discriminant of a [`Prefix`], used by type-membership checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixKind {
    Int,
    Float,
    Text,
}

impl Prefix {
    pub fn kind(&self) -> PrefixKind {
        match self {
            Prefix::Int(_) => PrefixKind::Int,
            Prefix::Float(_) => PrefixKind::Float,
            Prefix::Text(_) => PrefixKind::Text,
        }
    }

    /// Numeric value of the slot, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Prefix::Int(v) => Some(*v as f64),
            Prefix::Float(v) => Some(*v),
            Prefix::Text(_) => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Int(v) => write!(f, "{}", v),
            Prefix::Float(v) => write!(f, "{}", v),
            Prefix::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! prefix_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Prefix {
                fn from(value: $ty) -> Self {
                    Prefix::Int(value as i64)
                }
            }
        )*
    };
}

prefix_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<f64> for Prefix {
    fn from(value: f64) -> Self {
        Prefix::Float(value)
    }
}

impl From<&str> for Prefix {
    fn from(value: &str) -> Self {
        Prefix::Text(value.to_string())
    }
}

impl From<String> for Prefix {
    fn from(value: String) -> Self {
        Prefix::Text(value)
    }
}

impl From<&String> for Prefix {
    fn from(value: &String) -> Self {
        Prefix::Text(value.clone())
    }
}

/// Builds a `Vec<Prefix>` from heterogeneous values: `prefixes!["X", 1]`.
#[macro_export]
macro_rules! prefixes {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::group::Prefix::from($value)),*]
    };
}

/// Produces a canonical identifier from a list of prefix values
pub trait NameGenerator: Send + Sync {
    /// Number of prefix values `name` expects
    fn index_count(&self) -> usize;

    fn name(&self, prefixes: &[Prefix]) -> Result<String, NameError>;
}

/// Generator attached to groups created without one; always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyNameGenerator;

impl NameGenerator for EmptyNameGenerator {
    fn index_count(&self) -> usize {
        0
    }

    fn name(&self, _prefixes: &[Prefix]) -> Result<String, NameError> {
        Err(NameError::NoGenerator)
    }
}

/// Validating generator: `prefix` + (`separator` + slot)*
pub struct PrefixNameGenerator {
    prefix: String,
    separator: String,
    // validators[slot] must all accept before a name is produced
    validators: Vec<Vec<Box<dyn PrefixValidator>>>,
}

impl PrefixNameGenerator {
    pub fn new(prefix: impl Into<String>, index_count: usize) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim();
        if prefix.is_empty() {
            tracing::debug!(
                component = "naming",
                "Name generator initialized with an empty prefix"
            );
        }
        Self {
            prefix: prefix.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            validators: (0..index_count).map(|_| Vec::new()).collect(),
        }
    }

    /// Replaces the separator; blank separators keep the default.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        if separator.trim().is_empty() {
            tracing::debug!(
                component = "naming",
                "Name generator given an empty separator, keeping the default"
            );
        } else {
            self.separator = separator;
        }
        self
    }

    /// Attaches `validator` to its slot.
    pub fn add_validator(
        &mut self,
        validator: impl PrefixValidator + 'static,
    ) -> Result<&mut Self, NameError> {
        let slot = validator.slot();
        let index_count = self.validators.len();
        let Some(slot_validators) = self.validators.get_mut(slot) else {
            return Err(NameError::SlotOutOfRange { slot, index_count });
        };
        slot_validators.push(Box::new(validator));
        Ok(self)
    }

    /// Builder form of [`add_validator`](Self::add_validator).
    pub fn with_validator(
        mut self,
        validator: impl PrefixValidator + 'static,
    ) -> Result<Self, NameError> {
        self.add_validator(validator)?;
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError> {
        if prefixes.len() != self.validators.len() {
            return Err(NameError::ArityMismatch {
                expected: self.validators.len(),
                provided: prefixes.len(),
            });
        }
        self.validators
            .iter()
            .flatten()
            .try_for_each(|validator| validator.validate(prefixes))
    }
}

impl NameGenerator for PrefixNameGenerator {
    fn index_count(&self) -> usize {
        self.validators.len()
    }

    fn name(&self, prefixes: &[Prefix]) -> Result<String, NameError> {
        self.validate(prefixes)?;
        let mut name = self.prefix.clone();
        for prefix in prefixes {
            name.push_str(&self.separator);
            name.push_str(&prefix.to_string());
        }
        Ok(name)
    }
}

impl fmt::Debug for PrefixNameGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixNameGenerator")
            .field("prefix", &self.prefix)
            .field("separator", &self.separator)
            .field("index_count", &self.validators.len())
            .finish()
    }
}
