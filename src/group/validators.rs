// Per-slot checks a name generator runs before emitting a name

use super::naming::{Prefix, PrefixKind};
use crate::domain::NameError;

/// A predicate over the prefix list, anchored at one slot
pub trait PrefixValidator: Send + Sync {
    /// Highest slot this validator reads.
    fn slot(&self) -> usize;

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError>;
}

fn rejected(message: &str) -> NameError {
    NameError::Rejected(message.to_string())
}

/// Slot value must be one of the listed kinds
#[derive(Debug, Clone)]
pub struct KindValidator {
    slot: usize,
    kinds: Vec<PrefixKind>,
    message: String,
}

impl KindValidator {
    pub fn new(slot: usize, kind: PrefixKind) -> Self {
        Self::any_of(slot, vec![kind])
    }

    pub fn any_of(slot: usize, kinds: Vec<PrefixKind>) -> Self {
        let message = format!("Object at index {} is not of kind {:?}", slot, kinds);
        Self {
            slot,
            kinds,
            message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl PrefixValidator for KindValidator {
    fn slot(&self) -> usize {
        self.slot
    }

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError> {
        match prefixes.get(self.slot) {
            Some(prefix) if self.kinds.contains(&prefix.kind()) => Ok(()),
            _ => Err(rejected(&self.message)),
        }
    }
}

/// Slot value must be numeric and inside `[lower, upper]`
#[derive(Debug, Clone)]
pub struct NumberRangeValidator {
    slot: usize,
    lower: f64,
    upper: f64,
    message: String,
}

impl NumberRangeValidator {
    pub fn new(slot: usize, lower: f64, upper: f64) -> Self {
        let upper = if lower > upper {
            tracing::warn!(
                component = "naming",
                lower,
                upper,
                "Range validator given inverted bounds, collapsing to the lower bound"
            );
            lower
        } else {
            upper
        };
        Self {
            slot,
            lower,
            upper,
            message: format!(
                "Object at index {} is not within the bounds [{}, {}]",
                slot, lower, upper
            ),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl PrefixValidator for NumberRangeValidator {
    fn slot(&self) -> usize {
        self.slot
    }

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError> {
        match prefixes.get(self.slot).and_then(Prefix::as_f64) {
            Some(value) if value >= self.lower && value <= self.upper => Ok(()),
            _ => Err(rejected(&self.message)),
        }
    }
}

/// Slot value must belong to a fixed set
#[derive(Debug, Clone)]
pub struct SetContainmentValidator {
    slot: usize,
    values: Vec<Prefix>,
    message: String,
}

impl SetContainmentValidator {
    pub fn new<I, P>(slot: usize, values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Prefix>,
    {
        Self {
            slot,
            values: values.into_iter().map(Into::into).collect(),
            message: format!("Object at index {} is not in the provided value set", slot),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl PrefixValidator for SetContainmentValidator {
    fn slot(&self) -> usize {
        self.slot
    }

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError> {
        match prefixes.get(self.slot) {
            Some(prefix) if self.values.contains(prefix) => Ok(()),
            _ => Err(rejected(&self.message)),
        }
    }
}

/// Values at two slots must differ
#[derive(Debug, Clone)]
pub struct DistinctPrefixValidator {
    first: usize,
    second: usize,
    message: String,
}

impl DistinctPrefixValidator {
    pub fn new(first: usize, second: usize) -> Self {
        Self {
            first,
            second,
            message: format!("Object at index {} and {} are the same", first, second),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl PrefixValidator for DistinctPrefixValidator {
    fn slot(&self) -> usize {
        self.first.max(self.second)
    }

    fn validate(&self, prefixes: &[Prefix]) -> Result<(), NameError> {
        match (prefixes.get(self.first), prefixes.get(self.second)) {
            (Some(a), Some(b)) if a != b => Ok(()),
            _ => Err(rejected(&self.message)),
        }
    }
}
