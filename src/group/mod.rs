//! Named partitions of a model's variables, constraints and constants.
//!
//! Every entity belongs to exactly one group. A group carries a
//! [`NameGenerator`] for structured identifiers and may have a
//! [`GroupInitializer`] registered on the model, which the lifecycle runs to
//! generate the group's members.

pub mod naming;
pub mod validators;

pub use naming::{EmptyNameGenerator, NameGenerator, Prefix, PrefixKind, PrefixNameGenerator};
pub use validators::{
    DistinctPrefixValidator, KindValidator, NumberRangeValidator, PrefixValidator,
    SetContainmentValidator,
};

use crate::domain::{EntityKind, NameError, Result, SolverBackend};
use crate::model::Model;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Compile-time tag for the entity family a group holds
pub trait GroupKind: Send + Sync + 'static {
    const ENTITY: EntityKind;
    /// Identifier of the group every model creates up front
    const DEFAULT_GROUP: &'static str;
    const DEFAULT_DESCRIPTION: &'static str;
    /// Marker inserted in exported group file names
    const FILE_SUFFIX: &'static str;
}

#[derive(Debug)]
pub enum VarKind {}

#[derive(Debug)]
pub enum ConstraintKind {}

#[derive(Debug)]
pub enum ConstantKind {}

impl GroupKind for VarKind {
    const ENTITY: EntityKind = EntityKind::Var;
    const DEFAULT_GROUP: &'static str = "Default";
    const DEFAULT_DESCRIPTION: &'static str = "Default variable group";
    const FILE_SUFFIX: &'static str = "-VARG-";
}

impl GroupKind for ConstraintKind {
    const ENTITY: EntityKind = EntityKind::Constraint;
    const DEFAULT_GROUP: &'static str = "Default_Constraints";
    const DEFAULT_DESCRIPTION: &'static str = "Default constraint group";
    const FILE_SUFFIX: &'static str = "-CONSTRG-";
}

impl GroupKind for ConstantKind {
    const ENTITY: EntityKind = EntityKind::Constant;
    const DEFAULT_GROUP: &'static str = "Default_Constants";
    const DEFAULT_DESCRIPTION: &'static str = "Default constant group";
    const FILE_SUFFIX: &'static str = "-CONSTANTG-";
}

/// Named partition of one entity kind
pub struct Group<K: GroupKind> {
    identifier: String,
    description: String,
    generator: Arc<dyn NameGenerator>,
    _kind: PhantomData<fn() -> K>,
}

pub type VarGroup = Group<VarKind>;
pub type ConstraintGroup = Group<ConstraintKind>;
pub type ConstantGroup = Group<ConstantKind>;

impl<K: GroupKind> Group<K> {
    pub(crate) fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        generator: Option<Arc<dyn NameGenerator>>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            generator: generator.unwrap_or_else(|| Arc::new(EmptyNameGenerator)),
            _kind: PhantomData,
        }
    }

    pub(crate) fn default_group() -> Self {
        Self::new(K::DEFAULT_GROUP, K::DEFAULT_DESCRIPTION, None)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn generator(&self) -> &dyn NameGenerator {
        self.generator.as_ref()
    }

    /// Shorthand for `self.generator().name(prefixes)`.
    pub fn name(&self, prefixes: &[Prefix]) -> std::result::Result<String, NameError> {
        self.generator.name(prefixes)
    }

    pub fn is_default(&self) -> bool {
        self.identifier == K::DEFAULT_GROUP
    }
}

impl<K: GroupKind> Clone for Group<K> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            description: self.description.clone(),
            generator: Arc::clone(&self.generator),
            _kind: PhantomData,
        }
    }
}

impl<K: GroupKind> PartialEq for Group<K> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl<K: GroupKind> fmt::Debug for Group<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("kind", &K::ENTITY)
            .field("identifier", &self.identifier)
            .field("description", &self.description)
            .finish()
    }
}

impl<K: GroupKind> fmt::Display for Group<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(Identifier: {}, Description: {})",
            self.identifier, self.description
        )
    }
}

/// What an initializer sees while it runs: the model and its own group
pub struct GroupContext<'a, B: SolverBackend, K: GroupKind> {
    model: &'a Model<B>,
    group: &'a Group<K>,
}

impl<'a, B: SolverBackend, K: GroupKind> GroupContext<'a, B, K> {
    pub(crate) fn new(model: &'a Model<B>, group: &'a Group<K>) -> Self {
        Self { model, group }
    }

    pub fn model(&self) -> &'a Model<B> {
        self.model
    }

    pub fn group(&self) -> &'a Group<K> {
        self.group
    }

    /// Name built by the group's generator.
    pub fn name(&self, prefixes: &[Prefix]) -> Result<String> {
        Ok(self.group.name(prefixes)?)
    }
}

/// Generates the members of one group during `Model::init`
pub trait GroupInitializer<B: SolverBackend, K: GroupKind>: Send + Sync {
    fn run(&self, ctx: &GroupContext<'_, B, K>) -> Result<()>;
}

impl<B, K, F> GroupInitializer<B, K> for F
where
    B: SolverBackend,
    K: GroupKind,
    F: Fn(&GroupContext<'_, B, K>) -> Result<()> + Send + Sync,
{
    fn run(&self, ctx: &GroupContext<'_, B, K>) -> Result<()> {
        self(ctx)
    }
}

/// Boxes a closure as an initializer, letting the compiler infer its
/// argument type.
pub fn initializer<B, K, F>(f: F) -> Box<dyn GroupInitializer<B, K>>
where
    B: SolverBackend,
    K: GroupKind,
    F: Fn(&GroupContext<'_, B, K>) -> Result<()> + Send + Sync + 'static,
{
    Box::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefixes;

    #[test]
    fn groups_without_generator_cannot_name() {
        let group: VarGroup = Group::new("G", "no generator", None);
        assert_eq!(group.name(&prefixes![1]), Err(NameError::NoGenerator));
    }

    #[test]
    fn default_groups_use_kind_constants() {
        assert_eq!(VarGroup::default_group().identifier(), "Default");
        assert_eq!(
            ConstraintGroup::default_group().identifier(),
            "Default_Constraints"
        );
        assert_eq!(
            ConstantGroup::default_group().identifier(),
            "Default_Constants"
        );
        assert!(ConstantGroup::default_group().is_default());
    }

    #[test]
    fn groups_compare_by_identifier() {
        let a: ConstraintGroup = Group::new("C", "one", None);
        let b: ConstraintGroup = Group::new(
            "C",
            "two",
            Some(Arc::new(PrefixNameGenerator::new("C", 1))),
        );
        assert_eq!(a, b);
        assert_eq!(b.clone().name(&prefixes![3]).unwrap(), "C-/-3");
    }

    #[test]
    fn display_lists_identifier_and_description() {
        let group: VarGroup = Group::new("X", "Pick", None);
        assert_eq!(group.to_string(), "(Identifier: X, Description: Pick)");
    }
}
