// Per-kind storage of groups, group membership and entities

use crate::domain::{ModelError, Result};
use crate::group::{Group, GroupKind};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) struct Registry<E, K: GroupKind> {
    pub(crate) groups: BTreeMap<String, Group<K>>,
    members: BTreeMap<String, BTreeSet<String>>,
    pub(crate) entities: BTreeMap<String, E>,
}

impl<E: Clone, K: GroupKind> Registry<E, K> {
    pub(crate) fn with_default_group() -> Self {
        let mut registry = Self {
            groups: BTreeMap::new(),
            members: BTreeMap::new(),
            entities: BTreeMap::new(),
        };
        let default = Group::<K>::default_group();
        registry
            .members
            .insert(default.identifier().to_string(), BTreeSet::new());
        registry
            .groups
            .insert(default.identifier().to_string(), default);
        registry
    }

    pub(crate) fn add_group(&mut self, group: Group<K>) -> Result<()> {
        if self.groups.contains_key(group.identifier()) {
            return Err(ModelError::DuplicateGroup {
                kind: K::ENTITY,
                identifier: group.identifier().to_string(),
            });
        }
        self.members
            .insert(group.identifier().to_string(), BTreeSet::new());
        self.groups.insert(group.identifier().to_string(), group);
        Ok(())
    }

    pub(crate) fn group(&self, identifier: &str) -> Result<&Group<K>> {
        self.groups
            .get(identifier)
            .ok_or_else(|| ModelError::UnknownGroup {
                kind: K::ENTITY,
                identifier: identifier.to_string(),
            })
    }

    pub(crate) fn group_ids(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub(crate) fn member_ids(&self, group: &str) -> Result<Vec<String>> {
        self.group(group)?;
        Ok(self
            .members
            .get(group)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub(crate) fn ensure_absent(&self, identifier: &str) -> Result<()> {
        if self.entities.contains_key(identifier) {
            return Err(ModelError::DuplicateEntity {
                kind: K::ENTITY,
                identifier: identifier.to_string(),
            });
        }
        Ok(())
    }

    /// Registers `entity` under `group`; the group must exist.
    pub(crate) fn insert(&mut self, group: &str, identifier: &str, entity: E) -> Result<()> {
        self.group(group)?;
        self.ensure_absent(identifier)?;
        self.members
            .entry(group.to_string())
            .or_default()
            .insert(identifier.to_string());
        self.entities.insert(identifier.to_string(), entity);
        Ok(())
    }

    pub(crate) fn get(&self, identifier: &str) -> Result<&E> {
        self.entities
            .get(identifier)
            .ok_or_else(|| unknown::<K>(identifier))
    }

    pub(crate) fn get_mut(&mut self, identifier: &str) -> Result<&mut E> {
        self.entities
            .get_mut(identifier)
            .ok_or_else(|| unknown::<K>(identifier))
    }

    pub(crate) fn contains(&self, identifier: &str) -> bool {
        self.entities.contains_key(identifier)
    }

    pub(crate) fn values(&self) -> Vec<E> {
        self.entities.values().cloned().collect()
    }
}

fn unknown<K: GroupKind>(identifier: &str) -> ModelError {
    ModelError::UnknownEntity {
        kind: K::ENTITY,
        identifier: identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::VarKind;

    #[test]
    fn default_group_exists_and_is_empty() {
        let registry: Registry<u32, VarKind> = Registry::with_default_group();
        assert_eq!(registry.group_ids(), vec!["Default".to_string()]);
        assert!(registry.member_ids("Default").unwrap().is_empty());
    }

    #[test]
    fn insert_tracks_membership_and_rejects_duplicates() {
        let mut registry: Registry<u32, VarKind> = Registry::with_default_group();
        registry.add_group(Group::new("G", "", None)).unwrap();
        registry.insert("G", "a", 1).unwrap();
        assert_eq!(registry.member_ids("G").unwrap(), vec!["a".to_string()]);
        assert!(matches!(
            registry.insert("Default", "a", 2),
            Err(ModelError::DuplicateEntity { .. })
        ));
        assert!(matches!(
            registry.insert("Missing", "b", 2),
            Err(ModelError::UnknownGroup { .. })
        ));
        assert_eq!(*registry.get("a").unwrap(), 1);
    }

    #[test]
    fn duplicate_groups_are_refused() {
        let mut registry: Registry<u32, VarKind> = Registry::with_default_group();
        assert!(matches!(
            registry.add_group(Group::new("Default", "", None)),
            Err(ModelError::DuplicateGroup { .. })
        ));
    }
}
