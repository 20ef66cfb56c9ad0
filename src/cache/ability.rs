//! Capability index: one [`AbilitySpec`] per ability code.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::model::{AbilityDeclaration, AbilitySpec};

/// Process-lifetime index of registered capabilities.
///
/// Records are added during discovery and never removed.
#[derive(Debug, Default)]
pub struct AbilityIndex {
    abilities: DashMap<String, Arc<AbilitySpec>>,
}

impl AbilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the capability declared by `declaration` on `ability_class`.
    ///
    /// Idempotent: when a record for the derived code exists it is returned
    /// unchanged. Fails with `MalformedAbility` when no code can be derived.
    pub fn register(
        &self,
        declaration: &AbilityDeclaration,
        ability_class: &str,
    ) -> Result<Arc<AbilitySpec>> {
        let code = declaration.derive_code(ability_class)?;
        let spec = self
            .abilities
            .entry(code.clone())
            .or_insert_with(|| {
                log::debug!("Registering ability {} ({})", code, ability_class);
                let mut spec = AbilitySpec::new(code.clone(), ability_class);
                spec.parent = declaration.parent.clone();
                spec.name = declaration.name.clone();
                spec.description = declaration.description.clone();
                Arc::new(spec)
            })
            .clone();
        Ok(spec)
    }

    pub fn get(&self, code: &str) -> Option<Arc<AbilitySpec>> {
        self.abilities.get(code).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.abilities.contains_key(code)
    }

    /// All capabilities, sorted by code.
    pub fn list(&self) -> Vec<Arc<AbilitySpec>> {
        let mut all: Vec<Arc<AbilitySpec>> =
            self.abilities.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Capabilities whose parent is `parent_code`, sorted by code.
    pub fn children(&self, parent_code: &str) -> Vec<Arc<AbilitySpec>> {
        self.list()
            .into_iter()
            .filter(|spec| spec.parent.as_deref() == Some(parent_code))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let index = AbilityIndex::new();
        let first = index
            .register(&AbilityDeclaration::new("order"), "com.acme.IOrder")
            .unwrap();
        let second = index
            .register(&AbilityDeclaration::new("order"), "com.acme.OtherOrder")
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.ability_class, "com.acme.IOrder");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_malformed_declaration_leaves_index_untouched() {
        let index = AbilityIndex::new();
        let err = index
            .register(&AbilityDeclaration::new(""), "com.acme.Broken")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("com.acme.Broken"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_children_by_parent() {
        let index = AbilityIndex::new();
        index
            .register(&AbilityDeclaration::new("trade"), "ITrade")
            .unwrap();
        index
            .register(&AbilityDeclaration::new("trade.pay").with_parent("trade"), "IPay")
            .unwrap();
        index
            .register(&AbilityDeclaration::new("trade.ship").with_parent("trade"), "IShip")
            .unwrap();

        let children: Vec<String> = index.children("trade").iter().map(|s| s.code.clone()).collect();
        assert_eq!(children, vec!["trade.pay", "trade.ship"]);
        assert!(index.get("trade").unwrap().parent.is_none());
    }
}
