//! Extension index: extension code → every record contributed for it.

use dashmap::DashMap;

use crate::model::ExtensionSpec;

/// An extension record together with the implementation that contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredExtension {
    /// Instance code of the contributing implementation.
    pub instance_code: String,
    pub spec: ExtensionSpec,
}

/// Global, additive index of extension points across all capabilities.
///
/// Writes only union new contributions into the existing set; there is no
/// removal path. Contributions are deduplicated by the extension identity
/// plus the contributing instance code, so two implementations of the same
/// capability that both declare a code are both kept.
#[derive(Debug, Default)]
pub struct ExtensionIndex {
    extensions: DashMap<String, Vec<RegisteredExtension>>,
}

impl ExtensionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `extensions` contributed by `instance_code` into the index.
    ///
    /// Returns how many contributions were new.
    pub fn merge<I>(&self, instance_code: &str, extensions: I) -> usize
    where
        I: IntoIterator<Item = ExtensionSpec>,
    {
        let mut added = 0;
        for spec in extensions {
            let mut entry = self.extensions.entry(spec.code.clone()).or_default();
            let known = entry
                .iter()
                .any(|e| e.instance_code == instance_code && e.spec == spec);
            if !known {
                entry.push(RegisteredExtension {
                    instance_code: instance_code.to_string(),
                    spec,
                });
                added += 1;
            }
        }
        added
    }

    /// Every contribution for `code`, in registration order.
    pub fn get(&self, code: &str) -> Vec<RegisteredExtension> {
        self.extensions
            .get(code)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Distinct extension records for `code`, one per capability.
    pub fn specs(&self, code: &str) -> Vec<ExtensionSpec> {
        let mut specs: Vec<ExtensionSpec> = Vec::new();
        for registered in self.get(code) {
            if !specs.contains(&registered.spec) {
                specs.push(registered.spec);
            }
        }
        specs
    }

    pub fn contains(&self, code: &str) -> bool {
        self.extensions.contains_key(code)
    }

    /// All indexed extension codes, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.extensions.iter().map(|e| e.key().clone()).collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodRef, ProtocolType, ReduceType};

    fn ext(ability: &str, code: &str) -> ExtensionSpec {
        ExtensionSpec {
            ability_code: ability.to_string(),
            code: code.to_string(),
            name: String::new(),
            description: String::new(),
            method: MethodRef {
                type_name: "OrderExt".to_string(),
                method_name: code.to_lowercase(),
            },
            reduce_type: ReduceType::All,
            protocol_type: ProtocolType::Local,
        }
    }

    #[test]
    fn test_merge_is_a_union() {
        let index = ExtensionIndex::new();
        assert_eq!(index.merge("a", vec![ext("order", "X"), ext("order", "Y")]), 2);
        assert_eq!(index.merge("b", vec![ext("order", "X")]), 1);
        assert_eq!(index.merge("b", vec![ext("order", "X")]), 0);
        assert_eq!(index.merge("c", vec![ext("pay", "X")]), 1);

        let contributors: Vec<String> = index.get("X").iter().map(|e| e.instance_code.clone()).collect();
        assert_eq!(contributors, vec!["a", "b", "c"]);
        assert_eq!(index.specs("X").len(), 2);
        assert_eq!(index.codes(), vec!["X", "Y"]);
    }

    #[test]
    fn test_unknown_code_is_empty() {
        let index = ExtensionIndex::new();
        assert!(index.get("missing").is_empty());
        assert!(!index.contains("missing"));
        assert!(index.is_empty());
    }
}
