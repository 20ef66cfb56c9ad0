//! Business realizations.
//!
//! A realization binds a concrete extension implementation to the business
//! codes it serves, optionally narrowed to one scenario. Lookups return the
//! realizations serving a business code, scenario-specific ones first.

use std::collections::HashSet;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, Result};

/// One registered realization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizationSpec {
    /// Implementing class.
    pub class_name: String,
    /// Business codes served by this realization.
    pub codes: Vec<String>,
    /// Scenario this realization is restricted to, if any.
    #[serde(default)]
    pub scenario: Option<String>,
    /// Extension codes this realization implements.
    #[serde(default)]
    pub extension_codes: HashSet<String>,
}

impl RealizationSpec {
    pub fn new<I, S>(class_name: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_name: class_name.into(),
            codes: codes.into_iter().map(Into::into).collect(),
            scenario: None,
            extension_codes: HashSet::new(),
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn with_extension(mut self, extension_code: impl Into<String>) -> Self {
        self.extension_codes.insert(extension_code.into());
        self
    }

    /// Whether this realization applies to `scenario`.
    pub fn matches_scenario(&self, scenario: Option<&str>) -> bool {
        match self.scenario.as_deref() {
            None => true,
            Some(own) => Some(own) == scenario,
        }
    }
}

/// Business code → realizations serving it.
#[derive(Debug, Default)]
pub struct RealizationIndex {
    by_biz_code: DashMap<String, Vec<RealizationSpec>>,
}

impl RealizationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a realization under each of its business codes.
    ///
    /// Fails with `InvalidRealization` when it serves no business code.
    /// Registering the same class twice for a code is a no-op.
    pub fn register(&self, spec: RealizationSpec) -> Result<()> {
        let codes: Vec<&str> = spec
            .codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if codes.is_empty() {
            return Err(LatticeError::InvalidRealization {
                class_name: spec.class_name.clone(),
                reason: "no business codes declared".to_string(),
            });
        }

        for code in codes {
            let mut entry = self.by_biz_code.entry(code.to_string()).or_default();
            let known = entry
                .iter()
                .any(|r| r.class_name == spec.class_name && r.scenario == spec.scenario);
            if !known {
                entry.push(spec.clone());
            }
        }
        log::debug!(
            "Registered realization {} for {:?}",
            spec.class_name,
            spec.codes
        );
        Ok(())
    }

    /// Realizations serving `biz_code` under `scenario`; scenario-specific
    /// ones precede generic ones, registration order otherwise.
    pub fn find(&self, biz_code: &str, scenario: Option<&str>) -> Vec<RealizationSpec> {
        let Some(entry) = self.by_biz_code.get(biz_code) else {
            return Vec::new();
        };
        let mut found: Vec<RealizationSpec> = entry
            .iter()
            .filter(|r| r.matches_scenario(scenario))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.scenario.is_none());
        found
    }

    /// Realizations serving `biz_code` that implement `extension_code`.
    pub fn find_for_extension(
        &self,
        biz_code: &str,
        scenario: Option<&str>,
        extension_code: &str,
    ) -> Vec<RealizationSpec> {
        self.find(biz_code, scenario)
            .into_iter()
            .filter(|r| r.extension_codes.contains(extension_code))
            .collect()
    }

    /// Number of distinct realizations, however many codes each serves.
    pub fn len(&self) -> usize {
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
        for entry in self.by_biz_code.iter() {
            for realization in entry.value() {
                seen.insert((realization.class_name.clone(), realization.scenario.clone()));
            }
        }
        seen.len()
    }

    /// Number of business codes served by at least one realization.
    pub fn biz_code_count(&self) -> usize {
        self.by_biz_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_biz_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_codes_rejected() {
        let index = RealizationIndex::new();
        let err = index
            .register(RealizationSpec::new("com.acme.Ext", Vec::<String>::new()))
            .unwrap_err();
        assert_eq!(err.code(), "LATTICE-CORE-RT-0030");

        let err = index
            .register(RealizationSpec::new("com.acme.Ext", vec![" "]))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(index.is_empty());
    }

    #[test]
    fn test_find_prefers_scenario_specific() {
        let index = RealizationIndex::new();
        index
            .register(RealizationSpec::new("Generic", vec!["retail", "b2b"]).with_extension("X"))
            .unwrap();
        index
            .register(
                RealizationSpec::new("Checkout", vec!["retail"])
                    .with_scenario("checkout")
                    .with_extension("X"),
            )
            .unwrap();
        index
            .register(RealizationSpec::new("Refund", vec!["retail"]).with_scenario("refund"))
            .unwrap();

        let names = |found: Vec<RealizationSpec>| -> Vec<String> {
            found.into_iter().map(|r| r.class_name).collect()
        };
        assert_eq!(names(index.find("retail", Some("checkout"))), vec!["Checkout", "Generic"]);
        assert_eq!(names(index.find("retail", None)), vec!["Generic"]);
        assert_eq!(names(index.find("b2b", Some("checkout"))), vec!["Generic"]);
        assert!(index.find("unknown", None).is_empty());
        assert_eq!(
            names(index.find_for_extension("retail", Some("refund"), "X")),
            vec!["Generic"]
        );
    }

    #[test]
    fn test_register_twice_is_noop() {
        let index = RealizationIndex::new();
        let spec = RealizationSpec::new("Generic", vec!["retail"]);
        index.register(spec.clone()).unwrap();
        index.register(spec).unwrap();
        assert_eq!(index.find("retail", None).len(), 1);
    }

    #[test]
    fn test_len_counts_realizations_not_codes() {
        let index = RealizationIndex::new();
        index
            .register(RealizationSpec::new("Generic", vec!["retail", "b2b", "wholesale"]))
            .unwrap();
        index
            .register(RealizationSpec::new("Checkout", vec!["retail"]).with_scenario("checkout"))
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.biz_code_count(), 3);
        assert!(!index.is_empty());
    }
}
