//! Business configuration lookup.
//!
//! The store loads configuration from:
//! 1. YAML files (a single `business:` entry or a `businesses:` list)
//! 2. Directories of such files (recursive)
//! 3. Programmatic registration

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::Result;
use crate::model::{BusinessConfig, ProductConfig};

/// Source of per-business configuration.
pub trait BusinessConfigSource: Send + Sync {
    /// Configuration for `biz_code`, if the business is configured.
    fn business_config(&self, biz_code: &str) -> Option<BusinessConfig>;

    /// Products installed by `config`.
    fn installed_products(&self, config: &BusinessConfig) -> Vec<ProductConfig> {
        config.products.clone()
    }
}

/// In-memory business configuration, optionally loaded from YAML.
#[derive(Debug, Default)]
pub struct BusinessConfigStore {
    configs: RwLock<HashMap<String, BusinessConfig>>,
}

#[derive(Debug, Deserialize)]
struct SingleWrapper {
    business: BusinessConfig,
}

#[derive(Debug, Deserialize)]
struct ListWrapper {
    businesses: Vec<BusinessConfig>,
}

impl BusinessConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the configuration of one business.
    pub fn register(&self, config: BusinessConfig) {
        self.configs.write().insert(config.biz_code.clone(), config);
    }

    /// Register every business found in a YAML string. Returns the count.
    ///
    /// The wrapper is chosen by the top-level key, so parse errors point at
    /// the entry that is actually malformed.
    pub fn register_from_yaml(&self, yaml: &str) -> Result<usize> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if doc.get("business").is_some() {
            let single: SingleWrapper = serde_yaml::from_value(doc)?;
            self.register(single.business);
            return Ok(1);
        }

        let list: ListWrapper = serde_yaml::from_value(doc)?;
        let count = list.businesses.len();
        for config in list.businesses {
            self.register(config);
        }
        Ok(count)
    }

    /// Register every business found in a YAML file. Returns the count.
    pub fn register_from_file(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.register_from_yaml(&content)
    }

    /// Load a file or every `.yaml`/`.yml` file under a directory (recursive).
    ///
    /// Files that fail to parse are logged and skipped. A missing path loads
    /// nothing.
    pub fn load_path(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            log::warn!("Business config path {} does not exist", path.display());
            return Ok(0);
        }
        if path.is_file() {
            return self.register_from_file(path);
        }

        let mut count = 0;
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                count += self.load_path(&path)?;
            } else if path
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
            {
                match self.register_from_file(&path) {
                    Ok(n) => count += n,
                    Err(e) => {
                        log::warn!(
                            "Failed to load business config from {}: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
        }
        Ok(count)
    }

    /// Configured business codes, sorted.
    pub fn biz_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.configs.read().keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

impl BusinessConfigSource for BusinessConfigStore {
    fn business_config(&self, biz_code: &str) -> Option<BusinessConfig> {
        self.configs.read().get(biz_code).cloned()
    }
}
