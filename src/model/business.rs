//! Business objects, scenario requests and business configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An object a session scope resolves templates for (an order, a cart, ...).
pub trait BizObject: Send + Sync {
    /// Business code identifying the tenant/business line.
    fn biz_code(&self) -> &str;

    /// Identifier of this particular object, if it has one.
    fn biz_id(&self) -> Option<&str> {
        None
    }

    /// Scenario discriminator carried by the object itself.
    fn scenario(&self) -> Option<&str> {
        None
    }
}

/// Resolved business context used to test whether a template applies.
#[derive(Clone)]
pub struct ScenarioRequest {
    biz_object: Arc<dyn BizObject>,
    /// Scenario discriminator.
    pub scenario: Option<String>,
    /// Extra context the templates may inspect.
    pub attributes: HashMap<String, Value>,
}

impl ScenarioRequest {
    /// A request for `biz_object`, taking the scenario from the object.
    pub fn new(biz_object: Arc<dyn BizObject>) -> Self {
        let scenario = biz_object.scenario().map(str::to_string);
        Self {
            biz_object,
            scenario,
            attributes: HashMap::new(),
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn biz_object(&self) -> &Arc<dyn BizObject> {
        &self.biz_object
    }

    pub fn biz_code(&self) -> &str {
        self.biz_object.biz_code()
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl fmt::Debug for ScenarioRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRequest")
            .field("biz_code", &self.biz_code())
            .field("biz_id", &self.biz_object.biz_id())
            .field("scenario", &self.scenario)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// A product installed for a business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductConfig {
    pub code: String,
}

/// Configuration of one business code.
///
/// Example YAML:
/// ```yaml
/// business:
///   biz_code: "retail"
///   products:
///     - code: "member_discount"
///     - code: "gift_wrap"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub biz_code: String,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl BusinessConfig {
    pub fn new(biz_code: impl Into<String>) -> Self {
        Self {
            biz_code: biz_code.into(),
            products: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Install a product (no-op when already installed).
    pub fn install(mut self, product_code: impl Into<String>) -> Self {
        let code = product_code.into();
        if !self.products.iter().any(|p| p.code == code) {
            self.products.push(ProductConfig { code });
        }
        self
    }

    pub fn is_installed(&self, product_code: &str) -> bool {
        self.products.iter().any(|p| p.code == product_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        biz_code: String,
        scenario: Option<String>,
    }

    impl BizObject for Order {
        fn biz_code(&self) -> &str {
            &self.biz_code
        }

        fn scenario(&self) -> Option<&str> {
            self.scenario.as_deref()
        }
    }

    #[test]
    fn test_request_takes_scenario_from_object() {
        let order = Arc::new(Order {
            biz_code: "retail".to_string(),
            scenario: Some("checkout".to_string()),
        });
        let request = ScenarioRequest::new(order).with_attribute("vip", Value::Bool(true));
        assert_eq!(request.biz_code(), "retail");
        assert_eq!(request.scenario.as_deref(), Some("checkout"));
        assert_eq!(request.attribute("vip"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_install_dedupes_products() {
        let config = BusinessConfig::new("retail").install("a").install("b").install("a");
        assert_eq!(config.products.len(), 2);
        assert!(config.is_installed("b"));
        assert!(!config.is_installed("c"));
    }
}
