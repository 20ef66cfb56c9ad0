//! Global registry of use-cases and products.

use crate::model::{ProductSpec, TemplateKind, TemplateSpec, UseCaseSpec};

/// Registered templates, kept in registration order.
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    use_cases: Vec<UseCaseSpec>,
    products: Vec<ProductSpec>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template into the list matching its kind.
    ///
    /// A template whose code is already registered for that kind replaces the
    /// earlier one in place.
    pub fn register(&mut self, template: TemplateSpec) {
        let list = match template.kind {
            TemplateKind::UseCase => &mut self.use_cases,
            TemplateKind::Product => &mut self.products,
        };
        match list.iter_mut().find(|t| t.code == template.code) {
            Some(existing) => {
                log::warn!("Replacing registered {:?} template {}", template.kind, template.code);
                *existing = template;
            }
            None => list.push(template),
        }
    }

    /// Every registered use-case, in registration order.
    pub fn use_cases(&self) -> &[UseCaseSpec] {
        &self.use_cases
    }

    /// Every registered product, in registration order.
    pub fn products(&self) -> &[ProductSpec] {
        &self.products
    }

    pub fn product_by_code(&self, code: &str) -> Option<&ProductSpec> {
        self.products.iter().find(|p| p.code == code)
    }

    pub fn use_case_by_code(&self, code: &str) -> Option<&UseCaseSpec> {
        self.use_cases.iter().find(|u| u.code == code)
    }

    pub fn len(&self) -> usize {
        self.use_cases.len() + self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.use_cases.is_empty() && self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_by_kind() {
        let mut registry = TemplateRegistry::new();
        registry.register(TemplateSpec::use_case("checkout"));
        registry.register(TemplateSpec::product("gift_wrap"));
        registry.register(TemplateSpec::product("member_discount"));

        assert_eq!(registry.use_cases().len(), 1);
        assert_eq!(registry.products().len(), 2);
        assert!(registry.product_by_code("gift_wrap").is_some());
        assert!(registry.product_by_code("checkout").is_none());
        assert!(registry.use_case_by_code("checkout").is_some());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_same_code_replaces_in_place() {
        let mut registry = TemplateRegistry::new();
        registry.register(TemplateSpec::product("a").with_priority(5));
        registry.register(TemplateSpec::product("b"));
        registry.register(TemplateSpec::product("a").with_priority(1));

        let codes: Vec<&str> = registry.products().iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["a", "b"]);
        assert_eq!(registry.product_by_code("a").unwrap().priority, 1);
    }
}
