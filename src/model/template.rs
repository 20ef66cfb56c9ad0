//! Templates: configured, prioritised units of business behaviour (use-cases
//! and products) gated by an effectiveness check.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::business::ScenarioRequest;
use crate::config::DEFAULT_PRIORITY;

/// Behaviour of a template type. Templates are stateless; a fresh instance
/// is created for every check.
pub trait Template: Send + Sync {
    /// Whether this template applies to `request`.
    fn is_effect(&self, request: &ScenarioRequest) -> bool;
}

/// Creates a template instance; `None` when the template is unavailable.
pub type TemplateFactory = Arc<dyn Fn() -> Option<Box<dyn Template>> + Send + Sync>;

/// Kind of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Globally registered; applies to every business whose request it accepts.
    UseCase,
    /// Installed per business through business configuration.
    Product,
}

/// A registered template.
#[derive(Clone)]
pub struct TemplateSpec {
    pub code: String,
    pub name: String,
    pub kind: TemplateKind,
    /// Lower value wins.
    pub priority: i32,
    factory: Option<TemplateFactory>,
}

/// A globally registered use-case.
pub type UseCaseSpec = TemplateSpec;

/// A product that businesses install.
pub type ProductSpec = TemplateSpec;

impl TemplateSpec {
    pub fn new(code: impl Into<String>, kind: TemplateKind) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            kind,
            priority: DEFAULT_PRIORITY,
            factory: None,
        }
    }

    pub fn use_case(code: impl Into<String>) -> Self {
        Self::new(code, TemplateKind::UseCase)
    }

    pub fn product(code: impl Into<String>) -> Self {
        Self::new(code, TemplateKind::Product)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attach the factory used to create template instances.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Option<Box<dyn Template>> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Attach a factory for a default-constructible template type.
    pub fn with_template<T>(self) -> Self
    where
        T: Template + Default + 'static,
    {
        self.with_factory(|| Some(Box::new(T::default()) as Box<dyn Template>))
    }

    /// Fresh template instance, `None` when unavailable.
    pub fn new_instance(&self) -> Option<Box<dyn Template>> {
        self.factory.as_ref().and_then(|factory| factory())
    }

    /// Whether this template applies to `request`. Unavailable templates
    /// never apply.
    pub fn is_effective(&self, request: &ScenarioRequest) -> bool {
        match self.new_instance() {
            Some(template) => template.is_effect(request),
            None => false,
        }
    }
}

impl fmt::Debug for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSpec")
            .field("code", &self.code)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}
