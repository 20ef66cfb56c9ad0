//! Ability contracts and the type descriptors discovery works on.
//!
//! Nothing here is discovered by runtime type scanning. A build-time or
//! load-time manifest supplies [`ClassDescriptor`]s, each naming its kind,
//! the contracts it is assignable to, an optional [`AbilityDeclaration`]
//! (the capability marker) and a constructor. Live instances implement
//! [`Ability`]; their baseline behaviour is a [`BusinessExt`] whose
//! [`ExtSurface`] lists the extension points.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::spec::{ProtocolType, ReduceType};
use crate::error::{LatticeError, Result};

static ABILITY_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:\-]*$").unwrap());

// ---------------------------------------------------------------------------
// Type descriptors
// ---------------------------------------------------------------------------

/// Shape of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Instantiable, named type.
    Concrete,
    /// Named but not instantiable.
    Abstract,
    /// Bare contract with no concrete identity.
    Interface,
    /// Unnamed type (closure-like, no stable address).
    Anonymous,
}

impl TypeKind {
    /// Whether instances of this kind can be registered as implementations.
    pub fn is_concrete(self) -> bool {
        matches!(self, TypeKind::Concrete)
    }

    /// Whether the type has a stable, addressable identity.
    pub fn is_addressable(self) -> bool {
        matches!(self, TypeKind::Concrete | TypeKind::Abstract)
    }
}

/// The capability marker a contract type carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDeclaration {
    /// Capability code. Must be non-blank and match `[A-Za-z0-9][A-Za-z0-9_.:-]*`.
    pub code: String,
    /// Parent capability code, for hierarchical capabilities.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AbilityDeclaration {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Derive the capability code, rejecting malformed declarations.
    pub fn derive_code(&self, class_name: &str) -> Result<String> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err(LatticeError::MalformedAbility {
                class_name: class_name.to_string(),
                reason: "ability code is empty".to_string(),
            });
        }
        if !ABILITY_CODE_PATTERN.is_match(code) {
            return Err(LatticeError::MalformedAbility {
                class_name: class_name.to_string(),
                reason: format!("ability code '{}' contains illegal characters", code),
            });
        }
        Ok(code.to_string())
    }
}

/// Creates a live ability instance.
pub type AbilityConstructor = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Ability>> + Send + Sync>;

/// Descriptor of one candidate class supplied by discovery.
#[derive(Clone)]
pub struct ClassDescriptor {
    /// Fully qualified type name.
    pub name: String,
    pub kind: TypeKind,
    /// Contract types this class is assignable to (transitively).
    pub supertypes: HashSet<String>,
    /// Capability marker, when this class declares a capability contract.
    pub ability: Option<AbilityDeclaration>,
    /// Priority override; lower wins.
    pub priority: Option<i32>,
    constructor: Option<AbilityConstructor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: HashSet::new(),
            ability: None,
            priority: None,
            constructor: None,
        }
    }

    /// A concrete class.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Concrete)
    }

    /// Declare that this class is assignable to `contract`.
    pub fn implements(mut self, contract: impl Into<String>) -> Self {
        self.supertypes.insert(contract.into());
        self
    }

    /// Attach a capability marker.
    pub fn declares(mut self, ability: AbilityDeclaration) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attach the constructor used to materialize instances.
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Ability>> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn constructor(&self) -> Option<&AbilityConstructor> {
        self.constructor.as_ref()
    }

    /// Whether this class is `contract` or one of its subtypes.
    pub fn is_assignable_to(&self, contract: &str) -> bool {
        self.name == contract || self.supertypes.contains(contract)
    }

    /// Last path segment of the type name (`a::b::C` or `a.b.C` → `C`).
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("ability", &self.ability)
            .field("priority", &self.priority)
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

pub(crate) fn simple_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '.' || c == ':' || c == '$')
        .find(|segment| !segment.is_empty())
        .unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Extension surface
// ---------------------------------------------------------------------------

/// Marker declaring a contract method as an extension point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMarker {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reduce_type: ReduceType,
    #[serde(default)]
    pub protocol_type: ProtocolType,
}

impl ExtensionMarker {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            description: String::new(),
            reduce_type: ReduceType::default(),
            protocol_type: ProtocolType::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_reduce_type(mut self, reduce_type: ReduceType) -> Self {
        self.reduce_type = reduce_type;
        self
    }

    pub fn with_protocol_type(mut self, protocol_type: ProtocolType) -> Self {
        self.protocol_type = protocol_type;
        self
    }
}

/// One method on a contract surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtMethod {
    pub name: String,
    /// Marker declared directly on this method. An override without its own
    /// marker inherits the ancestor's.
    pub marker: Option<ExtensionMarker>,
}

impl ExtMethod {
    /// A plain method, or an override of a marked ancestor method.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: None,
        }
    }

    pub fn marked(name: impl Into<String>, marker: ExtensionMarker) -> Self {
        Self {
            name: name.into(),
            marker: Some(marker),
        }
    }
}

/// The exposed contract surface of a realization type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtSurface {
    pub type_name: String,
    pub kind: TypeKind,
    pub methods: Vec<ExtMethod>,
    /// Surface this type extends; its methods are inherited.
    pub parent: Option<Arc<ExtSurface>>,
}

impl ExtSurface {
    pub fn new(type_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            methods: Vec::new(),
            parent: None,
        }
    }

    pub fn concrete(type_name: impl Into<String>) -> Self {
        Self::new(type_name, TypeKind::Concrete)
    }

    pub fn method(mut self, method: ExtMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn extends(mut self, parent: impl Into<Arc<ExtSurface>>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Every method visible on this surface, most-derived first, with the
    /// marker resolved through the inheritance chain.
    pub fn resolved_methods(&self) -> Vec<(String, Option<ExtensionMarker>)> {
        let mut names: Vec<&str> = Vec::new();
        let mut chain: Vec<&ExtSurface> = Vec::new();
        let mut current = Some(self);
        while let Some(surface) = current {
            for method in &surface.methods {
                if !names.contains(&method.name.as_str()) {
                    names.push(method.name.as_str());
                }
            }
            chain.push(surface);
            current = surface.parent.as_deref();
        }

        names
            .into_iter()
            .map(|name| {
                let marker = chain.iter().find_map(|surface| {
                    surface
                        .methods
                        .iter()
                        .filter(|m| m.name == name)
                        .find_map(|m| m.marker.clone())
                });
                (name.to_string(), marker)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Ability contract
// ---------------------------------------------------------------------------

/// Baseline realization of an ability: the object whose surface declares the
/// extension points implementations customise.
pub trait BusinessExt: Send + Sync {
    /// Resolved runtime type of this realization.
    fn surface(&self) -> ExtSurface;
}

/// A realization described entirely by a fixed surface.
#[derive(Debug, Clone)]
pub struct StaticExt {
    surface: ExtSurface,
}

impl StaticExt {
    pub fn new(surface: ExtSurface) -> Self {
        Self { surface }
    }
}

impl BusinessExt for StaticExt {
    fn surface(&self) -> ExtSurface {
        self.surface.clone()
    }
}

/// A live implementation of a capability contract.
pub trait Ability: Send + Sync {
    /// Stable identity of this implementation, independent of its type name.
    fn instance_code(&self) -> String;

    /// Baseline realization whose surface is scanned for extension points.
    fn default_realization(&self) -> Arc<dyn BusinessExt>;

    /// The wrapped instance when this is an interception wrapper.
    fn intercepted_target(&self) -> Option<Arc<dyn Ability>> {
        None
    }
}

/// Interception wrapper around an ability.
///
/// Only the contract interface is visible through the wrapper itself: its
/// default realization is a bare interface with no extension methods. Use
/// [`unwrap_intercepted`] to reach the true implementation.
pub struct Intercepted {
    target: Arc<dyn Ability>,
    contract: String,
}

impl Intercepted {
    pub fn new(target: Arc<dyn Ability>, contract: impl Into<String>) -> Self {
        Self {
            target,
            contract: contract.into(),
        }
    }

    pub fn target(&self) -> &Arc<dyn Ability> {
        &self.target
    }
}

impl Ability for Intercepted {
    fn instance_code(&self) -> String {
        self.target.instance_code()
    }

    fn default_realization(&self) -> Arc<dyn BusinessExt> {
        Arc::new(StaticExt::new(ExtSurface::new(
            self.contract.clone(),
            TypeKind::Interface,
        )))
    }

    fn intercepted_target(&self) -> Option<Arc<dyn Ability>> {
        Some(self.target.clone())
    }
}

/// Whether `ability` is an interception wrapper.
pub fn is_intercepted(ability: &dyn Ability) -> bool {
    ability.intercepted_target().is_some()
}

/// Peel every interception layer off `ability`.
pub fn unwrap_intercepted(ability: Arc<dyn Ability>) -> Arc<dyn Ability> {
    let mut current = ability;
    while let Some(inner) = current.intercepted_target() {
        current = inner;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Ability for Plain {
        fn instance_code(&self) -> String {
            "plain".to_string()
        }

        fn default_realization(&self) -> Arc<dyn BusinessExt> {
            Arc::new(StaticExt::new(ExtSurface::concrete("PlainExt")))
        }
    }

    #[test]
    fn test_derive_code_rejects_blank_and_illegal() {
        assert_eq!(
            AbilityDeclaration::new(" order ").derive_code("X").unwrap(),
            "order"
        );
        let err = AbilityDeclaration::new("  ").derive_code("X").unwrap_err();
        assert_eq!(err.code(), "LATTICE-CORE-RT-0005");
        assert!(AbilityDeclaration::new("bad code").derive_code("X").is_err());
    }

    #[test]
    fn test_assignability_and_simple_name() {
        let class = ClassDescriptor::concrete("com.acme.OrderAbility").implements("com.acme.IOrder");
        assert!(class.is_assignable_to("com.acme.IOrder"));
        assert!(class.is_assignable_to("com.acme.OrderAbility"));
        assert!(!class.is_assignable_to("com.acme.IPay"));
        assert_eq!(class.simple_name(), "OrderAbility");
        assert_eq!(simple_name("crate::ability::PayAbility"), "PayAbility");
    }

    #[test]
    fn test_markers_inherit_through_overrides() {
        let base = ExtSurface::new("BaseExt", TypeKind::Abstract)
            .method(ExtMethod::marked("calc", ExtensionMarker::new("X")))
            .method(ExtMethod::plain("helper"));
        let derived = ExtSurface::concrete("DerivedExt")
            .method(ExtMethod::plain("calc"))
            .method(ExtMethod::marked("check", ExtensionMarker::new("Y")))
            .extends(base);

        let methods = derived.resolved_methods();
        let names: Vec<&str> = methods.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["calc", "check", "helper"]);
        assert_eq!(methods[0].1.as_ref().unwrap().code, "X");
        assert_eq!(methods[1].1.as_ref().unwrap().code, "Y");
        assert!(methods[2].1.is_none());
    }

    #[test]
    fn test_unwrap_nested_interception() {
        let inner: Arc<dyn Ability> = Arc::new(Plain);
        let once: Arc<dyn Ability> = Arc::new(Intercepted::new(inner, "IOrder"));
        let twice: Arc<dyn Ability> = Arc::new(Intercepted::new(once, "IOrder"));

        assert!(is_intercepted(twice.as_ref()));
        assert_eq!(twice.instance_code(), "plain");
        assert_eq!(twice.default_realization().surface().kind, TypeKind::Interface);

        let unwrapped = unwrap_intercepted(twice);
        assert!(!is_intercepted(unwrapped.as_ref()));
        assert_eq!(unwrapped.default_realization().surface().type_name, "PlainExt");
    }
}
