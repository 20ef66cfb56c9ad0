//! # Data model
//!
//! Types shared by discovery and session resolution:
//!
//! - [`ability`] — capability markers, class descriptors, the [`Ability`]
//!   contract, extension surfaces and interception wrappers
//! - [`spec`] — registered records ([`AbilitySpec`], [`AbilityInstSpec`],
//!   [`ExtensionSpec`])
//! - [`business`] — business objects, scenario requests, business configuration
//! - [`template`] — use-cases and products

pub mod ability;
pub mod business;
pub mod spec;
pub mod template;

pub use ability::{
    is_intercepted, unwrap_intercepted, Ability, AbilityConstructor, AbilityDeclaration,
    BusinessExt, ClassDescriptor, ExtMethod, ExtSurface, ExtensionMarker, Intercepted, StaticExt,
    TypeKind,
};
pub use business::{BizObject, BusinessConfig, ProductConfig, ScenarioRequest};
pub use spec::{AbilityInstSpec, AbilitySpec, ExtensionSpec, MethodRef, ProtocolType, ReduceType};
pub use template::{ProductSpec, Template, TemplateFactory, TemplateKind, TemplateSpec, UseCaseSpec};
