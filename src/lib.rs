//! # Lattice
//!
//! Capability resolution engine for extensible business platforms.
//!
//! Independently built implementations of a named *ability* register
//! themselves at boot, are ranked by priority and deduplicated by instance
//! code, and expose *extension points* that are indexed by code. At request
//! time a *session scope* resolves, per business object, the ordered list of
//! templates (use-cases and installed products) that apply to it.
//!
//! ```text
//! boot:     ClassManifest ──► Lattice::discover ──► AbilityIndex + ExtensionIndex
//! request:  RequestContext ──► BizSessionScope::enter ──► effective templates
//! ```
//!
//! ```no_run
//! use std::sync::Arc;
//! use lattice::{
//!     BizObject, ClassManifest, DefaultScenarioBuilder, Lattice, LatticeConfig, RequestContext,
//! };
//!
//! struct Order;
//!
//! impl BizObject for Order {
//!     fn biz_code(&self) -> &str {
//!         "retail"
//!     }
//! }
//!
//! # fn main() -> lattice::Result<()> {
//! let lattice = Lattice::from_config(LatticeConfig::from_env()?)?;
//! let manifest = ClassManifest::new();
//! lattice.discover(&manifest, &manifest)?;
//!
//! let scope = lattice.open_session(vec![Arc::new(Order) as Arc<dyn BizObject>], DefaultScenarioBuilder)?;
//! let mut ctx = RequestContext::new();
//! let guard = scope.enter(&mut ctx)?;
//! for template in guard.effective_templates("retail") {
//!     println!("{} ({})", template.code, template.priority);
//! }
//! # Ok(())
//! # }
//! ```

pub mod business;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod realization;
pub mod register;
pub mod runtime;
pub mod session;

pub use business::{BusinessConfigSource, BusinessConfigStore, TemplateRegistry};
pub use cache::{AbilityIndex, ExtensionIndex, InvokeCache, RegisteredExtension};
pub use config::{LatticeConfig, DEFAULT_PRIORITY};
pub use discovery::{CandidateSource, ClassManifest, ConstructorProvider, InstanceProvider};
pub use error::{ErrorKind, LatticeError, Result};
pub use model::{
    Ability, AbilityDeclaration, AbilityInstSpec, AbilitySpec, BizObject, BusinessConfig,
    BusinessExt, ClassDescriptor, ExtensionSpec, ProductConfig, ProductSpec, ScenarioRequest,
    Template, TemplateSpec, TypeKind, UseCaseSpec,
};
pub use realization::{RealizationIndex, RealizationSpec};
pub use register::{AbilityBuildRequest, AbilityRegister, DiscoveryReport, InstanceOutcome};
pub use runtime::Lattice;
pub use session::{
    BizSessionContext, BizSessionScope, DefaultScenarioBuilder, RequestContext, ScenarioBuilder,
    SessionGuard,
};
