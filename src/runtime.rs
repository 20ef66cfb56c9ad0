//! The Lattice runtime: one explicit registry value owning every index.
//!
//! Construct it once at boot, run discovery, register templates and
//! realizations, then share it (typically behind an `Arc`) with request
//! handlers that open session scopes against it.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::business::{BusinessConfigSource, BusinessConfigStore, TemplateRegistry};
use crate::cache::{AbilityIndex, ExtensionIndex, RegisteredExtension};
use crate::config::LatticeConfig;
use crate::discovery::{CandidateSource, InstanceProvider};
use crate::error::Result;
use crate::model::{
    AbilitySpec, BizObject, BusinessConfig, ProductConfig, ProductSpec, TemplateSpec, UseCaseSpec,
};
use crate::realization::{RealizationIndex, RealizationSpec};
use crate::register::{AbilityBuildRequest, AbilityRegister, DiscoveryReport};
use crate::session::{BizSessionScope, ScenarioBuilder};

/// Capability registry and resolution runtime.
pub struct Lattice {
    config: LatticeConfig,
    abilities: AbilityIndex,
    extensions: ExtensionIndex,
    templates: RwLock<TemplateRegistry>,
    realizations: RealizationIndex,
    business_configs: Box<dyn BusinessConfigSource>,
}

impl Lattice {
    /// Empty runtime with an empty in-memory business configuration store.
    pub fn new(config: LatticeConfig) -> Self {
        Self {
            config,
            abilities: AbilityIndex::new(),
            extensions: ExtensionIndex::new(),
            templates: RwLock::new(TemplateRegistry::new()),
            realizations: RealizationIndex::new(),
            business_configs: Box::new(BusinessConfigStore::new()),
        }
    }

    /// Runtime whose business configuration is loaded from
    /// `config.business_config_paths`.
    pub fn from_config(config: LatticeConfig) -> Result<Self> {
        let store = BusinessConfigStore::new();
        for path in &config.business_config_paths {
            let count = store.load_path(path)?;
            log::info!(
                "Loaded {} business config(s) from {}",
                count,
                path.display()
            );
        }
        Ok(Self::new(config).with_business_configs(store))
    }

    /// Replace the business configuration source.
    pub fn with_business_configs(mut self, source: impl BusinessConfigSource + 'static) -> Self {
        self.business_configs = Box::new(source);
        self
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn is_simple_mode(&self) -> bool {
        self.config.simple_mode
    }

    // ---- discovery ----

    /// Discover every ability declared by `source`'s candidates.
    pub fn discover(
        &self,
        source: &dyn CandidateSource,
        provider: &dyn InstanceProvider,
    ) -> Result<DiscoveryReport> {
        let request = AbilityBuildRequest::new(source.enumerate_candidates());
        self.register_abilities(&request, provider)
    }

    /// Run one discovery pass over an explicit build request.
    pub fn register_abilities(
        &self,
        request: &AbilityBuildRequest,
        provider: &dyn InstanceProvider,
    ) -> Result<DiscoveryReport> {
        AbilityRegister::new(&self.abilities, &self.extensions, provider)
            .with_default_priority(self.config.default_priority)
            .register(request)
    }

    pub fn ability(&self, code: &str) -> Option<Arc<AbilitySpec>> {
        self.abilities.get(code)
    }

    /// Every registered ability, sorted by code.
    pub fn abilities(&self) -> Vec<Arc<AbilitySpec>> {
        self.abilities.list()
    }

    pub fn ability_index(&self) -> &AbilityIndex {
        &self.abilities
    }

    /// Every implementation record declaring extension `code`.
    pub fn extensions(&self, code: &str) -> Vec<RegisteredExtension> {
        self.extensions.get(code)
    }

    pub fn extension_index(&self) -> &ExtensionIndex {
        &self.extensions
    }

    // ---- templates ----

    pub fn register_template(&self, template: TemplateSpec) {
        self.templates.write().register(template);
    }

    pub fn all_registered_use_cases(&self) -> Vec<UseCaseSpec> {
        self.templates.read().use_cases().to_vec()
    }

    pub fn all_registered_products(&self) -> Vec<ProductSpec> {
        self.templates.read().products().to_vec()
    }

    pub fn registered_product_by_code(&self, code: &str) -> Option<ProductSpec> {
        self.templates.read().product_by_code(code).cloned()
    }

    // ---- realizations ----

    pub fn register_realization(&self, spec: RealizationSpec) -> Result<()> {
        self.realizations.register(spec)
    }

    /// Realizations serving `biz_code` under `scenario`, scenario-specific first.
    pub fn realizations(&self, biz_code: &str, scenario: Option<&str>) -> Vec<RealizationSpec> {
        self.realizations.find(biz_code, scenario)
    }

    // ---- business configuration ----

    pub fn business_config(&self, biz_code: &str) -> Option<BusinessConfig> {
        self.business_configs.business_config(biz_code)
    }

    pub fn installed_products(&self, config: &BusinessConfig) -> Vec<ProductConfig> {
        self.business_configs.installed_products(config)
    }

    // ---- sessions ----

    /// Session scope over `biz_objects`; see [`BizSessionScope::enter`].
    pub fn open_session<'l>(
        &'l self,
        biz_objects: Vec<Arc<dyn BizObject>>,
        builder: impl ScenarioBuilder + 'l,
    ) -> Result<BizSessionScope<'l>> {
        BizSessionScope::new(self, biz_objects, builder)
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::new(LatticeConfig::default())
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lattice")
            .field("config", &self.config)
            .field("abilities", &self.abilities.len())
            .field("extensions", &self.extensions.len())
            .field("templates", &self.templates.read().len())
            .field("realizations", &self.realizations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ClassManifest;
    use crate::model::{
        Ability, AbilityDeclaration, BusinessExt, ClassDescriptor, ExtMethod, ExtSurface,
        ExtensionMarker, StaticExt, Template, TypeKind,
    };
    use crate::session::{DefaultScenarioBuilder, RequestContext};

    struct Pricing {
        code: &'static str,
    }

    impl Ability for Pricing {
        fn instance_code(&self) -> String {
            self.code.to_string()
        }

        fn default_realization(&self) -> Arc<dyn BusinessExt> {
            Arc::new(StaticExt::new(
                ExtSurface::concrete("com.acme.PricingExt")
                    .method(ExtMethod::marked("discount", ExtensionMarker::new("pricing.discount"))),
            ))
        }
    }

    fn manifest() -> ClassManifest {
        ClassManifest::new()
            .with_class(
                ClassDescriptor::new("com.acme.PricingAbility", TypeKind::Abstract)
                    .declares(AbilityDeclaration::new("pricing")),
            )
            .with_class(
                ClassDescriptor::concrete("com.acme.RetailPricing")
                    .implements("com.acme.PricingAbility")
                    .with_constructor(|| Ok(Arc::new(Pricing { code: "retail" }) as Arc<dyn Ability>)),
            )
            .with_class(
                ClassDescriptor::concrete("com.acme.B2bPricing")
                    .implements("com.acme.PricingAbility")
                    .with_priority(10)
                    .with_constructor(|| Ok(Arc::new(Pricing { code: "b2b" }) as Arc<dyn Ability>)),
            )
    }

    #[derive(Default)]
    struct Always;

    impl Template for Always {
        fn is_effect(&self, _request: &crate::model::ScenarioRequest) -> bool {
            true
        }
    }

    struct Cart;

    impl BizObject for Cart {
        fn biz_code(&self) -> &str {
            "retail"
        }
    }

    #[test]
    fn test_discover_uses_configured_default_priority() {
        let config = LatticeConfig {
            default_priority: 5,
            ..LatticeConfig::default()
        };
        let lattice = Lattice::new(config);
        let manifest = manifest();

        let report = lattice.discover(&manifest, &manifest).unwrap();
        assert_eq!(report.registered_count(), 2);

        let pricing = lattice.ability("pricing").unwrap();
        let ranked: Vec<(String, i32)> = pricing
            .instances()
            .iter()
            .map(|i| (i.code.clone(), i.priority))
            .collect();
        assert_eq!(ranked, vec![("retail".to_string(), 5), ("b2b".to_string(), 10)]);
        assert_eq!(lattice.abilities().len(), 1);
        assert_eq!(lattice.extensions("pricing.discount").len(), 2);
    }

    #[test]
    fn test_from_config_loads_business_configs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("retail.yaml"),
            "business:\n  biz_code: retail\n  products:\n    - code: gift_wrap\n",
        )
        .unwrap();

        let config = LatticeConfig {
            business_config_paths: vec![dir.path().to_path_buf()],
            ..LatticeConfig::default()
        };
        let lattice = Lattice::from_config(config).unwrap();
        lattice.register_template(TemplateSpec::product("gift_wrap").with_template::<Always>());
        lattice.register_template(TemplateSpec::product("bulk_price").with_template::<Always>());

        let retail = lattice.business_config("retail").unwrap();
        assert!(retail.is_installed("gift_wrap"));
        assert!(lattice.registered_product_by_code("bulk_price").is_some());

        let scope = lattice
            .open_session(vec![Arc::new(Cart) as Arc<dyn BizObject>], DefaultScenarioBuilder)
            .unwrap();
        let mut ctx = RequestContext::new();
        let installed = scope
            .run(&mut ctx, |ctx| {
                ctx.effective_templates("retail")
                    .iter()
                    .map(|t| t.code.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(installed, vec!["gift_wrap"]);
    }

    #[test]
    fn test_realizations_through_runtime() {
        let lattice = Lattice::default();
        lattice
            .register_realization(RealizationSpec::new("com.acme.RetailExt", vec!["retail"]))
            .unwrap();
        assert!(lattice
            .register_realization(RealizationSpec::new("com.acme.Empty", Vec::<String>::new()))
            .is_err());
        assert_eq!(lattice.realizations("retail", None).len(), 1);
        assert!(!lattice.is_simple_mode());
    }
}
