//! Ability registration: resolves candidate classes into ranked,
//! deduplicated implementation records.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{AbilityIndex, ExtensionIndex};
use crate::config::DEFAULT_PRIORITY;
use crate::discovery::InstanceProvider;
use crate::error::{AggregateDiscoveryFailure, DiscoveryFailure, LatticeError, Result};
use crate::model::{unwrap_intercepted, AbilityInstSpec, AbilitySpec, ClassDescriptor};

use super::extension::scan_ability_extensions;

/// Input of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct AbilityBuildRequest {
    /// Candidate classes, in discovery order.
    pub classes: Vec<ClassDescriptor>,
    /// Only register capabilities whose parent is this code.
    pub parent: Option<String>,
}

impl AbilityBuildRequest {
    pub fn new(classes: Vec<ClassDescriptor>) -> Self {
        Self {
            classes,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Result of registering one candidate implementation.
#[derive(Debug, Clone)]
pub enum InstanceOutcome {
    /// A new implementation record was attached.
    Registered(Arc<AbilityInstSpec>),
    /// An implementation with the same instance code already exists. Not an
    /// error: repeated discovery passes converge here.
    AlreadyRegistered { code: String, class_name: String },
}

impl InstanceOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, InstanceOutcome::Registered(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, InstanceOutcome::AlreadyRegistered { .. })
    }

    /// Instance code the outcome refers to.
    pub fn code(&self) -> &str {
        match self {
            InstanceOutcome::Registered(spec) => &spec.code,
            InstanceOutcome::AlreadyRegistered { code, .. } => code,
        }
    }
}

/// What a successful discovery pass touched.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Capabilities declared by the candidate set, in discovery order.
    pub abilities: Vec<Arc<AbilitySpec>>,
    /// `(ability code, outcome)` for every candidate implementation attempted.
    pub outcomes: Vec<(String, InstanceOutcome)>,
}

impl DiscoveryReport {
    pub fn registered_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_registered()).count()
    }

    pub fn duplicate_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_duplicate()).count()
    }
}

/// Registers capabilities and their implementations into the indexes.
pub struct AbilityRegister<'a> {
    abilities: &'a AbilityIndex,
    extensions: &'a ExtensionIndex,
    provider: &'a dyn InstanceProvider,
    default_priority: i32,
}

impl<'a> AbilityRegister<'a> {
    pub fn new(
        abilities: &'a AbilityIndex,
        extensions: &'a ExtensionIndex,
        provider: &'a dyn InstanceProvider,
    ) -> Self {
        Self {
            abilities,
            extensions,
            provider,
            default_priority: DEFAULT_PRIORITY,
        }
    }

    /// Priority for implementations without an override.
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Run one discovery pass over `request.classes`.
    ///
    /// Every class carrying an ability declaration registers its capability
    /// and has its implementations resolved from the whole candidate set,
    /// once per capability code even when several classes declare it.
    /// Per-class failures are collected; when any occurred the pass ends
    /// with one aggregate `Discovery` error after every candidate was tried.
    pub fn register(&self, request: &AbilityBuildRequest) -> Result<DiscoveryReport> {
        let mut failures = AggregateDiscoveryFailure::new();
        let mut report = DiscoveryReport::default();
        let mut resolved: HashSet<String> = HashSet::new();

        for class in &request.classes {
            let Some(declaration) = class.ability.as_ref() else {
                continue;
            };
            if let Some(parent) = request.parent.as_deref() {
                if declaration.parent.as_deref() != Some(parent) {
                    continue;
                }
            }

            let spec = match self.abilities.register(declaration, &class.name) {
                Ok(spec) => spec,
                Err(cause) => {
                    log::error!("Skipping ability declared on {}: {}", class.name, cause);
                    failures.push(DiscoveryFailure {
                        ability_code: declaration.code.clone(),
                        class_name: class.name.clone(),
                        cause,
                    });
                    continue;
                }
            };
            if !report.abilities.iter().any(|a| Arc::ptr_eq(a, &spec)) {
                report.abilities.push(spec.clone());
            }
            if !resolved.insert(spec.code.clone()) {
                continue;
            }

            let outcomes = self.resolve_instances(&spec, &request.classes, &mut failures);
            report
                .outcomes
                .extend(outcomes.into_iter().map(|o| (spec.code.clone(), o)));
        }

        log::info!(
            "Ability discovery: {} abilities, {} instances registered, {} already registered, {} failed",
            report.abilities.len(),
            report.registered_count(),
            report.duplicate_count(),
            failures.len()
        );
        failures.into_result()?;
        Ok(report)
    }

    /// Resolve the implementations of `spec` from `classes`.
    pub fn register_instances(
        &self,
        spec: &AbilitySpec,
        classes: &[ClassDescriptor],
    ) -> Result<Vec<InstanceOutcome>> {
        let mut failures = AggregateDiscoveryFailure::new();
        let outcomes = self.resolve_instances(spec, classes, &mut failures);
        failures.into_result()?;
        Ok(outcomes)
    }

    fn resolve_instances(
        &self,
        spec: &AbilitySpec,
        classes: &[ClassDescriptor],
        failures: &mut AggregateDiscoveryFailure,
    ) -> Vec<InstanceOutcome> {
        let mut outcomes = Vec::new();
        for class in classes {
            if !class.kind.is_concrete() || !class.is_assignable_to(&spec.ability_class) {
                continue;
            }
            match self.register_instance(spec, class) {
                Ok(outcome) => outcomes.push(outcome),
                Err(cause) => {
                    log::error!(
                        "Failed to register ability instance {} for {}: {}",
                        class.name,
                        spec.code,
                        cause
                    );
                    failures.push(DiscoveryFailure {
                        ability_code: spec.code.clone(),
                        class_name: class.name.clone(),
                        cause,
                    });
                }
            }
        }
        spec.sort_instances();
        outcomes
    }

    /// Register a single concrete implementation class of `spec`.
    pub fn register_instance(
        &self,
        spec: &AbilitySpec,
        class: &ClassDescriptor,
    ) -> Result<InstanceOutcome> {
        let instance = self
            .provider
            .instantiate(class)
            .map_err(|source| LatticeError::Materialize {
                class_name: class.name.clone(),
                source,
            })?;
        // Extensions live on the true implementation, not on the wrapper.
        let origin = unwrap_intercepted(instance);

        let code = origin.instance_code().trim().to_string();
        if code.is_empty() {
            return Err(LatticeError::EmptyInstanceCode {
                class_name: class.name.clone(),
            });
        }
        if spec.contains_instance(&code) {
            log::debug!("Ability instance {} already registered for {}", code, spec.code);
            return Ok(InstanceOutcome::AlreadyRegistered {
                code,
                class_name: class.name.clone(),
            });
        }

        let extensions = scan_ability_extensions(origin.as_ref(), &class.name, spec)?;
        let instance_spec = Arc::new(AbilityInstSpec {
            code: code.clone(),
            instance_class: class.name.clone(),
            name: class.simple_name().to_string(),
            priority: class.priority.unwrap_or(self.default_priority),
            extensions,
        });

        if !spec.try_add_instance(instance_spec.clone()) {
            return Ok(InstanceOutcome::AlreadyRegistered {
                code,
                class_name: class.name.clone(),
            });
        }
        self.extensions
            .merge(&code, instance_spec.extensions.iter().cloned());
        log::debug!(
            "Registered ability instance {} ({}) for {} with {} extension(s)",
            code,
            class.name,
            spec.code,
            instance_spec.extensions.len()
        );
        Ok(InstanceOutcome::Registered(instance_spec))
    }
}
