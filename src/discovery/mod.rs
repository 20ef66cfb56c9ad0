//! # Discovery seams
//!
//! Enumerating candidate classes and materializing instances belong to the
//! host (a build-time manifest, a plugin loader, a DI container). The
//! resolver only sees these two traits:
//!
//! - [`CandidateSource`] — the raw class universe
//! - [`InstanceProvider`] — turns a class descriptor into a live instance
//!
//! [`ClassManifest`] implements both from an explicit list of descriptors,
//! each carrying its own constructor.

use std::sync::Arc;

use anyhow::anyhow;

use crate::model::{Ability, ClassDescriptor};

/// Supplies the candidate classes for a discovery pass.
pub trait CandidateSource {
    /// Candidates in a deterministic order.
    fn enumerate_candidates(&self) -> Vec<ClassDescriptor>;
}

/// Materializes ability instances from class descriptors.
pub trait InstanceProvider: Send + Sync {
    fn instantiate(&self, class: &ClassDescriptor) -> anyhow::Result<Arc<dyn Ability>>;
}

/// Materializes instances through the constructor attached to each descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorProvider;

impl InstanceProvider for ConstructorProvider {
    fn instantiate(&self, class: &ClassDescriptor) -> anyhow::Result<Arc<dyn Ability>> {
        let constructor = class
            .constructor()
            .ok_or_else(|| anyhow!("no constructor registered for {}", class.name))?;
        constructor()
    }
}

/// An explicit, ordered list of candidate classes.
#[derive(Debug, Default, Clone)]
pub struct ClassManifest {
    classes: Vec<ClassDescriptor>,
}

impl ClassManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style add.
    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.add(class);
        self
    }

    /// Add a class. A later descriptor with the same name replaces the earlier one
    /// in place, keeping the manifest order stable.
    pub fn add(&mut self, class: ClassDescriptor) {
        match self.classes.iter_mut().find(|c| c.name == class.name) {
            Some(existing) => *existing = class,
            None => self.classes.push(class),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl CandidateSource for ClassManifest {
    fn enumerate_candidates(&self) -> Vec<ClassDescriptor> {
        self.classes.clone()
    }
}

impl InstanceProvider for ClassManifest {
    fn instantiate(&self, class: &ClassDescriptor) -> anyhow::Result<Arc<dyn Ability>> {
        ConstructorProvider.instantiate(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BusinessExt, ExtSurface, StaticExt, TypeKind};

    struct Noop;

    impl Ability for Noop {
        fn instance_code(&self) -> String {
            "noop".to_string()
        }

        fn default_realization(&self) -> Arc<dyn BusinessExt> {
            Arc::new(StaticExt::new(ExtSurface::concrete("NoopExt")))
        }
    }

    #[test]
    fn test_manifest_replaces_same_name_in_place() {
        let manifest = ClassManifest::new()
            .with_class(ClassDescriptor::concrete("A"))
            .with_class(ClassDescriptor::concrete("B"))
            .with_class(ClassDescriptor::new("A", TypeKind::Abstract));

        let names: Vec<&str> = manifest.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(manifest.get("A").unwrap().kind, TypeKind::Abstract);
        assert_eq!(manifest.enumerate_candidates().len(), 2);
    }

    #[test]
    fn test_constructor_provider() {
        let with_ctor = ClassDescriptor::concrete("Noop")
            .with_constructor(|| Ok(Arc::new(Noop) as Arc<dyn Ability>));
        let instance = ConstructorProvider.instantiate(&with_ctor).unwrap();
        assert_eq!(instance.instance_code(), "noop");

        let without = ClassDescriptor::concrete("Missing");
        let err = ConstructorProvider.instantiate(&without).err().unwrap();
        assert!(err.to_string().contains("Missing"));
    }
}
