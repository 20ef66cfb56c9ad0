//! Extension scanning.
//!
//! Extension points are read from the *default realization* of an ability
//! instance, never from the instance's own type: the realization is the
//! baseline object whose marked methods implementations customise.

use std::collections::HashSet;

use crate::error::{LatticeError, Result};
use crate::model::{Ability, AbilitySpec, ExtSurface, ExtensionSpec, MethodRef};

/// Scan the extension points declared by `ability`'s default realization.
///
/// `class_name` names the implementation in error messages. Fails with
/// `AnonymousRealization` when the realization's runtime type is anonymous
/// or a bare interface, since extension records need a stable method
/// reference.
pub fn scan_ability_extensions(
    ability: &dyn Ability,
    class_name: &str,
    spec: &AbilitySpec,
) -> Result<HashSet<ExtensionSpec>> {
    let surface = ability.default_realization().surface();
    if !surface.kind.is_addressable() {
        return Err(LatticeError::AnonymousRealization {
            class_name: class_name.to_string(),
            type_name: surface.type_name,
        });
    }
    Ok(scan_surface(&surface, spec))
}

/// Build one extension record per marked method visible on `surface`.
/// Markers inherited from ancestor methods count.
pub fn scan_surface(surface: &ExtSurface, spec: &AbilitySpec) -> HashSet<ExtensionSpec> {
    let mut extensions = HashSet::new();
    for (method_name, marker) in surface.resolved_methods() {
        let Some(marker) = marker else {
            continue;
        };
        if marker.code.trim().is_empty() {
            log::warn!(
                "Ignoring extension marker with empty code on {}::{}",
                surface.type_name,
                method_name
            );
            continue;
        }
        extensions.insert(ExtensionSpec {
            ability_code: spec.code.clone(),
            code: marker.code,
            name: marker.name,
            description: marker.description,
            method: MethodRef {
                type_name: surface.type_name.clone(),
                method_name,
            },
            reduce_type: marker.reduce_type,
            protocol_type: marker.protocol_type,
        });
    }
    extensions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::model::{
        BusinessExt, ExtMethod, ExtensionMarker, ReduceType, StaticExt, TypeKind,
    };

    struct WithRealization(ExtSurface);

    impl Ability for WithRealization {
        fn instance_code(&self) -> String {
            "with_realization".to_string()
        }

        fn default_realization(&self) -> Arc<dyn BusinessExt> {
            Arc::new(StaticExt::new(self.0.clone()))
        }
    }

    fn spec() -> AbilitySpec {
        AbilitySpec::new("order", "com.acme.IOrder")
    }

    #[test]
    fn test_scan_builds_one_record_per_marked_method() {
        let surface = ExtSurface::concrete("OrderExt")
            .method(ExtMethod::marked(
                "calcPrice",
                ExtensionMarker::new("order.price").with_reduce_type(ReduceType::First),
            ))
            .method(ExtMethod::marked("check", ExtensionMarker::new("order.check")))
            .method(ExtMethod::plain("toString"));

        let found = scan_ability_extensions(&WithRealization(surface), "OrderAbility", &spec()).unwrap();
        assert_eq!(found.len(), 2);

        let price = found.iter().find(|e| e.code == "order.price").unwrap();
        assert_eq!(price.ability_code, "order");
        assert_eq!(price.method.type_name, "OrderExt");
        assert_eq!(price.method.method_name, "calcPrice");
        assert_eq!(price.reduce_type, ReduceType::First);
    }

    #[test]
    fn test_duplicate_codes_collapse() {
        let surface = ExtSurface::concrete("OrderExt")
            .method(ExtMethod::marked("a", ExtensionMarker::new("X")))
            .method(ExtMethod::marked("b", ExtensionMarker::new("X")));
        let found = scan_ability_extensions(&WithRealization(surface), "OrderAbility", &spec()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_inherited_markers_count() {
        let base = ExtSurface::new("BaseOrderExt", TypeKind::Abstract)
            .method(ExtMethod::marked("calc", ExtensionMarker::new("X")));
        let surface = ExtSurface::concrete("OrderExt")
            .method(ExtMethod::plain("calc"))
            .extends(base);

        let found = scan_ability_extensions(&WithRealization(surface), "OrderAbility", &spec()).unwrap();
        let only = found.iter().next().unwrap();
        assert_eq!(only.code, "X");
        assert_eq!(only.method.type_name, "OrderExt");
    }

    #[test]
    fn test_anonymous_and_interface_realizations_are_fatal() {
        for kind in [TypeKind::Anonymous, TypeKind::Interface] {
            let surface = ExtSurface::new("OrderAbility$1", kind)
                .method(ExtMethod::marked("calc", ExtensionMarker::new("X")));
            let err = scan_ability_extensions(&WithRealization(surface), "OrderAbility", &spec())
                .unwrap_err();
            assert_eq!(err.code(), "LATTICE-CORE-RT-0022");
            assert!(err.to_string().contains("OrderAbility$1"));
        }
    }
}
