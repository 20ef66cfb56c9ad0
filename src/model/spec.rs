//! Registered records: capabilities, their implementations, and the
//! extension points those implementations expose.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// How concurrent results of one extension point are combined.
///
/// Carried as an opaque dispatch hint; the combining itself happens in the
/// invocation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceType {
    /// No reduction; a single contribution is expected.
    #[default]
    None,
    /// First non-empty result wins.
    First,
    /// Merge every result.
    All,
    /// True when any contribution votes true.
    AnyMatch,
    /// True when every contribution votes true.
    AllMatch,
    /// True when no contribution votes true.
    NoneMatch,
}

/// Invocation shape of an extension point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolType {
    /// Synchronous, in-process call.
    #[default]
    Local,
    /// Fire-and-forget; the caller does not wait for a result.
    FireAndForget,
    /// Dispatched to a remote realization.
    Remote,
}

/// Reference to the contract method that declares an extension point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Realization type the method was found on.
    pub type_name: String,
    pub method_name: String,
}

/// One extension point of a capability.
///
/// Identity is the `(ability_code, code)` pair; every other field is
/// descriptive and ignored by `Eq`/`Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionSpec {
    pub ability_code: String,
    pub code: String,
    pub name: String,
    pub description: String,
    pub method: MethodRef,
    pub reduce_type: ReduceType,
    pub protocol_type: ProtocolType,
}

impl PartialEq for ExtensionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.ability_code == other.ability_code && self.code == other.code
    }
}

impl Eq for ExtensionSpec {}

impl Hash for ExtensionSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ability_code.hash(state);
        self.code.hash(state);
    }
}

/// One registered implementation of a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityInstSpec {
    /// Self-declared instance code.
    pub code: String,
    /// Fully qualified name of the implementing class.
    pub instance_class: String,
    /// Display name (simple class name).
    pub name: String,
    /// Lower value wins.
    pub priority: i32,
    pub extensions: HashSet<ExtensionSpec>,
}

impl AbilityInstSpec {
    /// Extension codes declared by this implementation, sorted.
    pub fn extension_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.extensions.iter().map(|e| e.code.as_str()).collect();
        codes.sort_unstable();
        codes
    }
}

/// A registered capability and its ranked implementations.
#[derive(Debug)]
pub struct AbilitySpec {
    pub code: String,
    pub parent: Option<String>,
    pub name: String,
    pub description: String,
    /// Contract type implementations must be assignable to.
    pub ability_class: String,
    instances: RwLock<Vec<Arc<AbilityInstSpec>>>,
}

impl AbilitySpec {
    pub fn new(code: impl Into<String>, ability_class: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            parent: None,
            name: String::new(),
            description: String::new(),
            ability_class: ability_class.into(),
            instances: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the implementations, in ranked order.
    pub fn instances(&self) -> Vec<Arc<AbilityInstSpec>> {
        self.instances.read().clone()
    }

    pub fn instance(&self, code: &str) -> Option<Arc<AbilityInstSpec>> {
        self.instances.read().iter().find(|i| i.code == code).cloned()
    }

    pub fn contains_instance(&self, code: &str) -> bool {
        self.instances.read().iter().any(|i| i.code == code)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.read().len()
    }

    /// Append `instance` unless its code is already present.
    ///
    /// The check and the append happen under one write lock, so concurrent
    /// discovery passes cannot both insert the same code. Returns `false`
    /// when the code was already registered.
    pub fn try_add_instance(&self, instance: Arc<AbilityInstSpec>) -> bool {
        let mut instances = self.instances.write();
        if instances.iter().any(|i| i.code == instance.code) {
            return false;
        }
        instances.push(instance);
        true
    }

    /// Stable ascending sort by priority; ties keep registration order.
    pub fn sort_instances(&self) {
        self.instances.write().sort_by_key(|i| i.priority);
    }
}
