//! # Ability registration
//!
//! Boot-time discovery, in two steps:
//!
//! 1. [`AbilityRegister::register`] walks the candidate classes, registers
//!    each declared capability in the [`AbilityIndex`](crate::cache::AbilityIndex)
//!    and resolves its implementations from the same candidate set.
//! 2. For every new implementation, [`scan_ability_extensions`] reads the
//!    extension points off its default realization; the records are attached
//!    to the implementation and unioned into the
//!    [`ExtensionIndex`](crate::cache::ExtensionIndex).
//!
//! ```text
//! ClassManifest ──► AbilityRegister ──► AbilityIndex (code → AbilitySpec)
//!                        │                    └─ AbilityInstSpec (ranked)
//!                        └─► scan_ability_extensions ──► ExtensionIndex
//! ```

pub mod ability;
pub mod extension;

pub use ability::{AbilityBuildRequest, AbilityRegister, DiscoveryReport, InstanceOutcome};
pub use extension::{scan_ability_extensions, scan_surface};
