//! In-memory indexes and caches.
//!
//! [`AbilityIndex`] and [`ExtensionIndex`] are process-lifetime: populated
//! during discovery, read-only afterwards. [`InvokeCache`] lives for one
//! logical execution and is owned by its outermost session scope.

pub mod ability;
pub mod extension;
pub mod invoke;

pub use ability::AbilityIndex;
pub use extension::{ExtensionIndex, RegisteredExtension};
pub use invoke::InvokeCache;
