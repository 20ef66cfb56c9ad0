//! Business configuration and the global template registry.

pub mod config;
pub mod template;

pub use config::{BusinessConfigSource, BusinessConfigStore};
pub use template::TemplateRegistry;
