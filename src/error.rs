//! Lattice runtime errors.
//!
//! Every fatal error renders with a stable `LATTICE-CORE-RT-NNNN` code
//! followed by the offending class name or business code, so operators can
//! act on the message alone.

use std::fmt;

use thiserror::Error;

/// Broad category of a [`LatticeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed declarations or missing configuration. Never retried.
    Configuration,
    /// One or more candidates failed during a discovery pass.
    Discovery,
    /// A business object could not produce a usable scenario.
    Scenario,
    /// Reading or parsing configuration from disk failed.
    Io,
}

/// Errors raised by ability discovery and session resolution.
#[derive(Debug, Error)]
pub enum LatticeError {
    /// A discovery pass finished with per-candidate failures.
    #[error("[LATTICE-CORE-RT-0001] {0}")]
    Discovery(AggregateDiscoveryFailure),

    /// The object factory could not produce an ability instance.
    #[error("[LATTICE-CORE-RT-0002] failed to materialize ability instance for class {class_name}: {source}")]
    Materialize {
        class_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// An ability instance declared a blank instance code.
    #[error("[LATTICE-CORE-RT-0003] ability instance {class_name} declares an empty instance code")]
    EmptyInstanceCode { class_name: String },

    /// An ability declaration cannot yield a capability code.
    #[error("[LATTICE-CORE-RT-0005] malformed ability declaration on class {class_name}: {reason}")]
    MalformedAbility { class_name: String, reason: String },

    /// A session scope was opened without business objects.
    #[error("[LATTICE-CORE-RT-0010] the business object set of a session scope must not be empty")]
    EmptyBizObjectSet,

    /// A business object produced no scenario request.
    #[error("[LATTICE-CORE-RT-0011] failed to build scenario request for business object with bizCode {biz_code}")]
    MissingScenarioContext { biz_code: String },

    /// No business configuration exists and simple mode is off.
    #[error("[LATTICE-CORE-RT-0012] business config not found for bizCode {biz_code}")]
    UnknownBusinessConfig { biz_code: String },

    /// A scenario request carries a blank business code.
    #[error("[LATTICE-CORE-RT-0014] business object has an empty bizCode")]
    EmptyBizCode,

    /// The default realization is an anonymous type or a bare interface.
    #[error("[LATTICE-CORE-RT-0022] default realization {type_name} of ability instance {class_name} must be a named concrete type")]
    AnonymousRealization {
        class_name: String,
        type_name: String,
    },

    /// A realization declaration is unusable.
    #[error("[LATTICE-CORE-RT-0030] invalid realization {class_name}: {reason}")]
    InvalidRealization { class_name: String, reason: String },

    /// Configuration value is invalid.
    #[error("[LATTICE-CORE-RT-0040] configuration error: {0}")]
    Config(String),

    /// YAML parsing failed.
    #[error("[LATTICE-CORE-RT-0040] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O failed.
    #[error("[LATTICE-CORE-RT-0040] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LatticeError {
    /// Stable machine-readable code, e.g. `LATTICE-CORE-RT-0012`.
    pub fn code(&self) -> &'static str {
        match self {
            LatticeError::Discovery(_) => "LATTICE-CORE-RT-0001",
            LatticeError::Materialize { .. } => "LATTICE-CORE-RT-0002",
            LatticeError::EmptyInstanceCode { .. } => "LATTICE-CORE-RT-0003",
            LatticeError::MalformedAbility { .. } => "LATTICE-CORE-RT-0005",
            LatticeError::EmptyBizObjectSet => "LATTICE-CORE-RT-0010",
            LatticeError::MissingScenarioContext { .. } => "LATTICE-CORE-RT-0011",
            LatticeError::UnknownBusinessConfig { .. } => "LATTICE-CORE-RT-0012",
            LatticeError::EmptyBizCode => "LATTICE-CORE-RT-0014",
            LatticeError::AnonymousRealization { .. } => "LATTICE-CORE-RT-0022",
            LatticeError::InvalidRealization { .. } => "LATTICE-CORE-RT-0030",
            LatticeError::Config(_) | LatticeError::Yaml(_) | LatticeError::Io(_) => {
                "LATTICE-CORE-RT-0040"
            }
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LatticeError::Discovery(_) | LatticeError::Materialize { .. } => ErrorKind::Discovery,
            LatticeError::MissingScenarioContext { .. } | LatticeError::EmptyBizCode => {
                ErrorKind::Scenario
            }
            LatticeError::Config(_) | LatticeError::Yaml(_) | LatticeError::Io(_) => ErrorKind::Io,
            LatticeError::EmptyInstanceCode { .. }
            | LatticeError::MalformedAbility { .. }
            | LatticeError::EmptyBizObjectSet
            | LatticeError::UnknownBusinessConfig { .. }
            | LatticeError::AnonymousRealization { .. }
            | LatticeError::InvalidRealization { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether this is a fatal configuration error.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LatticeError>;

/// One candidate class that failed during a discovery pass.
#[derive(Debug)]
pub struct DiscoveryFailure {
    /// Capability the candidate was being registered against.
    pub ability_code: String,
    /// Fully qualified name of the candidate class.
    pub class_name: String,
    /// Underlying cause.
    pub cause: LatticeError,
}

impl fmt::Display for DiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ability {} / class {}: {}",
            self.ability_code, self.class_name, self.cause
        )
    }
}

/// Every failure collected during one discovery pass.
#[derive(Debug, Default)]
pub struct AggregateDiscoveryFailure {
    failures: Vec<DiscoveryFailure>,
}

impl AggregateDiscoveryFailure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, failure: DiscoveryFailure) {
        self.failures.push(failure);
    }

    /// Collected failures, in the order the candidates were attempted.
    pub fn failures(&self) -> &[DiscoveryFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` when nothing failed, the aggregate error otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(LatticeError::Discovery(self))
        }
    }
}

impl fmt::Display for AggregateDiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ability instance(s) failed to register",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_rendered_in_messages() {
        let err = LatticeError::UnknownBusinessConfig {
            biz_code: "B1".to_string(),
        };
        assert_eq!(err.code(), "LATTICE-CORE-RT-0012");
        assert!(err.to_string().starts_with("[LATTICE-CORE-RT-0012]"));
        assert!(err.to_string().contains("B1"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_materialize_keeps_source() {
        let err = LatticeError::Materialize {
            class_name: "com.acme.OrderAbility".to_string(),
            source: anyhow::anyhow!("no constructor"),
        };
        assert_eq!(err.kind(), ErrorKind::Discovery);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("com.acme.OrderAbility"));
    }

    #[test]
    fn test_aggregate_lists_every_failure() {
        let mut agg = AggregateDiscoveryFailure::new();
        assert!(agg.is_empty());
        agg.push(DiscoveryFailure {
            ability_code: "order".to_string(),
            class_name: "A".to_string(),
            cause: LatticeError::EmptyInstanceCode {
                class_name: "A".to_string(),
            },
        });
        agg.push(DiscoveryFailure {
            ability_code: "order".to_string(),
            class_name: "B".to_string(),
            cause: LatticeError::AnonymousRealization {
                class_name: "B".to_string(),
                type_name: "B$1".to_string(),
            },
        });

        let err = agg.into_result().unwrap_err();
        assert_eq!(err.code(), "LATTICE-CORE-RT-0001");
        let text = err.to_string();
        assert!(text.contains("2 ability instance(s)"));
        assert!(text.contains("LATTICE-CORE-RT-0003"));
        assert!(text.contains("LATTICE-CORE-RT-0022"));
    }
}
