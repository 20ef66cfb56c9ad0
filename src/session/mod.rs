//! # Session scopes
//!
//! Request-time resolution of which templates apply to a set of business
//! objects. State is carried on an explicit [`RequestContext`], one per
//! logical execution:
//!
//! ```text
//! RequestContext ──enter──► SessionGuard (derefs to RequestContext)
//!   ├─ invoke cache       created by the outermost scope, dropped by it
//!   └─ session context    biz code → priority-ordered templates
//! ```
//!
//! Nested scopes share the invoke cache; each exit restores the session
//! context that was active before it was entered.

pub mod context;
pub mod scope;

pub use context::{BizSessionContext, RequestContext, SESSION_CACHE_KEY, SESSION_CACHE_NAMESPACE};
pub use scope::{BizSessionScope, DefaultScenarioBuilder, ScenarioBuilder, SessionGuard};
