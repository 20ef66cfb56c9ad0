//! Request-scoped state carried explicitly through one logical execution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::InvokeCache;
use crate::model::TemplateSpec;

/// Invoke cache namespace under which the active session context is published.
pub const SESSION_CACHE_NAMESPACE: &str = "BizSessionContext";
/// Invoke cache key of the active session context.
pub const SESSION_CACHE_KEY: &str = "current";

/// Resolved templates of one session scope, keyed by business code.
#[derive(Debug, Clone)]
pub struct BizSessionContext {
    pub session_id: Uuid,
    pub opened_at: DateTime<Utc>,
    effective_templates: HashMap<String, Vec<TemplateSpec>>,
}

impl BizSessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            opened_at: Utc::now(),
            effective_templates: HashMap::new(),
        }
    }

    /// Priority-ordered templates effective for `biz_code`.
    pub fn effective_templates(&self, biz_code: &str) -> &[TemplateSpec] {
        self.effective_templates
            .get(biz_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Business codes resolved by this session, sorted.
    pub fn biz_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.effective_templates.keys().map(String::as_str).collect();
        codes.sort();
        codes
    }

    pub(crate) fn set_effective_templates(&mut self, biz_code: String, templates: Vec<TemplateSpec>) {
        self.effective_templates.insert(biz_code, templates);
    }
}

impl Default for BizSessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request handle: owns the invoke cache and the active session context.
///
/// One `RequestContext` belongs to one logical execution. Session scopes
/// borrow it mutably for their lifetime, so two executions can never observe
/// each other's state.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub(crate) invoke_cache: Option<InvokeCache>,
    pub(crate) session: Option<Arc<BizSessionContext>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoke_cache(&self) -> Option<&InvokeCache> {
        self.invoke_cache.as_ref()
    }

    pub fn invoke_cache_mut(&mut self) -> Option<&mut InvokeCache> {
        self.invoke_cache.as_mut()
    }

    /// Create the invoke cache if absent. Returns `true` when it was created.
    pub fn init_invoke_cache(&mut self) -> bool {
        if self.invoke_cache.is_some() {
            return false;
        }
        self.invoke_cache = Some(InvokeCache::new());
        true
    }

    /// Drop the invoke cache and everything in it.
    pub fn clear_invoke_cache(&mut self) {
        self.invoke_cache = None;
    }

    /// Active session context, if a session scope is open.
    pub fn session(&self) -> Option<&Arc<BizSessionContext>> {
        self.session.as_ref()
    }

    /// Effective templates of `biz_code` in the active session; empty when no
    /// session is open or the code was not resolved.
    pub fn effective_templates(&self, biz_code: &str) -> &[TemplateSpec] {
        self.session
            .as_deref()
            .map(|s| s.effective_templates(biz_code))
            .unwrap_or(&[])
    }

    /// Replace the active session and keep its cache publication in sync.
    pub(crate) fn set_session(&mut self, session: Option<Arc<BizSessionContext>>) {
        if let Some(cache) = self.invoke_cache.as_mut() {
            match &session {
                Some(s) => cache.put_shared(SESSION_CACHE_NAMESPACE, SESSION_CACHE_KEY, s.clone()),
                None => {
                    cache.remove(SESSION_CACHE_NAMESPACE, SESSION_CACHE_KEY);
                }
            }
        }
        self.session = session;
    }
}
