//! Session scopes: per-request resolution of effective templates.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::Utc;

use crate::error::{LatticeError, Result};
use crate::model::{BizObject, ProductSpec, ScenarioRequest, TemplateSpec};
use crate::runtime::Lattice;

use super::context::{BizSessionContext, RequestContext};

/// Builds the scenario request of a business object.
///
/// Returning `None` means the object carries no derivable scenario, which
/// fails the scope with `MissingScenarioContext`.
pub trait ScenarioBuilder {
    fn build_scenario_request(&self, biz_object: &Arc<dyn BizObject>) -> Option<ScenarioRequest>;
}

impl<F> ScenarioBuilder for F
where
    F: Fn(&Arc<dyn BizObject>) -> Option<ScenarioRequest>,
{
    fn build_scenario_request(&self, biz_object: &Arc<dyn BizObject>) -> Option<ScenarioRequest> {
        self(biz_object)
    }
}

/// Takes business code and scenario straight from the object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScenarioBuilder;

impl ScenarioBuilder for DefaultScenarioBuilder {
    fn build_scenario_request(&self, biz_object: &Arc<dyn BizObject>) -> Option<ScenarioRequest> {
        Some(ScenarioRequest::new(biz_object.clone()))
    }
}

/// A bracketed unit of execution resolving effective templates for a set of
/// business objects.
///
/// [`enter`](Self::enter) resolves the templates and publishes them on the
/// request context; the returned [`SessionGuard`] undoes that on drop, on
/// every path.
pub struct BizSessionScope<'l> {
    lattice: &'l Lattice,
    biz_objects: Vec<Arc<dyn BizObject>>,
    builder: Box<dyn ScenarioBuilder + 'l>,
}

impl<'l> BizSessionScope<'l> {
    /// Fails with `EmptyBizObjectSet` when `biz_objects` is empty.
    pub fn new(
        lattice: &'l Lattice,
        biz_objects: Vec<Arc<dyn BizObject>>,
        builder: impl ScenarioBuilder + 'l,
    ) -> Result<Self> {
        if biz_objects.is_empty() {
            return Err(LatticeError::EmptyBizObjectSet);
        }
        Ok(Self {
            lattice,
            biz_objects,
            builder: Box::new(builder),
        })
    }

    /// Scope over a single business object.
    pub fn single(
        lattice: &'l Lattice,
        biz_object: Arc<dyn BizObject>,
        builder: impl ScenarioBuilder + 'l,
    ) -> Result<Self> {
        Self::new(lattice, vec![biz_object], builder)
    }

    pub fn biz_objects(&self) -> &[Arc<dyn BizObject>] {
        &self.biz_objects
    }

    /// Open the scope on `ctx`.
    ///
    /// Creates the invoke cache when `ctx` has none (the returned guard then
    /// owns it), resolves every business object and publishes the resulting
    /// session context. On failure the partially acquired state is released
    /// before the error is returned.
    pub fn enter<'c>(&self, ctx: &'c mut RequestContext) -> Result<SessionGuard<'c>> {
        let owns_cache = ctx.init_invoke_cache();
        let previous = ctx.session.clone();
        let mut guard = SessionGuard {
            ctx,
            previous,
            owns_cache,
            session: None,
        };

        let mut session = BizSessionContext::new();
        for request in self.build_scenario_requests()? {
            let templates = self.effective_templates(&request)?;
            session.set_effective_templates(request.biz_code().to_string(), templates);
        }

        let session = Arc::new(session);
        log::debug!(
            "Opened session {} for {} business object(s){}",
            session.session_id,
            self.biz_objects.len(),
            if owns_cache { ", invoke cache created" } else { "" }
        );
        guard.ctx.set_session(Some(session.clone()));
        guard.session = Some(session);
        Ok(guard)
    }

    /// Run `body` inside the scope; the scope is exited when `body` returns.
    pub fn run<R>(
        &self,
        ctx: &mut RequestContext,
        body: impl FnOnce(&mut RequestContext) -> R,
    ) -> Result<R> {
        let mut guard = self.enter(ctx)?;
        Ok(body(&mut *guard))
    }

    fn build_scenario_requests(&self) -> Result<Vec<ScenarioRequest>> {
        self.biz_objects
            .iter()
            .map(|object| {
                self.builder.build_scenario_request(object).ok_or_else(|| {
                    LatticeError::MissingScenarioContext {
                        biz_code: object.biz_code().to_string(),
                    }
                })
            })
            .collect()
    }

    /// Effective use-cases plus effective installed products, ascending by
    /// priority. Equal priorities keep use-cases first, then registration
    /// order.
    fn effective_templates(&self, request: &ScenarioRequest) -> Result<Vec<TemplateSpec>> {
        let mut templates: Vec<TemplateSpec> = self
            .lattice
            .all_registered_use_cases()
            .into_iter()
            .filter(|use_case| use_case.is_effective(request))
            .collect();
        templates.extend(
            self.installed_products(request.biz_code())?
                .into_iter()
                .filter(|product| product.is_effective(request)),
        );
        templates.sort_by_key(|t| t.priority);
        Ok(templates)
    }

    fn installed_products(&self, biz_code: &str) -> Result<Vec<ProductSpec>> {
        if biz_code.trim().is_empty() {
            return Err(LatticeError::EmptyBizCode);
        }
        let Some(config) = self.lattice.business_config(biz_code) else {
            if self.lattice.is_simple_mode() {
                return Ok(self.lattice.all_registered_products());
            }
            return Err(LatticeError::UnknownBusinessConfig {
                biz_code: biz_code.to_string(),
            });
        };

        let products = self
            .lattice
            .installed_products(&config)
            .into_iter()
            .filter_map(|installed| {
                let product = self.lattice.registered_product_by_code(&installed.code);
                if product.is_none() {
                    log::warn!(
                        "Business {} installs unregistered product {}",
                        biz_code,
                        installed.code
                    );
                }
                product
            })
            .collect();
        Ok(products)
    }
}

/// An open session scope.
///
/// Dereferences to the request context so the scope body can keep using it,
/// including to open nested scopes. Dropping the guard restores the session
/// context that was active before and, when this scope created the invoke
/// cache, tears the cache down. Exiting the outermost scope therefore
/// clears the session context entirely.
pub struct SessionGuard<'c> {
    ctx: &'c mut RequestContext,
    previous: Option<Arc<BizSessionContext>>,
    owns_cache: bool,
    session: Option<Arc<BizSessionContext>>,
}

impl SessionGuard<'_> {
    /// Session context resolved by this scope.
    pub fn session(&self) -> Option<&Arc<BizSessionContext>> {
        self.session.as_ref()
    }

    /// Whether this scope created, and will tear down, the invoke cache.
    pub fn owns_invoke_cache(&self) -> bool {
        self.owns_cache
    }
}

impl Deref for SessionGuard<'_> {
    type Target = RequestContext;

    fn deref(&self) -> &RequestContext {
        self.ctx
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut RequestContext {
        self.ctx
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let previous = self.previous.take();
        self.ctx.set_session(previous);
        if self.owns_cache {
            self.ctx.clear_invoke_cache();
        }
        if let Some(session) = self.session.take() {
            let elapsed = Utc::now() - session.opened_at;
            log::debug!(
                "Closed session {} after {} ms",
                session.session_id,
                elapsed.num_milliseconds()
            );
        }
    }
}
