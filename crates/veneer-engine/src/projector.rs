//! Projection request API
//!
//! [`Projector`] is the entry point callers use: it owns a
//! [`ProjectionOptions`] and turns targets of every variant into interceptors
//! or projections that share its registry, cache and synthesizer.

use std::fmt;
use std::sync::Arc;

use veneer_types::{InvokeResult, TypeHandle, TypeRegistry, Value};

use crate::cache::InvocationCache;
use crate::config::ProjectionOptions;
use crate::error::ProjectionResult;
use crate::interceptor::{CallTarget, ContextSpec, Interceptor};
use crate::payload::{self, ProjectionPayload};
use crate::proxy::{self, InterfaceSet, Projection, ProxySynthesizer, ProxyType};
use crate::target::{
    Constructor, Deferred, EagerTarget, LateBoundTarget, LazyTarget, StaticTarget,
};

/// Creates projections over a shared registry, cache and synthesizer
#[derive(Clone, Default)]
pub struct Projector {
    options: ProjectionOptions,
}

impl Projector {
    /// Projector over `options`
    pub fn new(options: ProjectionOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Type registry used for late binding and reconstitution
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.options.registry
    }

    /// Binding cache shared by every interceptor this projector creates
    pub fn cache(&self) -> &Arc<InvocationCache> {
        &self.options.cache
    }

    /// Proxy type memo
    pub fn synthesizer(&self) -> &Arc<ProxySynthesizer> {
        &self.options.synthesizer
    }

    fn intercept(&self, target: impl CallTarget + 'static) -> Interceptor {
        Interceptor::with_cache(Box::new(target), self.options.cache.clone())
    }

    // ===== Projections =====

    /// Project `target` onto `interfaces`, resolving against its runtime type
    pub fn create_projection(&self, target: Value, interfaces: &[TypeHandle]) -> ProjectionResult<Projection> {
        self.act_like(self.intercept(EagerTarget::new(target)), interfaces)
    }

    /// Project `target` onto `interfaces`, resolving against `context`
    ///
    /// `context` must be a supertype of the target's runtime type.
    pub fn create_projection_in(
        &self,
        target: Value,
        context: ContextSpec,
        interfaces: &[TypeHandle],
    ) -> ProjectionResult<Projection> {
        let target = EagerTarget::with_context(target, context)?;
        self.act_like(self.intercept(target), interfaces)
    }

    /// Present an existing interceptor as `interfaces`
    ///
    /// The proxy type is keyed by the target's statically known context type,
    /// so targets that only learn their type on first use share one proxy type
    /// per interface set.
    pub fn act_like(&self, interceptor: Interceptor, interfaces: &[TypeHandle]) -> ProjectionResult<Projection> {
        let set = InterfaceSet::from_slice(interfaces)?;
        let context = interceptor.target().static_type();
        let ty = self.options.synthesizer.build_for(context.as_ref(), set);
        self.initialize_proxy(&ty, interceptor, interfaces)
    }

    // ===== Interceptors =====

    /// Interceptor over the value `factory` computes on first use
    pub fn create_lazy_projection<F>(&self, factory: F) -> Interceptor
    where
        F: FnOnce() -> InvokeResult<Value> + Send + 'static,
    {
        self.intercept(LazyTarget::new(factory))
    }

    /// Interceptor over an existing deferred box
    pub fn create_lazy_projection_from(&self, deferred: Arc<Deferred>) -> Interceptor {
        self.intercept(LazyTarget::from_deferred(deferred))
    }

    /// Interceptor over the static side of the type named `type_name`
    ///
    /// An unregistered name yields an unavailable interceptor; every access
    /// through it fails with member-not-found.
    pub fn create_late_bound_projection(&self, type_name: &str) -> Interceptor {
        self.intercept(LateBoundTarget::resolve(type_name, &self.options.registry))
    }

    /// Late-bound interceptor over an already resolved type
    pub fn create_late_bound_projection_for(&self, ty: &TypeHandle) -> Interceptor {
        self.intercept(LateBoundTarget::for_type(ty))
    }

    /// Interceptor over the static members of `ty`
    pub fn create_static_projection(&self, ty: &TypeHandle) -> Interceptor {
        self.intercept(StaticTarget::new(ty))
    }

    /// Construction capability for `ty`
    pub fn constructor(&self, ty: &TypeHandle) -> Constructor {
        StaticTarget::new(ty).constructor(self.options.cache.clone())
    }

    // ===== Proxy types =====

    /// Synthesize (or fetch) the proxy type for `primary` plus `additional`
    pub fn build_type(
        &self,
        context: Option<&TypeHandle>,
        primary: &TypeHandle,
        additional: &[TypeHandle],
    ) -> ProjectionResult<Arc<ProxyType>> {
        self.options.synthesizer.build_type(context, primary, additional)
    }

    /// Bind `ty` to `target` with this projector's configuration
    pub fn initialize_proxy(
        &self,
        ty: &Arc<ProxyType>,
        target: Interceptor,
        interfaces: &[TypeHandle],
    ) -> ProjectionResult<Projection> {
        Ok(proxy::initialize_proxy(ty, target, interfaces)?.with_config(self.options.config))
    }

    // ===== Round trip =====

    /// Capture `projection` as a payload
    pub fn capture(&self, projection: &Projection) -> ProjectionResult<ProjectionPayload> {
        projection.capture()
    }

    /// Rebuild a projection from `payload`
    ///
    /// Every type the payload names (the interfaces, an explicit context type,
    /// and the types of captured objects) must be registered in
    /// [`Projector::registry`], even within the capturing process. An
    /// unregistered interface fails with `InvalidInterfaceSet`, any other
    /// unregistered type with `UndefinedType`.
    pub fn reconstitute(&self, payload: &ProjectionPayload) -> ProjectionResult<Projection> {
        payload::reconstitute(payload, &self.options)
    }

    /// Capture `projection` as JSON
    pub fn to_json(&self, projection: &Projection) -> ProjectionResult<String> {
        projection.capture()?.to_json()
    }

    /// Rebuild a projection from JSON, under the same registration
    /// requirement as [`Projector::reconstitute`]
    pub fn from_json(&self, json: &str) -> ProjectionResult<Projection> {
        self.reconstitute(&ProjectionPayload::from_json(json)?)
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("config", &self.options.config)
            .field("types", &self.options.registry.len())
            .field("bindings", &self.options.cache.len())
            .field("proxy_types", &self.options.synthesizer.len())
            .finish()
    }
}
