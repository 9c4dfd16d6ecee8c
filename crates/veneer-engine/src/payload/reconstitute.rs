use std::sync::Arc;

use veneer_types::{TypeError, TypeHandle};

use crate::config::ProjectionOptions;
use crate::error::{ProjectionError, ProjectionResult};
use crate::interceptor::{CallTarget, ContextSpec, Interceptor};
use crate::payload::{ProjectionPayload, TargetSnapshot, FORMAT_VERSION};
use crate::proxy::{initialize_proxy, InterfaceSet, Projection};
use crate::target::{Deferred, EagerTarget, LateBoundTarget, LazyTarget, StaticTarget};

/// Rebuild a projection from a payload
///
/// Resolves the context type and interfaces through `options.registry`,
/// restores the target, re-runs synthesis (which yields the memoized proxy
/// type when the process already built it) and binds a new projection.
/// Types that were never registered do not resolve, even if they are still
/// alive in this process.
pub fn reconstitute(
    payload: &ProjectionPayload,
    options: &ProjectionOptions,
) -> ProjectionResult<Projection> {
    if payload.format_version != FORMAT_VERSION {
        return Err(ProjectionError::Serialization(format!(
            "unsupported payload format version {}",
            payload.format_version
        )));
    }
    let registry = &options.registry;

    let context = payload
        .context_type
        .as_ref()
        .map(|r| {
            r.resolve(registry)
                .ok_or_else(|| TypeError::UndefinedType { name: r.name.clone() })
        })
        .transpose()?;

    let interfaces = payload
        .interfaces
        .iter()
        .map(|r| {
            r.resolve(registry)
                .ok_or_else(|| ProjectionError::InvalidInterfaceSet {
                    reason: format!("interface '{}' is not registered", r.name),
                })
        })
        .collect::<ProjectionResult<Vec<TypeHandle>>>()?;
    let set = InterfaceSet::from_slice(&interfaces)?;

    let target: Box<dyn CallTarget> = match &payload.target {
        TargetSnapshot::Instance(snapshot) => {
            let value = snapshot.restore(registry)?;
            match &context {
                Some(ctx) => Box::new(EagerTarget::with_context(value, ContextSpec::Type(ctx.clone()))?),
                None => Box::new(EagerTarget::new(value)),
            }
        }
        TargetSnapshot::Lazy(snapshot) => {
            let value = snapshot.restore(registry)?;
            Box::new(LazyTarget::from_deferred(Arc::new(Deferred::evaluated(value))))
        }
        TargetSnapshot::Static { type_name } => Box::new(StaticTarget::new(&registry.require(type_name)?)),
        TargetSnapshot::LateBound { type_name } => {
            Box::new(LateBoundTarget::resolve(type_name.clone(), registry))
        }
    };

    log::debug!(
        "reconstituting projection of {} interface(s) over {:?}",
        set.len(),
        payload.target
    );
    let ty = options.synthesizer.build_for(context.as_ref(), set);
    let interceptor = Interceptor::with_cache(target, options.cache.clone());
    Ok(initialize_proxy(&ty, interceptor, &interfaces)?.with_config(options.config))
}
