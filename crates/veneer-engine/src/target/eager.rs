use veneer_types::{TypeHandle, Value, ValueSnapshot};

use crate::error::ProjectionResult;
use crate::interceptor::{CallTarget, ContextSpec, InvocationContext};
use crate::payload::TargetSnapshot;

/// Target that is the wrapped value itself
#[derive(Debug, Clone)]
pub struct EagerTarget {
    value: Value,
    context: InvocationContext,
}

impl EagerTarget {
    /// Resolve members against the value's runtime type
    pub fn new(value: Value) -> Self {
        Self {
            context: InvocationContext::for_instance(value.clone()),
            value,
        }
    }

    /// Resolve members against an explicit context
    pub fn with_context(value: Value, context: ContextSpec) -> ProjectionResult<Self> {
        Ok(Self {
            context: InvocationContext::new(value.clone(), context)?,
            value,
        })
    }

    /// The wrapped value
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl CallTarget for EagerTarget {
    fn call_target(&self) -> ProjectionResult<InvocationContext> {
        Ok(self.context.clone())
    }

    fn static_type(&self) -> Option<TypeHandle> {
        self.context.context_type().cloned()
    }

    fn capture(&self) -> ProjectionResult<TargetSnapshot> {
        Ok(TargetSnapshot::Instance(ValueSnapshot::capture(&self.value)))
    }
}
