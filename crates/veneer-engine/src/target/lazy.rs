use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use veneer_types::{InvokeResult, Value, ValueSnapshot};

use crate::error::{ProjectionError, ProjectionResult};
use crate::interceptor::{CallTarget, InvocationContext};
use crate::payload::TargetSnapshot;

type Factory = Box<dyn FnOnce() -> InvokeResult<Value> + Send>;

/// A value computed at most once, on first use
///
/// The outcome is memoized, failure included: every caller after the first
/// sees the same `DeferredComputationFailure`, and the factory is never rerun.
pub struct Deferred {
    cell: OnceCell<ProjectionResult<Value>>,
    factory: Mutex<Option<Factory>>,
}

impl Deferred {
    /// Defer `factory` until first use
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> InvokeResult<Value> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Mutex::new(Some(Box::new(factory))),
        }
    }

    /// An already evaluated value
    pub fn evaluated(value: Value) -> Self {
        Self {
            cell: OnceCell::with_value(Ok(value)),
            factory: Mutex::new(None),
        }
    }

    /// Force the value; concurrent first callers block until one of them has
    /// run the factory
    pub fn force(&self) -> ProjectionResult<Value> {
        self.cell
            .get_or_init(|| {
                let factory = self.factory.lock().take();
                match factory {
                    Some(factory) => {
                        log::debug!("evaluating deferred target");
                        factory().map_err(|err| ProjectionError::DeferredComputationFailure {
                            message: err.to_string(),
                        })
                    }
                    None => Err(ProjectionError::DeferredComputationFailure {
                        message: "factory already consumed".to_string(),
                    }),
                }
            })
            .clone()
    }

    /// Whether the value (or its failure) is already known
    pub fn is_evaluated(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The memoized outcome, without forcing
    pub fn peek(&self) -> Option<&ProjectionResult<Value>> {
        self.cell.get()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(Ok(value)) => write!(f, "Deferred({:?})", value),
            Some(Err(err)) => write!(f, "Deferred(failed: {})", err),
            None => write!(f, "Deferred(<pending>)"),
        }
    }
}

/// Target computed on first use
#[derive(Debug, Clone)]
pub struct LazyTarget {
    deferred: Arc<Deferred>,
}

impl LazyTarget {
    /// Defer `factory` until first use
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> InvokeResult<Value> + Send + 'static,
    {
        Self::from_deferred(Arc::new(Deferred::new(factory)))
    }

    /// Wrap an existing deferred box
    pub fn from_deferred(deferred: Arc<Deferred>) -> Self {
        Self { deferred }
    }

    /// The deferred box
    pub fn deferred(&self) -> &Arc<Deferred> {
        &self.deferred
    }
}

impl CallTarget for LazyTarget {
    fn call_target(&self) -> ProjectionResult<InvocationContext> {
        self.deferred.force().map(InvocationContext::for_instance)
    }

    /// Empty until the value has been forced by some other access
    fn member_names(&self) -> Vec<String> {
        match self.deferred.peek() {
            Some(Ok(value)) => InvocationContext::for_instance(value.clone()).member_names(),
            _ => Vec::new(),
        }
    }

    fn capture(&self) -> ProjectionResult<TargetSnapshot> {
        let value = self.deferred.force()?;
        Ok(TargetSnapshot::Lazy(ValueSnapshot::capture(&value)))
    }
}
