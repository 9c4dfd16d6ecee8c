//! Target resolution variants
//!
//! Each variant implements [`CallTarget`](crate::interceptor::CallTarget)
//! and differs only in how the invocation context is produced:
//!
//! | Variant | Context |
//! |---|---|
//! | [`EagerTarget`] | the wrapped value itself |
//! | [`LazyTarget`] | a deferred value, forced once on first use |
//! | [`LateBoundTarget`] | a type resolved by name, possibly absent |
//! | [`StaticTarget`] | a type: static members and constructors |

mod eager;
mod late_bound;
mod lazy;
mod static_ctx;

pub use eager::EagerTarget;
pub use late_bound::LateBoundTarget;
pub use lazy::{Deferred, LazyTarget};
pub use static_ctx::{Constructor, StaticTarget};
