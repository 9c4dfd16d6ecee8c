//! Round-trip payloads
//!
//! Capture records the context type, the interface list and the wrapped
//! target; [`reconstitute`] resolves the type references again, re-runs proxy
//! synthesis and binds a fresh projection to the restored target. Type
//! references carry both id and name: the id is trusted only when the
//! registry maps it to a type of the same name, otherwise the name is looked
//! up, which is what makes payloads portable across processes. Resolution only
//! sees registered types, so a payload can be restored only where its types
//! have been registered.

mod reconstitute;

pub use reconstitute::reconstitute;

use serde::{Deserialize, Serialize};
use veneer_types::{TypeHandle, TypeId, TypeRegistry, ValueSnapshot};

use crate::error::ProjectionResult;

/// Payload format understood by this version
pub const FORMAT_VERSION: u32 = 1;

/// Reference to a type by identity and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Type id in the capturing process
    pub id: TypeId,
    /// Fully-qualified name
    pub name: String,
}

impl TypeRef {
    /// Reference to `ty`
    pub fn of(ty: &TypeHandle) -> Self {
        Self {
            id: ty.id(),
            name: ty.name().to_string(),
        }
    }

    /// Resolve by id if it still names the same type, else by name
    pub fn resolve(&self, registry: &TypeRegistry) -> Option<TypeHandle> {
        registry
            .get(self.id)
            .filter(|ty| ty.name() == self.name)
            .or_else(|| registry.resolve(&self.name))
    }
}

/// Captured wrapped target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "target")]
pub enum TargetSnapshot {
    /// An eager target's value
    Instance(ValueSnapshot),
    /// A lazy target's value (forced at capture)
    Lazy(ValueSnapshot),
    /// A static target's type
    Static {
        /// Type name
        type_name: String,
    },
    /// A late-bound target's requested name
    LateBound {
        /// Type name as requested
        type_name: String,
    },
}

/// Serialized projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPayload {
    /// Payload format version
    pub format_version: u32,
    /// Context type of the proxy type
    pub context_type: Option<TypeRef>,
    /// Requested interfaces, in order
    pub interfaces: Vec<TypeRef>,
    /// Wrapped target
    pub target: TargetSnapshot,
}

impl ProjectionPayload {
    /// Payload in the current format
    pub fn new(context_type: Option<TypeRef>, interfaces: Vec<TypeRef>, target: TargetSnapshot) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            context_type,
            interfaces,
            target,
        }
    }

    /// Encode as JSON
    pub fn to_json(&self) -> ProjectionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> ProjectionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
