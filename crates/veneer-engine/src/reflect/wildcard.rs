use veneer_types::{Value, INDEXER_NAME};

use super::DynamicObject;
use crate::error::ProjectionResult;
use crate::proxy::Projection;

/// Object that accepts any member access
///
/// Access is forwarded to the first wired projection that declares the
/// member. With no such projection, reads return null and writes and calls
/// are accepted without effect. This is deliberately looser than
/// [`Projection`], which rejects undeclared members.
#[derive(Debug, Default)]
pub struct Wildcard {
    wiring: Vec<Projection>,
}

impl Wildcard {
    /// Wildcard with no wiring: every access is a no-op
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a projection to forward to
    pub fn wire(mut self, projection: Projection) -> Self {
        self.wiring.push(projection);
        self
    }

    /// Wired projections, in lookup order
    pub fn wiring(&self) -> &[Projection] {
        &self.wiring
    }

    fn route(&self, name: &str) -> Option<&Projection> {
        let found = self.wiring.iter().find(|p| p.declares(name));
        if found.is_none() {
            log::trace!("wildcard: no wiring for '{}'", name);
        }
        found
    }

    /// Read a member, null when unwired
    pub fn get(&self, name: &str) -> ProjectionResult<Value> {
        match self.route(name) {
            Some(projection) => projection.get(name),
            None => Ok(Value::Null),
        }
    }

    /// Write a member, dropped when unwired
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ProjectionResult<()> {
        match self.route(name) {
            Some(projection) => projection.set(name, value),
            None => Ok(()),
        }
    }

    /// Call a method, null when unwired
    pub fn invoke(&self, name: &str, args: &[Value]) -> ProjectionResult<Value> {
        match self.route(name) {
            Some(projection) => projection.invoke(name, args),
            None => Ok(Value::Null),
        }
    }

    /// Read through an indexer, null when unwired
    pub fn index(&self, args: &[Value]) -> ProjectionResult<Value> {
        match self.route(INDEXER_NAME) {
            Some(projection) => projection.index(args),
            None => Ok(Value::Null),
        }
    }

    /// Write through an indexer, dropped when unwired
    pub fn set_index(&self, args: &[Value], value: impl Into<Value>) -> ProjectionResult<()> {
        match self.route(INDEXER_NAME) {
            Some(projection) => projection.set_index(args, value),
            None => Ok(()),
        }
    }
}

impl DynamicObject for Wildcard {
    fn dynamic_member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for projection in &self.wiring {
            for name in projection.dynamic_member_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn get_member(&self, name: &str) -> ProjectionResult<Value> {
        self.get(name)
    }

    fn set_member(&self, name: &str, value: Value) -> ProjectionResult<()> {
        self.set(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionOptions;
    use crate::projector::Projector;
    use veneer_types::{Object, PropertyAccess, TypeBuilder};

    #[test]
    fn test_unwired_access_is_neutral() {
        let wildcard = Wildcard::new();
        assert_eq!(wildcard.get("Anything").unwrap(), Value::Null);
        wildcard.set("Anything", 1).unwrap();
        assert_eq!(wildcard.invoke("Run", &[Value::from(1)]).unwrap(), Value::Null);
        assert_eq!(wildcard.index(&[Value::from(0)]).unwrap(), Value::Null);
        wildcard.set_index(&[Value::from(0)], 1).unwrap();
        assert!(wildcard.dynamic_member_names().is_empty());
    }

    #[test]
    fn test_wired_access_forwards() {
        let projector = Projector::new(ProjectionOptions::isolated());
        let iface = TypeBuilder::interface("test.ILabel")
            .property_sig("Text", PropertyAccess::ReadWrite)
            .build()
            .unwrap();
        let ty = TypeBuilder::class("test.Label").field("Text").build().unwrap();
        let label = Object::alloc(&ty);

        let wildcard = Wildcard::new().wire(projector.create_projection(label.clone(), &[iface]).unwrap());
        wildcard.set("Text", "hello").unwrap();
        assert_eq!(label.as_object().unwrap().get("Text"), Some(Value::from("hello")));
        assert_eq!(wildcard.get("Text").unwrap(), Value::from("hello"));
        assert_eq!(wildcard.get("Other").unwrap(), Value::Null);
        assert_eq!(wildcard.dynamic_member_names(), vec!["Text"]);
    }
}
