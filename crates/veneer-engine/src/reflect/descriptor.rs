use veneer_types::Value;

use super::DynamicObject;

/// One dynamic member presented as a fixed property
///
/// `get` and `set` never fail: an absent member reads as `None` and a write
/// that cannot bind is reported as not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
}

impl PropertyDescriptor {
    /// Descriptor for the member `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the member from `component`
    pub fn get(&self, component: &dyn DynamicObject) -> Option<Value> {
        match component.get_member(&self.name) {
            Ok(value) => Some(value),
            Err(err) => {
                log::trace!("descriptor '{}' has no value: {}", self.name, err);
                None
            }
        }
    }

    /// Write the member on `component`; returns whether the write was applied
    pub fn set(&self, component: &dyn DynamicObject, value: Value) -> bool {
        match component.set_member(&self.name, value) {
            Ok(()) => true,
            Err(err) => {
                log::trace!("descriptor '{}' ignored write: {}", self.name, err);
                false
            }
        }
    }
}

/// Descriptors for every member `component` currently exposes
pub fn describe(component: &dyn DynamicObject) -> Vec<PropertyDescriptor> {
    component
        .dynamic_member_names()
        .into_iter()
        .map(PropertyDescriptor::new)
        .collect()
}
