//! # Resource Registry
//!
//! The registry is populated once at startup through [`RegistryBuilder`] and is
//! read-only afterwards. Share it behind an `Arc`; concurrent reads need no locking.

use crate::resource::ResourceDefinition;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Route key already registered: {0}")]
    DuplicateRouteKey(String),
}

/// Route key -> definition, plus registration order for tie-breaking.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, ResourceDefinition>,
    order: Vec<String>,
}

impl ResourceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn lookup(&self, route_key: &str) -> Option<&ResourceDefinition> {
        self.resources.get(route_key)
    }

    /// The resource with the lowest menu priority. Ties go to the first registered.
    pub fn default_resource(&self) -> Option<&ResourceDefinition> {
        self.menu().into_iter().next()
    }

    /// Every resource, ordered by `(menu_priority, registration order)`.
    pub fn menu(&self) -> Vec<&ResourceDefinition> {
        let mut entries: Vec<(usize, &ResourceDefinition)> = self
            .order
            .iter()
            .filter_map(|key| self.resources.get(key))
            .enumerate()
            .collect();
        entries.sort_by_key(|(position, def)| (def.menu_priority(), *position));
        entries.into_iter().map(|(_, def)| def).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: ResourceRegistry,
}

impl RegistryBuilder {
    pub fn register(mut self, def: ResourceDefinition) -> Result<Self, RegistryError> {
        let key = def.route_key().to_string();
        if self.registry.resources.contains_key(&key) {
            return Err(RegistryError::DuplicateRouteKey(key));
        }
        self.registry.order.push(key.clone());
        self.registry.resources.insert(key, def);
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        info!(
            resources = self.registry.len(),
            keys = ?self.registry.order,
            "Registry built"
        );
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Schema;

    fn def(key: &str, priority: i32) -> ResourceDefinition {
        ResourceDefinition::builder(key, Schema::new(key, key))
            .menu_priority(priority)
            .build()
    }

    #[test]
    fn test_default_resource_lowest_priority() {
        let registry = ResourceRegistry::builder()
            .register(def("surveys", 2))
            .unwrap()
            .register(def("contacts", 1))
            .unwrap()
            .build();

        assert_eq!(registry.default_resource().unwrap().route_key(), "contacts");
        assert!(registry.lookup("surveys").is_some());
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_ties_go_to_first_registered() {
        let registry = ResourceRegistry::builder()
            .register(def("b", 1))
            .unwrap()
            .register(def("a", 1))
            .unwrap()
            .register(def("c", 5))
            .unwrap()
            .build();

        assert_eq!(registry.default_resource().unwrap().route_key(), "b");
        let keys: Vec<&str> = registry.menu().iter().map(|d| d.route_key()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_route_key_rejected() {
        let err = ResourceRegistry::builder()
            .register(def("widgets", 1))
            .unwrap()
            .register(def("widgets", 2))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRouteKey("widgets".into()));
    }

    #[test]
    fn test_empty_registry_has_no_default() {
        let registry = ResourceRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.default_resource().is_none());
    }
}
