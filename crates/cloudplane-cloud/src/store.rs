//! Run-scoped provider registry
//!
//! The store is the only mutable state shared across concurrent node
//! execution, so all access goes through one lock. Provider instances
//! themselves are immutable once active and shared without locking.

use crate::error::{CloudError, Result};
use crate::provider::CloudProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Registry mapping account name to a configured provider.
///
/// Lifecycle: `new` → populate via [`insert`](Self::insert) →
/// [`freeze_for_run`](Self::freeze_for_run) → drop. Passed explicitly to
/// the pipeline so concurrent runs stay isolated.
///
/// At most one provider per name; replacing an entry (credential rotation)
/// is allowed until the store is frozen.
#[derive(Default)]
pub struct ProviderStore {
    providers: RwLock<HashMap<String, Arc<dyn CloudProvider>>>,
    frozen: AtomicBool,
}

impl ProviderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a provider.
    ///
    /// Fails with `StoreFrozen` once a run has started.
    pub fn insert(&self, provider: Arc<dyn CloudProvider>) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(CloudError::StoreFrozen(provider.name().to_string()));
        }

        let name = provider.name().to_string();
        let mut providers = self.providers.write().expect("provider store lock poisoned");
        if providers.insert(name.clone(), provider).is_some() {
            tracing::debug!("Replaced provider entry: {name}");
        } else {
            tracing::debug!("Registered provider: {name}");
        }
        Ok(())
    }

    /// O(1) lookup by account name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CloudProvider>> {
        self.providers
            .read()
            .expect("provider store lock poisoned")
            .get(name)
            .cloned()
    }

    /// Lookup that fails with `ProviderNotConfigured`.
    pub fn require(&self, name: &str) -> Result<Arc<dyn CloudProvider>> {
        self.get(name)
            .ok_or_else(|| CloudError::ProviderNotConfigured(name.to_string()))
    }

    /// Registered account names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .expect("provider store lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers
            .read()
            .expect("provider store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject further registrations for the duration of the run.
    pub fn freeze_for_run(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!("Provider store frozen for run");
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ResourceService;
    use async_trait::async_trait;
    use cloudplane_core::ResourceKind;

    struct FakeProvider {
        name: String,
    }

    #[async_trait]
    impl CloudProvider for FakeProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn provider_type(&self) -> &str {
            "fake"
        }

        fn resources(&self) -> Vec<ResourceKind> {
            Vec::new()
        }

        fn service(&self, kind: ResourceKind) -> Result<&dyn ResourceService> {
            Err(CloudError::UnsupportedResource {
                kind,
                provider_type: "fake".to_string(),
            })
        }

        async fn test_credentials(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn provider(name: &str) -> Arc<dyn CloudProvider> {
        Arc::new(FakeProvider {
            name: name.to_string(),
        })
    }

    #[test]
    fn insert_and_lookup() {
        let store = ProviderStore::new();
        store.insert(provider("do-prod")).unwrap();
        assert!(store.get("do-prod").is_some());
        assert!(store.get("missing").is_none());
        let require_err = match store.require("missing") {
            Ok(_) => panic!("expected missing provider to error"),
            Err(e) => e,
        };
        assert!(matches!(
            require_err,
            CloudError::ProviderNotConfigured(_)
        ));
    }

    #[test]
    fn one_entry_per_name() {
        let store = ProviderStore::new();
        store.insert(provider("do-prod")).unwrap();
        store.insert(provider("do-prod")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn frozen_store_rejects_inserts() {
        let store = ProviderStore::new();
        store.insert(provider("a")).unwrap();
        store.freeze_for_run();
        let err = store.insert(provider("b")).unwrap_err();
        assert!(matches!(err, CloudError::StoreFrozen(name) if name == "b"));
        // existing entries stay readable
        assert!(store.get("a").is_some());
    }
}
