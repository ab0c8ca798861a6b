//! Lookup-or-create of monitoring services
//!
//! Every `(host, metric name)` pair maps onto one service `host!name`. The
//! registry makes sure that service exists before a check result is sent to
//! it, creating it on first sight.
//!
//! ## Lookup Outcomes
//!
//! ```text
//! Found          → nothing to do
//! NotFound       → create the service
//! TransportError → report, do not create
//! ```
//!
//! A failed lookup is never treated as "not found": creating on a transient
//! error could issue a duplicate create for a service that already exists.
//!
//! ## Locking
//!
//! Lookup and create for one identity run under a per-identity async mutex,
//! so concurrent batches never race each other into two creates. Distinct
//! identities do not block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument, trace, warn};

use crate::ServiceIdentity;
use crate::client::{ApiError, ApiResult, MonitoringApi, Service};
use crate::error::RegistryError;

/// Result of looking up a service
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceLookup {
    Found(Service),
    NotFound,
    TransportError(ApiError),
}

impl From<ApiResult<Option<Service>>> for ServiceLookup {
    fn from(result: ApiResult<Option<Service>>) -> Self {
        match result {
            Ok(Some(service)) => ServiceLookup::Found(service),
            Ok(None) => ServiceLookup::NotFound,
            Err(e) => ServiceLookup::TransportError(e),
        }
    }
}

type KeyLocks = HashMap<ServiceIdentity, Arc<tokio::sync::Mutex<()>>>;

#[derive(Clone)]
pub struct ServiceRegistry {
    api: Arc<dyn MonitoringApi>,

    /// Check command for newly created services
    check_command: String,

    locks: Arc<Mutex<KeyLocks>>,
}

impl ServiceRegistry {
    pub fn new(api: Arc<dyn MonitoringApi>, check_command: impl ToString) -> Self {
        Self {
            api,
            check_command: check_command.to_string(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Make sure the service `host!name` exists.
    ///
    /// An existing service is never modified or recreated.
    #[instrument(skip(self))]
    pub async fn ensure(&self, host: &str, name: &str) -> Result<(), RegistryError> {
        let identity = ServiceIdentity::new(host, name);
        let lock = self.key_lock(&identity);

        let result = {
            let _guard = lock.lock().await;
            self.lookup_or_create(&identity).await
        };

        self.release(&identity, lock);
        result
    }

    pub async fn lookup(&self, identity: &ServiceIdentity) -> ServiceLookup {
        self.api.get_service(identity).await.into()
    }

    async fn lookup_or_create(&self, identity: &ServiceIdentity) -> Result<(), RegistryError> {
        match self.lookup(identity).await {
            ServiceLookup::Found(_) => {
                trace!("service {identity} already exists");
                Ok(())
            }
            ServiceLookup::NotFound => self.create(identity).await,
            ServiceLookup::TransportError(source) => {
                warn!("lookup of {identity} failed, not creating: {source}");
                Err(RegistryError::Lookup {
                    identity: identity.clone(),
                    source,
                })
            }
        }
    }

    async fn create(&self, identity: &ServiceIdentity) -> Result<(), RegistryError> {
        let service = Service {
            name: identity.name.clone(),
            host_name: identity.host.clone(),
            check_command: self.check_command.clone(),
        };

        self.api
            .create_service(&service)
            .await
            .map_err(|source| RegistryError::Create {
                identity: identity.clone(),
                source,
            })?;

        debug!("created service {identity}");
        Ok(())
    }

    fn key_lock(&self, identity: &ServiceIdentity) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(identity.clone()).or_default().clone()
    }

    /// Drop the identity's lock once nobody else is waiting on it.
    fn release(&self, identity: &ServiceIdentity, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // one reference in the map, one held here
        let last = Arc::strong_count(&lock) == 2;
        drop(lock);
        if last {
            locks.remove(identity);
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
