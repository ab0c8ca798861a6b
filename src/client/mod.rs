//! Connection to the monitoring system
//!
//! The bridge only needs three remote operations: look up a service, create a
//! service, and submit a passive check result. They are captured by the
//! [`MonitoringApi`] trait so the dispatcher can run against the real Icinga2
//! API or against an in-memory stand-in.
//!
//! ## Implementations
//!
//! - **Icinga2** ([`icinga::IcingaClient`]): REST API over HTTPS with basic auth
//! - **In-Memory** ([`memory::MemoryApi`]): records every call, used for dry runs and tests

use async_trait::async_trait;
use serde::Deserialize;

use crate::ServiceIdentity;
use crate::result::CheckResult;

pub mod error;
pub mod icinga;
pub mod memory;

pub use error::{ApiError, ApiResult};

/// A service object as known to the monitoring system
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Service {
    /// Short service name (the metric name)
    pub name: String,

    /// Host the service is bound to
    pub host_name: String,

    /// Check command the service was created with
    pub check_command: String,
}

impl Service {
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity::new(&self.host_name, &self.name)
    }
}

/// Outbound operations against the monitoring system
///
/// Implementations must be `Send + Sync`, a single handle is shared by every
/// dispatcher pass. Timeouts are the implementation's responsibility.
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Fetch a service by identity
    ///
    /// Returns `Ok(None)` when the service does not exist. Any other failure
    /// is an error and must not be reported as "not found".
    async fn get_service(&self, identity: &ServiceIdentity) -> ApiResult<Option<Service>>;

    /// Create a service bound to `service.host_name`
    async fn create_service(&self, service: &Service) -> ApiResult<()>;

    /// Submit a passive check result for an existing service
    async fn process_check_result(
        &self,
        identity: &ServiceIdentity,
        result: &CheckResult,
    ) -> ApiResult<()>;

    /// Release the connection
    ///
    /// Calls after `close` fail with [`ApiError::Closed`].
    async fn close(&self) -> ApiResult<()>;
}
