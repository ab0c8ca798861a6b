//! In-memory monitoring API (no remote system)
//!
//! Keeps services and submitted check results in memory and counts every
//! call. It's useful for:
//! - Dry runs of the bridge without an Icinga2 instance
//! - Testing the registry and dispatcher without HTTP
//!
//! Failures can be injected per operation to exercise error paths.
//!
//! A dry-run instance only logs check results; memory then grows with the
//! number of distinct services, not with the number of metrics.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use super::{MonitoringApi, Service};
use crate::ServiceIdentity;
use crate::result::CheckResult;

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub lookups: usize,
    pub creates: usize,
    pub submissions: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.lookups + self.creates + self.submissions
    }
}

#[derive(Debug, Default)]
struct State {
    services: HashMap<ServiceIdentity, Service>,
    results: Vec<(ServiceIdentity, CheckResult)>,
    calls: CallCounts,
    fail_lookups: bool,
    fail_creates: bool,
    failing_submissions: HashSet<ServiceIdentity>,
    closed: bool,
}

/// Monitoring API kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryApi {
    state: Mutex<State>,

    /// Artificial delay applied to every call
    latency: Option<Duration>,

    /// Log submitted check results without keeping them
    log_only: bool,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance for dry runs: check results are logged and dropped.
    pub fn dry_run() -> Self {
        Self {
            log_only: true,
            ..Self::default()
        }
    }

    /// Delay every call, to widen race windows in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_service(self, service: Service) -> Self {
        self.lock().services.insert(service.identity(), service);
        self
    }

    /// Make every lookup fail with a transport error.
    pub fn fail_lookups(&self, fail: bool) {
        self.lock().fail_lookups = fail;
    }

    /// Make every create fail with a server error.
    pub fn fail_creates(&self, fail: bool) {
        self.lock().fail_creates = fail;
    }

    /// Reject check results submitted for `identity`.
    pub fn fail_submissions_for(&self, identity: ServiceIdentity) {
        self.lock().failing_submissions.insert(identity);
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn service(&self, identity: &ServiceIdentity) -> Option<Service> {
        self.lock().services.get(identity).cloned()
    }

    pub fn service_count(&self) -> usize {
        self.lock().services.len()
    }

    /// Submitted check results in submission order (always empty for a dry run)
    pub fn results(&self) -> Vec<(ServiceIdentity, CheckResult)> {
        self.lock().results.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // a poisoned lock only means a test panicked while holding it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl MonitoringApi for MemoryApi {
    async fn get_service(&self, identity: &ServiceIdentity) -> ApiResult<Option<Service>> {
        self.delay().await;
        let mut state = self.lock();
        if state.closed {
            return Err(ApiError::Closed);
        }
        state.calls.lookups += 1;

        if state.fail_lookups {
            return Err(ApiError::Request(format!("lookup of {identity} timed out")));
        }

        Ok(state.services.get(identity).cloned())
    }

    async fn create_service(&self, service: &Service) -> ApiResult<()> {
        self.delay().await;
        let mut state = self.lock();
        if state.closed {
            return Err(ApiError::Closed);
        }
        state.calls.creates += 1;

        if state.fail_creates {
            return Err(ApiError::UnexpectedStatus {
                status: 500,
                body: "object could not be created".to_string(),
            });
        }

        let identity = service.identity();
        if state.services.contains_key(&identity) {
            return Err(ApiError::UnexpectedStatus {
                status: 500,
                body: format!("object {identity} already exists"),
            });
        }

        debug!("created service {identity}");
        state.services.insert(identity, service.clone());
        Ok(())
    }

    async fn process_check_result(
        &self,
        identity: &ServiceIdentity,
        result: &CheckResult,
    ) -> ApiResult<()> {
        self.delay().await;
        let mut state = self.lock();
        if state.closed {
            return Err(ApiError::Closed);
        }
        state.calls.submissions += 1;

        if state.failing_submissions.contains(identity) {
            return Err(ApiError::UnexpectedStatus {
                status: 500,
                body: format!("check result for {identity} rejected"),
            });
        }

        if !state.services.contains_key(identity) {
            return Err(ApiError::UnexpectedStatus {
                status: 404,
                body: "no objects found".to_string(),
            });
        }

        info!(
            "{identity}: exit_status={} output=\"{}\" perfdata={:?}",
            result.exit_status as u8, result.plugin_output, result.performance_data
        );
        if !self.log_only {
            state.results.push((identity.clone(), result.clone()));
        }
        Ok(())
    }

    async fn close(&self) -> ApiResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(ApiError::Closed);
        }
        state.closed = true;
        Ok(())
    }
}
