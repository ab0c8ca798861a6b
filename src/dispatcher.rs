//! Forwarding of metric batches to the monitoring system
//!
//! For every metric of a batch, in order:
//!
//! ```text
//! host tag → ServiceRegistry::ensure(host, name) → result::build → process_check_result
//! ```
//!
//! A failing metric does not stop the batch. Failures are collected and
//! returned together once every metric has been tried. Nothing is retried.

use std::sync::Arc;

use tracing::{debug, error, instrument, trace, warn};

use crate::client::MonitoringApi;
use crate::error::{DispatchError, MetricFailure, SubmissionError};
use crate::registry::ServiceRegistry;
use crate::{HOST_TAG, Metric, ServiceIdentity, result, tags};

/// Sends metric batches as passive check results
///
/// Cloning is cheap and clones share the connection and the registry's locks,
/// so batches may be processed concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn MonitoringApi>,
    registry: ServiceRegistry,

    /// Prepended to metric names to form service names
    prefix: String,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn MonitoringApi>, check_command: impl ToString) -> Self {
        Self {
            registry: ServiceRegistry::new(api.clone(), check_command),
            api,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl ToString) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Entry point for the agent: forward one flushed batch.
    pub async fn write(&self, metrics: &[Metric]) -> Result<(), DispatchError> {
        self.process(metrics).await
    }

    /// Forward every metric of the batch, in order.
    ///
    /// An empty batch succeeds without any remote call.
    #[instrument(skip_all, fields(batch = metrics.len()))]
    pub async fn process(&self, metrics: &[Metric]) -> Result<(), DispatchError> {
        if metrics.is_empty() {
            trace!("empty batch, nothing to forward");
            return Ok(());
        }

        let mut failures = Vec::new();

        for metric in metrics {
            if let Err(failure) = self.process_one(metric).await {
                error!("{failure}");
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            debug!("forwarded {} metrics", metrics.len());
            Ok(())
        } else {
            Err(DispatchError {
                total: metrics.len(),
                failures,
            })
        }
    }

    async fn process_one(&self, metric: &Metric) -> Result<(), MetricFailure> {
        if !metric.tags.contains_key(HOST_TAG) {
            warn!(
                "metric {} has no host tag [{}], using an empty host",
                metric.name,
                tags::canonicalize(&metric.tags)
            );
        }

        let name = format!("{}{}", self.prefix, metric.name);
        let identity = ServiceIdentity::new(metric.host(), name);
        trace!("{identity} [{}]", tags::canonicalize(&metric.tags));

        self.registry.ensure(&identity.host, &identity.name).await?;

        let check_result = result::build(&identity.host, &metric.fields);

        self.api
            .process_check_result(&identity, &check_result)
            .await
            .map_err(|source| SubmissionError {
                identity: identity.clone(),
                source,
            })?;

        Ok(())
    }
}
