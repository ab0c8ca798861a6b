//! Errors reported by the registry and the dispatcher
//!
//! Every error names the service it happened for, so callers can log or retry
//! at a higher level.

use std::fmt;

use crate::ServiceIdentity;
use crate::client::ApiError;

/// Failure while making sure a service exists
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The lookup failed for a reason other than "not found"
    Lookup {
        identity: ServiceIdentity,
        source: ApiError,
    },

    /// The service was absent and could not be created
    Create {
        identity: ServiceIdentity,
        source: ApiError,
    },
}

impl RegistryError {
    pub fn identity(&self) -> &ServiceIdentity {
        match self {
            RegistryError::Lookup { identity, .. } | RegistryError::Create { identity, .. } => {
                identity
            }
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Lookup { identity, source } => {
                write!(f, "failed to look up service {}: {}", identity, source)
            }
            RegistryError::Create { identity, source } => {
                write!(f, "failed to create service {}: {}", identity, source)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Lookup { source, .. } | RegistryError::Create { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Failure while posting a check result
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionError {
    pub identity: ServiceIdentity,
    pub source: ApiError,
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to submit check result for {}: {}",
            self.identity, self.source
        )
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Why a single metric was not delivered
#[derive(Debug, Clone, PartialEq)]
pub enum MetricFailure {
    Registry(RegistryError),
    Submission(SubmissionError),
}

impl MetricFailure {
    pub fn identity(&self) -> &ServiceIdentity {
        match self {
            MetricFailure::Registry(err) => err.identity(),
            MetricFailure::Submission(err) => &err.identity,
        }
    }
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricFailure::Registry(err) => fmt::Display::fmt(err, f),
            MetricFailure::Submission(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<RegistryError> for MetricFailure {
    fn from(err: RegistryError) -> Self {
        MetricFailure::Registry(err)
    }
}

impl From<SubmissionError> for MetricFailure {
    fn from(err: SubmissionError) -> Self {
        MetricFailure::Submission(err)
    }
}

/// Outcome of a batch in which at least one metric was not delivered
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchError {
    /// Number of metrics in the batch
    pub total: usize,

    /// Failures in batch order
    pub failures: Vec<MetricFailure>,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} metrics could not be delivered",
            self.failures.len(),
            self.total
        )?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for DispatchError {}
