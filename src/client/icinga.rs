//! Icinga2 REST API client
//!
//! Talks to the `/v1` API of an Icinga2 instance using HTTP basic auth.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /v1/objects/services/<host>!<name>     → 200 (found) | 404 (absent)
//! PUT  /v1/objects/services/<host>!<name>     → create service
//! POST /v1/actions/process-check-result      → passive check result
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::error::{ApiError, ApiResult};
use super::{MonitoringApi, Service};
use crate::ServiceIdentity;
use crate::config::{Config, ConfigError};
use crate::result::CheckResult;

/// Default timeout for a single API call
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ServiceObject {
    attrs: Service,
}

#[derive(Debug, Serialize)]
struct CreateServiceRequest<'a> {
    attrs: CreateServiceAttrs<'a>,
}

#[derive(Debug, Serialize)]
struct CreateServiceAttrs<'a> {
    host_name: &'a str,
    check_command: &'a str,
}

#[derive(Debug, Serialize)]
struct FilterVars<'a> {
    host_name: &'a str,
    service_name: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckResultRequest<'a> {
    #[serde(rename = "type")]
    object_type: &'static str,
    filter: &'static str,
    filter_vars: FilterVars<'a>,
    #[serde(flatten)]
    result: &'a CheckResult,
}

pub struct IcingaClientBuilder {
    base_url: Url,
    username: String,
    password: String,
    timeout: Duration,
    insecure_tls: bool,
    debug: bool,
}

impl IcingaClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept self-signed or otherwise invalid certificates.
    pub fn insecure_tls(mut self, insecure_tls: bool) -> Self {
        self.insecure_tls = insecure_tls;
        self
    }

    /// Log every request and response body at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> ApiResult<IcingaClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.insecure_tls)
            .build()?;

        Ok(IcingaClient {
            client,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            debug: self.debug,
            closed: AtomicBool::new(false),
        })
    }
}

/// Connection handle for an Icinga2 API endpoint
///
/// The underlying HTTP client is reused for every call.
#[derive(Debug)]
pub struct IcingaClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    debug: bool,
    closed: AtomicBool,
}

impl IcingaClient {
    pub fn builder(
        base_url: Url,
        username: impl ToString,
        password: impl ToString,
    ) -> IcingaClientBuilder {
        IcingaClientBuilder {
            base_url,
            username: username.to_string(),
            password: password.to_string(),
            timeout: DEFAULT_TIMEOUT,
            insecure_tls: false,
            debug: false,
        }
    }

    /// Validate the configuration and set up a client for its endpoint
    ///
    /// No request is made; connection problems surface on the first call.
    pub fn connect(config: &Config) -> Result<Self, ConfigError> {
        let base_url = config.endpoint()?;

        Self::builder(base_url, &config.username, &config.password)
            .timeout(Duration::from_secs(config.timeout))
            .insecure_tls(config.insecure_tls)
            .debug(config.debug)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Request(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn service_url(&self, identity: &ServiceIdentity) -> ApiResult<Url> {
        self.url(&["v1", "objects", "services", &identity.to_string()])
    }

    fn ensure_open(&self) -> ApiResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ApiError::Closed);
        }
        Ok(())
    }

    /// Send a request and return status and body.
    async fn send(&self, request: RequestBuilder) -> ApiResult<(StatusCode, String)> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if self.debug {
            debug!("icinga2 response ({status}): {body}");
        }

        Ok((status, body))
    }

    fn log_request(&self, method: &str, url: &Url) {
        if self.debug {
            debug!("icinga2 request: {method} {url}");
        } else {
            trace!("{method} {url}");
        }
    }

    /// Print a request body; serialized only in debug mode.
    fn log_payload(&self, payload: &impl Serialize) {
        if !self.debug {
            return;
        }
        match serde_json::to_string(payload) {
            Ok(body) => debug!("icinga2 payload: {body}"),
            Err(e) => debug!("icinga2 payload not printable: {e}"),
        }
    }
}

#[async_trait]
impl MonitoringApi for IcingaClient {
    #[instrument(skip(self), fields(service = %identity))]
    async fn get_service(&self, identity: &ServiceIdentity) -> ApiResult<Option<Service>> {
        self.ensure_open()?;
        let url = self.service_url(identity)?;
        self.log_request("GET", &url);

        let (status, body) = self.send(self.client.get(url)).await?;

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let response: QueryResponse<ServiceObject> = serde_json::from_str(&body)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
                Ok(response.results.into_iter().next().map(|object| object.attrs))
            }
            status => Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }

    #[instrument(skip(self, service), fields(service = %service.identity()))]
    async fn create_service(&self, service: &Service) -> ApiResult<()> {
        self.ensure_open()?;
        let url = self.service_url(&service.identity())?;
        let payload = CreateServiceRequest {
            attrs: CreateServiceAttrs {
                host_name: &service.host_name,
                check_command: &service.check_command,
            },
        };
        self.log_request("PUT", &url);
        self.log_payload(&payload);

        let (status, body) = self.send(self.client.put(url).json(&payload)).await?;

        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    #[instrument(skip(self, result), fields(service = %identity))]
    async fn process_check_result(
        &self,
        identity: &ServiceIdentity,
        result: &CheckResult,
    ) -> ApiResult<()> {
        self.ensure_open()?;
        let url = self.url(&["v1", "actions", "process-check-result"])?;
        let payload = CheckResultRequest {
            object_type: "Service",
            filter: "host.name==host_name && service.name==service_name",
            filter_vars: FilterVars {
                host_name: &identity.host,
                service_name: &identity.name,
            },
            result,
        };
        self.log_request("POST", &url);
        self.log_payload(&payload);

        let (status, body) = self.send(self.client.post(url).json(&payload)).await?;

        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn close(&self) -> ApiResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(ApiError::Closed);
        }
        debug!("closed connection to {}", self.base_url);
        Ok(())
    }
}
