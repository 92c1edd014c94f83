//! Exoscale compute API client
//!
//! Wraps the CloudStack-compatible compute endpoint. Every command is a
//! signed GET request; the payload sits under a `<command>response` key.

use crate::error::{ExoscaleError, Result};
use crate::models::{
    ApiErrorBody, ApiKeyPair, ApiSecurityGroup, ApiServiceOffering, ApiTemplate,
    ApiVirtualMachine, ApiZone, AsyncJobResponse, AsyncJobStatus, JOB_PENDING, JOB_SUCCEEDED,
    KeyPairResponse, ListKeyPairsResponse, ListSecurityGroupsResponse,
    ListServiceOfferingsResponse, ListTemplatesResponse, ListVirtualMachinesResponse,
    ListZonesResponse, SecurityGroupResponse, VirtualMachineResult,
};
use crate::signing::signed_query;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default compute endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.exoscale.ch/compute";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Polling interval for async jobs.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Give up on an async job after this long.
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;

/// Template filter used when listing images
const TEMPLATE_FILTER: &str = "executable";

/// Parameters of one deployVirtualMachine call
#[derive(Debug, Clone)]
pub struct DeployVirtualMachine {
    pub name: String,
    pub template_id: String,
    pub service_offering_id: String,
    pub zone_id: String,
    pub keypair: String,
    pub security_group_names: Vec<String>,
}

/// Exoscale compute API client
#[derive(Clone)]
pub struct ExoscaleApi {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl ExoscaleApi {
    /// Create a client against the default endpoint
    ///
    /// # Errors
    /// Returns error if credentials are empty or the HTTP client cannot be
    /// created.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, api_secret, DEFAULT_ENDPOINT)
    }

    /// Create a client against a specific endpoint
    pub fn with_endpoint(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ExoscaleError::MissingCredentials);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        })
    }

    /// Override async job polling
    pub fn with_job_polling(mut self, poll_interval: Duration, job_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.job_timeout = job_timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a command and return the payload under `<command>response`
    async fn request(&self, command: &str, args: &[(&str, String)]) -> Result<Value> {
        let mut params: Vec<(String, String)> = vec![
            ("command".to_string(), command.to_string()),
            ("apiKey".to_string(), self.api_key.clone()),
            ("response".to_string(), "json".to_string()),
        ];
        params.extend(args.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let url = format!("{}?{}", self.endpoint, signed_query(&params, &self.api_secret));
        debug!(command, endpoint = %self.endpoint, "GET request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_text(&text).unwrap_or_else(|| text.clone());
            return Err(match status.as_u16() {
                // CloudStack answers 432 for bad signatures
                401 | 403 | 432 => ExoscaleError::AuthenticationFailed(message),
                code => ExoscaleError::Api { code, message },
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        let key = format!("{}response", command.to_lowercase());
        body.get(&key).cloned().ok_or_else(|| {
            ExoscaleError::UnexpectedResponse(format!("missing '{}' in response", key))
        })
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        command: &str,
        args: &[(&str, String)],
    ) -> Result<T> {
        let payload = self.request(command, args).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Run an asynchronous command and wait for its job result
    async fn request_job(&self, command: &str, args: &[(&str, String)]) -> Result<Value> {
        let job: AsyncJobResponse = self.request_as(command, args).await?;
        self.wait_for_job(&job.jobid).await
    }

    async fn wait_for_job(&self, job_id: &str) -> Result<Value> {
        let started = Instant::now();
        loop {
            let status: AsyncJobStatus = self
                .request_as("queryAsyncJobResult", &[("jobid", job_id.to_string())])
                .await?;

            match status.jobstatus {
                JOB_PENDING => {
                    if started.elapsed() >= self.job_timeout {
                        return Err(ExoscaleError::JobTimeout {
                            job_id: job_id.to_string(),
                            secs: self.job_timeout.as_secs(),
                        });
                    }
                    debug!(job_id, "job pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
                JOB_SUCCEEDED => return Ok(status.jobresult.unwrap_or(Value::Null)),
                _ => {
                    let message = status
                        .jobresult
                        .and_then(|r| serde_json::from_value::<ApiErrorBody>(r).ok())
                        .and_then(|e| e.errortext)
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(ExoscaleError::JobFailed {
                        job_id: job_id.to_string(),
                        message,
                    });
                }
            }
        }
    }

    pub async fn list_zones(&self) -> Result<Vec<ApiZone>> {
        let list: ListZonesResponse = self.request_as("listZones", &[]).await?;
        Ok(list.zone)
    }

    pub async fn list_ssh_key_pairs(&self) -> Result<Vec<ApiKeyPair>> {
        let list: ListKeyPairsResponse = self.request_as("listSSHKeyPairs", &[]).await?;
        Ok(list.sshkeypair)
    }

    pub async fn create_ssh_key_pair(&self, name: &str) -> Result<ApiKeyPair> {
        let created: KeyPairResponse = self
            .request_as("createSSHKeyPair", &[("name", name.to_string())])
            .await?;
        Ok(created.keypair)
    }

    pub async fn register_ssh_key_pair(&self, name: &str, public_key: &str) -> Result<ApiKeyPair> {
        let registered: KeyPairResponse = self
            .request_as(
                "registerSSHKeyPair",
                &[
                    ("name", name.to_string()),
                    ("publickey", public_key.to_string()),
                ],
            )
            .await?;
        Ok(registered.keypair)
    }

    pub async fn delete_ssh_key_pair(&self, name: &str) -> Result<()> {
        let payload = self
            .request("deleteSSHKeyPair", &[("name", name.to_string())])
            .await?;
        expect_success("deleteSSHKeyPair", &payload)
    }

    pub async fn list_security_groups(&self) -> Result<Vec<ApiSecurityGroup>> {
        let list: ListSecurityGroupsResponse =
            self.request_as("listSecurityGroups", &[]).await?;
        Ok(list.securitygroup)
    }

    pub async fn create_security_group(&self, name: &str) -> Result<ApiSecurityGroup> {
        let created: SecurityGroupResponse = self
            .request_as("createSecurityGroup", &[("name", name.to_string())])
            .await?;
        Ok(created.securitygroup)
    }

    pub async fn delete_security_group(&self, name: &str) -> Result<()> {
        let payload = self
            .request("deleteSecurityGroup", &[("name", name.to_string())])
            .await?;
        expect_success("deleteSecurityGroup", &payload)
    }

    pub async fn authorize_security_group_ingress(
        &self,
        security_group_name: &str,
        protocol: &str,
        start_port: u16,
        end_port: u16,
        cidr_list: &str,
    ) -> Result<()> {
        self.request_job(
            "authorizeSecurityGroupIngress",
            &[
                ("securitygroupname", security_group_name.to_string()),
                ("protocol", protocol.to_string()),
                ("startport", start_port.to_string()),
                ("endport", end_port.to_string()),
                ("cidrlist", cidr_list.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn list_templates(&self) -> Result<Vec<ApiTemplate>> {
        let list: ListTemplatesResponse = self
            .request_as("listTemplates", &[("templatefilter", TEMPLATE_FILTER.to_string())])
            .await?;
        Ok(list.template)
    }

    pub async fn list_service_offerings(&self) -> Result<Vec<ApiServiceOffering>> {
        let list: ListServiceOfferingsResponse =
            self.request_as("listServiceOfferings", &[]).await?;
        Ok(list.serviceoffering)
    }

    pub async fn list_virtual_machines(&self) -> Result<Vec<ApiVirtualMachine>> {
        let list: ListVirtualMachinesResponse =
            self.request_as("listVirtualMachines", &[]).await?;
        Ok(list.virtualmachine)
    }

    pub async fn deploy_virtual_machine(
        &self,
        request: &DeployVirtualMachine,
    ) -> Result<ApiVirtualMachine> {
        let mut args = vec![
            ("serviceofferingid", request.service_offering_id.clone()),
            ("templateid", request.template_id.clone()),
            ("zoneid", request.zone_id.clone()),
            ("name", request.name.clone()),
            ("displayname", request.name.clone()),
            ("keypair", request.keypair.clone()),
        ];
        if !request.security_group_names.is_empty() {
            args.push(("securitygroupnames", request.security_group_names.join(",")));
        }

        let result = self.request_job("deployVirtualMachine", &args).await?;
        let deployed: VirtualMachineResult = serde_json::from_value(result)?;
        Ok(deployed.virtualmachine)
    }

    pub async fn destroy_virtual_machine(&self, id: &str) -> Result<()> {
        self.request_job("destroyVirtualMachine", &[("id", id.to_string())])
            .await?;
        Ok(())
    }
}

/// `errortext` of a CloudStack error body, whatever command it answers
fn error_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .as_object()?
        .values()
        .find_map(|v| serde_json::from_value::<ApiErrorBody>(v.clone()).ok()?.errortext)
}

/// Synchronous delete commands answer `{"success": true}` (bool or string)
fn expect_success(command: &str, payload: &Value) -> Result<()> {
    let ok = match payload.get("success") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        let message = payload
            .get("displaytext")
            .and_then(Value::as_str)
            .unwrap_or("operation reported failure")
            .to_string();
        Err(ExoscaleError::Api {
            code: 200,
            message: format!("{}: {}", command, message),
        })
    }
}
