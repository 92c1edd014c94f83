//! Exoscale implementation of [`CloudDriver`]

use crate::api::{DeployVirtualMachine, ExoscaleApi};
use crate::error::{ExoscaleError, Result};
use async_trait::async_trait;
use exoflow_cloud::{
    AuthStatus, CloudDriver, CreateNodeRequest, CreatedKeyPair, Image, IngressRequest, KeyPair,
    Node, SecurityGroup, Size,
};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Exoscale compute driver
pub struct ExoscaleDriver {
    api: ExoscaleApi,
    /// Zone name or ID from the configuration
    zone: Option<String>,
    /// Zone ID resolved on first deploy
    zone_id: OnceCell<String>,
}

impl ExoscaleDriver {
    /// Create a driver. `endpoint` falls back to the public compute endpoint,
    /// `zone` to the first zone the account lists.
    pub fn new(
        api_key: &str,
        api_secret: &str,
        endpoint: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Self> {
        let api = match endpoint {
            Some(endpoint) => ExoscaleApi::with_endpoint(api_key, api_secret, endpoint)?,
            None => ExoscaleApi::new(api_key, api_secret)?,
        };
        Ok(Self::from_api(api, zone))
    }

    pub fn from_api(api: ExoscaleApi, zone: Option<&str>) -> Self {
        Self {
            api,
            zone: zone.map(str::to_string),
            zone_id: OnceCell::new(),
        }
    }

    /// Override async job polling (tests use short intervals)
    pub fn with_job_polling(mut self, poll_interval: Duration, job_timeout: Duration) -> Self {
        self.api = self.api.with_job_polling(poll_interval, job_timeout);
        self
    }

    pub fn api(&self) -> &ExoscaleApi {
        &self.api
    }

    async fn resolve_zone_id(&self) -> Result<String> {
        self.zone_id
            .get_or_try_init(|| async {
                let zones = self.api.list_zones().await?;
                let zone = match &self.zone {
                    Some(wanted) => zones
                        .into_iter()
                        .find(|z| z.id == *wanted || z.name.eq_ignore_ascii_case(wanted))
                        .ok_or_else(|| ExoscaleError::ZoneNotFound(wanted.clone()))?,
                    None => zones
                        .into_iter()
                        .next()
                        .ok_or_else(|| ExoscaleError::ZoneNotFound("<any>".to_string()))?,
                };
                debug!(zone = %zone.name, zone_id = %zone.id, "Resolved zone");
                Ok::<_, ExoscaleError>(zone.id)
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl CloudDriver for ExoscaleDriver {
    fn name(&self) -> &str {
        "exoscale"
    }

    async fn check_auth(&self) -> exoflow_cloud::Result<AuthStatus> {
        match self.api.list_zones().await {
            Ok(zones) => Ok(AuthStatus::ok(format!(
                "{} ({} zones visible)",
                self.api.endpoint(),
                zones.len()
            ))),
            Err(ExoscaleError::AuthenticationFailed(message)) => Ok(AuthStatus::failed(message)),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_key_pairs(&self) -> exoflow_cloud::Result<Vec<KeyPair>> {
        let pairs = self.api.list_ssh_key_pairs().await?;
        Ok(pairs.into_iter().map(Into::into).collect())
    }

    async fn create_key_pair(&self, name: &str) -> exoflow_cloud::Result<CreatedKeyPair> {
        let created = self.api.create_ssh_key_pair(name).await?;
        let private_key = created.privatekey.ok_or_else(|| {
            ExoscaleError::UnexpectedResponse(format!(
                "createSSHKeyPair returned no private key for '{}'",
                name
            ))
        })?;
        info!(keypair = %created.name, "Created keypair");
        Ok(CreatedKeyPair {
            name: created.name,
            fingerprint: created.fingerprint,
            private_key,
        })
    }

    async fn import_key_pair(&self, name: &str, public_key: &str) -> exoflow_cloud::Result<KeyPair> {
        let registered = self.api.register_ssh_key_pair(name, public_key.trim()).await?;
        info!(keypair = %registered.name, "Imported keypair");
        Ok(registered.into())
    }

    async fn delete_key_pair(&self, name: &str) -> exoflow_cloud::Result<()> {
        self.api.delete_ssh_key_pair(name).await?;
        Ok(())
    }

    async fn list_security_groups(&self) -> exoflow_cloud::Result<Vec<SecurityGroup>> {
        let groups = self.api.list_security_groups().await?;
        Ok(groups.into_iter().map(Into::into).collect())
    }

    async fn create_security_group(&self, name: &str) -> exoflow_cloud::Result<SecurityGroup> {
        let group = self.api.create_security_group(name).await?;
        Ok(group.into())
    }

    async fn delete_security_group(&self, name: &str) -> exoflow_cloud::Result<()> {
        self.api.delete_security_group(name).await?;
        Ok(())
    }

    async fn authorize_security_group_ingress(
        &self,
        request: &IngressRequest,
    ) -> exoflow_cloud::Result<()> {
        self.api
            .authorize_security_group_ingress(
                &request.security_group_name,
                &request.protocol,
                request.start_port,
                request.effective_end_port(),
                &request.cidr_list,
            )
            .await?;
        Ok(())
    }

    async fn list_images(&self) -> exoflow_cloud::Result<Vec<Image>> {
        let templates = self.api.list_templates().await?;
        Ok(templates.into_iter().map(Into::into).collect())
    }

    async fn list_sizes(&self) -> exoflow_cloud::Result<Vec<Size>> {
        let offerings = self.api.list_service_offerings().await?;
        Ok(offerings.into_iter().map(Into::into).collect())
    }

    async fn list_nodes(&self) -> exoflow_cloud::Result<Vec<Node>> {
        let vms = self.api.list_virtual_machines().await?;
        Ok(vms.into_iter().map(Into::into).collect())
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> exoflow_cloud::Result<Node> {
        let zone_id = self.resolve_zone_id().await?;
        let deploy = DeployVirtualMachine {
            name: request.name.clone(),
            template_id: request.image.id.clone(),
            service_offering_id: request.size.id.clone(),
            zone_id,
            keypair: request.keypair_name.clone(),
            security_group_names: request.security_group_names.clone(),
        };

        let vm = self.api.deploy_virtual_machine(&deploy).await?;
        Ok(vm.into())
    }

    async fn destroy_node(&self, node: &Node) -> exoflow_cloud::Result<()> {
        self.api.destroy_virtual_machine(&node.id).await?;
        info!(node = %node.name, id = %node.id, "Destroyed node");
        Ok(())
    }
}
