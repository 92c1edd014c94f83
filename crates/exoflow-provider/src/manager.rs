//! Provision / validate / teardown entry points

use crate::compute::ComputeManager;
use crate::connector::{Connector, ExoscaleConnector};
use crate::error::Result;
use crate::keypair::{KeypairManager, KeypairOverrides};
use crate::security_group::SecurityGroupManager;
use crate::terminator::{ResourceTerminator, TeardownPolicy};
use crate::transfer::{CredentialDistributor, FileTransfer, ScpTransfer, SessionConfig};
use exoflow_cloud::ProviderContext;
use exoflow_config::{ProviderConfig, Role};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Validation errors keyed by config path
pub type ValidationErrors = BTreeMap<String, String>;

/// Result of a successful provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutput {
    pub public_ip: String,
    /// Exoscale basic zones only allocate public addresses
    pub private_ip: String,
    /// Private key of the management keypair
    pub private_key_path: PathBuf,
    pub ssh_user: String,
    pub context: ProviderContext,
}

/// Lifecycle of the management server and its cloud resources
pub struct ProviderManager {
    config: ProviderConfig,
    connector: Arc<dyn Connector>,
    transfer: Arc<dyn FileTransfer>,
    session: SessionConfig,
    keypair_overrides: KeypairOverrides,
}

impl ProviderManager {
    /// Manager talking to Exoscale and uploading with `scp`
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(ExoscaleConnector),
            Arc::new(ScpTransfer::default()),
        )
    }

    pub fn with_collaborators(
        config: ProviderConfig,
        connector: Arc<dyn Connector>,
        transfer: Arc<dyn FileTransfer>,
    ) -> Self {
        Self {
            config,
            connector,
            transfer,
            session: SessionConfig::default(),
            keypair_overrides: KeypairOverrides::default(),
        }
    }

    pub fn with_session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_keypair_overrides(mut self, overrides: KeypairOverrides) -> Self {
        self.keypair_overrides = overrides;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Create or reuse keypairs and security groups, launch the management
    /// server and place the agents' key on it
    #[instrument(skip(self))]
    pub async fn provision(&self) -> Result<ProvisionOutput> {
        info!("Provisioning Exoscale resources for the management server");

        let driver = self.connector.connect(&self.config).await?;
        let keypairs = KeypairManager::new(driver.as_ref(), &self.config);
        let security_groups = SecurityGroupManager::new(driver.as_ref(), &self.config);

        debug!("creating the required resources for the management server");
        security_groups.create_security_groups().await?;
        keypairs.create_key_pairs(&self.keypair_overrides).await?;

        let keypair_name = match &self.keypair_overrides.management.name {
            Some(name) => name.clone(),
            None => keypairs.management_keypair_name()?.to_string(),
        };
        let security_group_name = security_groups.management_security_group_name()?;

        let private_key_path = match &self.keypair_overrides.management.private_key_target_path {
            Some(path) => path.clone(),
            None => self.config.private_key_path(Role::Management)?,
        };
        let ssh_user = self.config.user_on_management()?.to_string();

        let compute = ComputeManager::new(driver.as_ref(), &self.config)
            .with_keypair_name(keypair_name)
            .with_security_group_names(vec![security_group_name.to_string()]);
        let public_ip = compute.create_node().await?;
        let context = ProviderContext::new(public_ip.clone());

        info!(
            public_ip = %public_ip,
            key = %private_key_path.display(),
            user = %ssh_user,
            "Management server is up"
        );

        CredentialDistributor::new(self.transfer.as_ref(), &self.config, self.session.clone())
            .with_agents_key_path(self.keypair_overrides.agents.private_key_target_path.clone())
            .copy_agents_key_to_manager(&public_ip, &private_key_path, &ssh_user)
            .await?;

        Ok(ProvisionOutput {
            private_ip: public_ip.clone(),
            public_ip,
            private_key_path,
            ssh_user,
            context,
        })
    }

    /// Checks run before provisioning. None are defined; errors pass through.
    pub fn validate(&self, validation_errors: ValidationErrors) -> ValidationErrors {
        validation_errors
    }

    /// Destroy the management server recorded in `context`, then its
    /// keypairs and security groups
    #[instrument(skip(self, context), fields(ip = %context.ip))]
    pub async fn teardown(&self, context: &ProviderContext, ignore_validation: bool) -> Result<()> {
        info!("Tearing down management server {}", context.ip);
        if ignore_validation {
            debug!("ignore_validation set; no teardown validation is performed");
        }

        let driver = self.connector.connect(&self.config).await?;
        let terminator = ResourceTerminator::new(
            SecurityGroupManager::new(driver.as_ref(), &self.config),
            KeypairManager::new(driver.as_ref(), &self.config),
            ComputeManager::new(driver.as_ref(), &self.config),
            context.ip.clone(),
        )
        .with_policy(TeardownPolicy::from_config(&self.config.teardown));

        debug!("terminating the management server and all of its resources");
        terminator.terminate_resources().await
    }
}
