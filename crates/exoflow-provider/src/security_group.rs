//! Security group management
//!
//! Groups are looked up by exact name. A group that already exists is
//! reused as is; its rules are never compared with the configuration.

use crate::error::Result;
use crate::terminator::DeletionPolicy;
use exoflow_cloud::{CloudDriver, IngressRequest, SecurityGroup};
use exoflow_config::{ProviderConfig, Role};
use tracing::{debug, info};

pub struct SecurityGroupManager<'a> {
    driver: &'a dyn CloudDriver,
    config: &'a ProviderConfig,
}

impl<'a> SecurityGroupManager<'a> {
    pub fn new(driver: &'a dyn CloudDriver, config: &'a ProviderConfig) -> Self {
        Self { driver, config }
    }

    pub fn management_security_group_name(&self) -> Result<&'a str> {
        Ok(self.config.security_group_name(Role::Management)?)
    }

    pub fn agents_security_group_name(&self) -> Result<&'a str> {
        Ok(self.config.security_group_name(Role::Agents)?)
    }

    pub async fn get_security_group(&self, name: &str) -> Result<Option<SecurityGroup>> {
        let groups = self.driver.list_security_groups().await?;
        Ok(groups.into_iter().find(|sg| sg.name == name))
    }

    /// Ensure the management group, then the agents group, exist
    pub async fn create_security_groups(&self) -> Result<()> {
        for role in Role::ALL {
            debug!("reading {} security group configuration", role);
            self.ensure_security_group(role).await?;
        }
        Ok(())
    }

    /// Returns `true` when the group was created by this call
    pub async fn ensure_security_group(&self, role: Role) -> Result<bool> {
        let name = self.config.security_group_name(role)?;

        if self.get_security_group(name).await?.is_some() {
            info!("Using existing {} security group {}", role, name);
            return Ok(false);
        }

        let (ports, protocol, cidr) = self.config.security_group(role).rules(role)?;

        info!("Creating {} security group {}", role, name);
        self.driver.create_security_group(name).await?;

        for port in ports {
            let rule = IngressRequest::single_port(name, protocol, *port, cidr);
            debug!(
                security_group = name,
                protocol, port, cidr, "authorizing ingress rule"
            );
            self.driver.authorize_security_group_ingress(&rule).await?;
        }
        Ok(true)
    }

    /// Delete both groups; every deletion is attempted under `BestEffort`
    pub async fn delete_security_groups(&self, policy: DeletionPolicy) -> Result<()> {
        for role in Role::ALL {
            let name = self.config.security_group_name(role)?;
            debug!("deleting {} security group {}", role, name);
            let result = self.driver.delete_security_group(name).await;
            policy.settle(&format!("{} security group {}", role, name), result)?;
        }
        Ok(())
    }
}
