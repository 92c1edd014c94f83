//! Management server instance

use crate::error::{ProviderError, Result};
use exoflow_cloud::{CloudDriver, CreateNodeRequest};
use exoflow_config::{ProviderConfig, Role};
use tracing::{debug, info};

/// Launches and destroys the management server.
///
/// Node name, keypair and security groups fall back to the configuration
/// when not set explicitly.
pub struct ComputeManager<'a> {
    driver: &'a dyn CloudDriver,
    config: &'a ProviderConfig,
    node_name: Option<String>,
    keypair_name: Option<String>,
    security_group_names: Option<Vec<String>>,
}

impl<'a> ComputeManager<'a> {
    pub fn new(driver: &'a dyn CloudDriver, config: &'a ProviderConfig) -> Self {
        Self {
            driver,
            config,
            node_name: None,
            keypair_name: None,
            security_group_names: None,
        }
    }

    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = Some(name.into());
        self
    }

    pub fn with_keypair_name(mut self, name: impl Into<String>) -> Self {
        self.keypair_name = Some(name.into());
        self
    }

    pub fn with_security_group_names(mut self, names: Vec<String>) -> Self {
        self.security_group_names = Some(names);
        self
    }

    /// Launch the instance and return its first public IP
    pub async fn create_node(&self) -> Result<String> {
        debug!("reading management server image and size from config");
        let image_id = self.config.image_id()?;
        let size_name = self.config.size_id()?;

        debug!("getting node image for ID {}", image_id);
        let image = self
            .driver
            .list_images()
            .await?
            .into_iter()
            .find(|image| image.id == image_id)
            .ok_or_else(|| ProviderError::NotFound(format!("image '{}'", image_id)))?;

        debug!("getting node size for name {}", size_name);
        let size = self
            .driver
            .list_sizes()
            .await?
            .into_iter()
            .find(|size| size.name == size_name)
            .ok_or_else(|| ProviderError::NotFound(format!("size '{}'", size_name)))?;

        let name = match &self.node_name {
            Some(name) => name.clone(),
            None => self.config.node_name()?.to_string(),
        };
        let keypair_name = match &self.keypair_name {
            Some(name) => name.clone(),
            None => self.config.keypair_name(Role::Management)?.to_string(),
        };
        let security_group_names = match &self.security_group_names {
            Some(names) => names.clone(),
            None => vec![self.config.security_group_name(Role::Management)?.to_string()],
        };

        info!("Starting a new virtual instance named {}", name);
        let request = CreateNodeRequest {
            name: name.clone(),
            image,
            size,
            keypair_name,
            security_group_names,
        };
        let node = self.driver.create_node(&request).await.map_err(|e| {
            ProviderError::Provisioning(format!("provider rejected instance '{}': {}", name, e))
        })?;

        let public_ip = node.public_ip().ok_or_else(|| {
            ProviderError::Provisioning(format!(
                "instance '{}' ({}) has no public IP",
                node.name, node.id
            ))
        })?;
        Ok(public_ip.to_string())
    }

    /// Destroy the first live node holding `ip`
    pub async fn delete_node(&self, ip: &str) -> Result<()> {
        debug!("getting node for IP {}", ip);
        let node = self
            .driver
            .list_nodes()
            .await?
            .into_iter()
            .find(|node| node.is_live() && node.has_public_ip(ip))
            .ok_or_else(|| ProviderError::NotFound(format!("no node with public IP {}", ip)))?;

        debug!("destroying node {} ({})", node.name, node.id);
        self.driver.destroy_node(&node).await?;
        Ok(())
    }
}
