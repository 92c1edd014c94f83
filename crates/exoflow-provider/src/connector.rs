//! Authenticated driver construction

use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use exoflow_cloud::CloudDriver;
use exoflow_cloud_exoscale::ExoscaleDriver;
use exoflow_config::ProviderConfig;
use std::sync::Arc;
use tracing::debug;

/// Builds a driver handle from the `authentication` section
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ProviderConfig) -> Result<Arc<dyn CloudDriver>>;
}

/// Connects to the Exoscale compute API
#[derive(Debug, Default, Clone, Copy)]
pub struct ExoscaleConnector;

#[async_trait]
impl Connector for ExoscaleConnector {
    async fn connect(&self, config: &ProviderConfig) -> Result<Arc<dyn CloudDriver>> {
        debug!("creating Exoscale connector");
        let api_key = config
            .api_key()
            .map_err(|e| ProviderError::Authentication(e.to_string()))?;
        let api_secret_key = config
            .api_secret_key()
            .map_err(|e| ProviderError::Authentication(e.to_string()))?;

        let driver = ExoscaleDriver::new(api_key, api_secret_key, config.api_endpoint(), config.zone())
            .map_err(exoflow_cloud::CloudError::from)?;

        ensure_authenticated(Arc::new(driver)).await
    }
}

/// Make one cheap authenticated call and reject the handle if it fails
pub async fn ensure_authenticated(driver: Arc<dyn CloudDriver>) -> Result<Arc<dyn CloudDriver>> {
    let status = driver.check_auth().await?;
    if !status.authenticated {
        return Err(ProviderError::Authentication(
            status
                .error
                .unwrap_or_else(|| "credentials rejected by the provider".to_string()),
        ));
    }

    debug!(
        driver = driver.name(),
        account = status.account_info.as_deref().unwrap_or("-"),
        "authenticated"
    );
    Ok(driver)
}
