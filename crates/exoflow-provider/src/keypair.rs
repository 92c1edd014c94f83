//! SSH keypair management
//!
//! A keypair is resolved in priority order: an existing keypair with the
//! same name is reused, else a provided public key is imported, else the
//! provider generates one and its private key is written to disk.

use crate::error::{ProviderError, Result};
use crate::terminator::DeletionPolicy;
use exoflow_cloud::{CloudDriver, KeyPair};
use exoflow_config::{ProviderConfig, Role};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Values that take precedence over the configured keypair section
#[derive(Debug, Clone, Default)]
pub struct KeypairOverride {
    pub name: Option<String>,
    pub public_key_filepath: Option<PathBuf>,
    pub private_key_target_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct KeypairOverrides {
    pub management: KeypairOverride,
    pub agents: KeypairOverride,
}

impl KeypairOverrides {
    fn for_role(&self, role: Role) -> &KeypairOverride {
        match role {
            Role::Management => &self.management,
            Role::Agents => &self.agents,
        }
    }
}

/// How a keypair came to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypairSource {
    Existing,
    Imported,
    /// Generated by the provider; the private key was written here
    Generated(PathBuf),
}

pub struct KeypairManager<'a> {
    driver: &'a dyn CloudDriver,
    config: &'a ProviderConfig,
}

impl<'a> KeypairManager<'a> {
    pub fn new(driver: &'a dyn CloudDriver, config: &'a ProviderConfig) -> Self {
        Self { driver, config }
    }

    pub fn management_keypair_name(&self) -> Result<&'a str> {
        Ok(self.config.keypair_name(Role::Management)?)
    }

    pub fn agents_keypair_name(&self) -> Result<&'a str> {
        Ok(self.config.keypair_name(Role::Agents)?)
    }

    async fn get_keypair(&self, name: &str) -> Result<Option<KeyPair>> {
        let keypairs = self.driver.list_key_pairs().await?;
        Ok(keypairs.into_iter().find(|kp| kp.name == name))
    }

    /// Ensure the management keypair, then the agents keypair, exist
    pub async fn create_key_pairs(&self, overrides: &KeypairOverrides) -> Result<()> {
        for role in Role::ALL {
            debug!("reading {} keypair configuration", role);
            self.ensure_keypair(role, overrides.for_role(role)).await?;
        }
        Ok(())
    }

    pub async fn ensure_keypair(
        &self,
        role: Role,
        overrides: &KeypairOverride,
    ) -> Result<KeypairSource> {
        let keypair_config = self.config.keypair(role);
        let name = match &overrides.name {
            Some(name) => name.clone(),
            None => self.config.keypair_name(role)?.to_string(),
        };
        let private_key_target = overrides
            .private_key_target_path
            .clone()
            .or_else(|| keypair_config.private_key_target_path());
        let public_key_path = overrides
            .public_key_filepath
            .clone()
            .or_else(|| keypair_config.public_key_filepath());

        if self.get_keypair(&name).await?.is_some() {
            info!("Using existing keypair {}", name);
            return Ok(KeypairSource::Existing);
        }

        if let Some(public_key_path) = public_key_path {
            if !public_key_path.exists() {
                return Err(ProviderError::NotFound(format!(
                    "public key {} was not found on the local file system",
                    public_key_path.display()
                )));
            }

            debug!(
                "importing public key with name {} from {}",
                name,
                public_key_path.display()
            );
            let public_key = tokio::fs::read_to_string(&public_key_path).await?;
            self.driver.import_key_pair(&name, &public_key).await?;
            return Ok(KeypairSource::Imported);
        }

        let Some(target) = private_key_target else {
            return Err(ProviderError::Configuration(format!(
                "{} keypair '{}' not found; provide {path}.auto_generated.private_key_target_path, \
                 {path}.provided.public_key_filepath or the name of an existing keypair",
                role,
                name,
                path = role.keypair_path()
            )));
        };

        info!("Creating a keypair named {}", name);
        let created = self.driver.create_key_pair(&name).await?;

        debug!("writing private key to file {}", target.display());
        write_private_key(&target, &created.private_key).await?;
        Ok(KeypairSource::Generated(target))
    }

    /// Delete the management then the agents keypair by name
    pub async fn delete_keypairs(&self, policy: DeletionPolicy) -> Result<()> {
        for role in Role::ALL {
            let name = self.config.keypair_name(role)?;
            info!("Deleting {} keypair {}", role, name);
            let result = self.driver.delete_key_pair(name).await;
            policy.settle(&format!("{} keypair {}", role, name), result)?;
        }
        Ok(())
    }
}

/// Write a private key with mode 0600, atomically replacing `target`
async fn write_private_key(target: &Path, private_key: &str) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let target = target.to_path_buf();
    let private_key = private_key.to_string();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(private_key.as_bytes())?;
        file.flush()?;
        file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(())
}
