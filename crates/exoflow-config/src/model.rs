//! Typed view of the merged provider configuration
//!
//! Every field is optional at parse time. Required keys are checked by the
//! accessor that needs them, so a teardown never fails because a
//! provisioning-only key is absent.

use crate::error::{ConfigError, Result};
use crate::paths::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub authentication: AuthenticationConfig,
    pub compute: ComputeConfig,
    pub networking: NetworkingConfig,
    pub teardown: TeardownConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    pub api_key: Option<String>,
    pub api_secret_key: Option<String>,
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub management_server: ManagementServerConfig,
    pub agent_servers: AgentServersConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementServerConfig {
    pub instance: InstanceConfig,
    pub management_keypair: KeypairConfig,
    pub userhome_on_management: Option<String>,
    pub user_on_management: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Template ID
    pub image: Option<String>,
    /// Service offering name
    pub size: Option<String>,
    pub name: Option<String>,
    /// Zone name or ID; the first zone the account lists when absent
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentServersConfig {
    pub agents_keypair: KeypairConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypairConfig {
    pub name: Option<String>,
    pub provided: Option<ProvidedKeyConfig>,
    pub auto_generated: Option<AutoGeneratedKeyConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidedKeyConfig {
    pub public_key_filepath: Option<String>,
    pub private_key_filepath: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoGeneratedKeyConfig {
    pub private_key_target_path: Option<String>,
}

impl KeypairConfig {
    /// Public key to import, from `provided.public_key_filepath`
    pub fn public_key_filepath(&self) -> Option<PathBuf> {
        self.provided
            .as_ref()
            .and_then(|p| non_empty(p.public_key_filepath.as_deref()))
            .map(expand_home)
    }

    /// Where a generated private key is written
    pub fn private_key_target_path(&self) -> Option<PathBuf> {
        self.auto_generated
            .as_ref()
            .and_then(|a| non_empty(a.private_key_target_path.as_deref()))
            .map(expand_home)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkingConfig {
    pub management_security_group: SecurityGroupConfig,
    pub agents_security_group: SecurityGroupConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupConfig {
    pub name: Option<String>,
    pub ports: Option<Vec<u16>>,
    pub cidr: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Log and continue when a keypair cannot be deleted
    pub best_effort_keypairs: bool,
}

/// Which of the two keypairs / security groups a lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Management,
    Agents,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Management, Role::Agents];

    pub fn label(&self) -> &'static str {
        match self {
            Role::Management => "management",
            Role::Agents => "agents",
        }
    }

    /// Dotted config path of this role's keypair section
    pub fn keypair_path(&self) -> &'static str {
        match self {
            Role::Management => "compute.management_server.management_keypair",
            Role::Agents => "compute.agent_servers.agents_keypair",
        }
    }

    /// Dotted config path of this role's security group section
    pub fn security_group_path(&self) -> &'static str {
        match self {
            Role::Management => "networking.management_security_group",
            Role::Agents => "networking.agents_security_group",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Require a configured value, naming `key` when it is absent
pub fn require<'a, T: ?Sized>(value: Option<&'a T>, key: &str) -> Result<&'a T> {
    value.ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

/// Like [`require`] for strings; an empty string counts as absent
pub fn require_str<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    require(non_empty(value), key)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

impl ProviderConfig {
    pub fn api_key(&self) -> Result<&str> {
        require_str(
            self.authentication.api_key.as_deref(),
            "authentication.api_key",
        )
    }

    pub fn api_secret_key(&self) -> Result<&str> {
        require_str(
            self.authentication.api_secret_key.as_deref(),
            "authentication.api_secret_key",
        )
    }

    pub fn api_endpoint(&self) -> Option<&str> {
        non_empty(self.authentication.api_endpoint.as_deref())
    }

    pub fn instance(&self) -> &InstanceConfig {
        &self.compute.management_server.instance
    }

    pub fn image_id(&self) -> Result<&str> {
        require_str(
            self.instance().image.as_deref(),
            "compute.management_server.instance.image",
        )
    }

    pub fn size_id(&self) -> Result<&str> {
        require_str(
            self.instance().size.as_deref(),
            "compute.management_server.instance.size",
        )
    }

    pub fn node_name(&self) -> Result<&str> {
        require_str(
            self.instance().name.as_deref(),
            "compute.management_server.instance.name",
        )
    }

    pub fn zone(&self) -> Option<&str> {
        non_empty(self.instance().zone.as_deref())
    }

    pub fn user_on_management(&self) -> Result<&str> {
        require_str(
            self.compute.management_server.user_on_management.as_deref(),
            "compute.management_server.user_on_management",
        )
    }

    pub fn userhome_on_management(&self) -> Result<&str> {
        require_str(
            self.compute.management_server.userhome_on_management.as_deref(),
            "compute.management_server.userhome_on_management",
        )
    }

    pub fn keypair(&self, role: Role) -> &KeypairConfig {
        match role {
            Role::Management => &self.compute.management_server.management_keypair,
            Role::Agents => &self.compute.agent_servers.agents_keypair,
        }
    }

    pub fn keypair_name(&self, role: Role) -> Result<&str> {
        require_str(
            self.keypair(role).name.as_deref(),
            &format!("{}.name", role.keypair_path()),
        )
    }

    /// Local private key of a keypair: `provided.private_key_filepath` when
    /// a `provided` section exists, else the auto-generated target path
    pub fn private_key_path(&self, role: Role) -> Result<PathBuf> {
        let keypair = self.keypair(role);
        let (value, key) = match &keypair.provided {
            Some(provided) => (
                provided.private_key_filepath.as_deref(),
                format!("{}.provided.private_key_filepath", role.keypair_path()),
            ),
            None => (
                keypair
                    .auto_generated
                    .as_ref()
                    .and_then(|a| a.private_key_target_path.as_deref()),
                format!(
                    "{}.auto_generated.private_key_target_path",
                    role.keypair_path()
                ),
            ),
        };
        require_str(value, &key).map(expand_home)
    }

    pub fn security_group(&self, role: Role) -> &SecurityGroupConfig {
        match role {
            Role::Management => &self.networking.management_security_group,
            Role::Agents => &self.networking.agents_security_group,
        }
    }

    pub fn security_group_name(&self, role: Role) -> Result<&str> {
        require_str(
            self.security_group(role).name.as_deref(),
            &format!("{}.name", role.security_group_path()),
        )
    }
}

impl SecurityGroupConfig {
    /// Ports, protocol and CIDR of a group, or the first missing key
    pub fn rules(&self, role: Role) -> Result<(&[u16], &str, &str)> {
        let prefix = role.security_group_path();
        let ports = require(self.ports.as_deref(), &format!("{prefix}.ports"))?;
        let protocol = require_str(self.protocol.as_deref(), &format!("{prefix}.protocol"))?;
        let cidr = require_str(self.cidr.as_deref(), &format!("{prefix}.cidr"))?;
        Ok((ports, protocol, cidr))
    }
}
