//! Teardown of a provisioned management server

use crate::compute::ComputeManager;
use crate::error::Result;
use crate::keypair::KeypairManager;
use crate::security_group::SecurityGroupManager;
use exoflow_config::TeardownConfig;
use tracing::{info, warn};

/// What to do when deleting one resource fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Propagate the first failure
    FailFast,
    /// Log a warning and continue
    BestEffort,
}

impl DeletionPolicy {
    /// Apply the policy to the outcome of one deletion
    pub(crate) fn settle(
        self,
        resource: &str,
        result: exoflow_cloud::Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => match self {
                DeletionPolicy::FailFast => Err(e.into()),
                DeletionPolicy::BestEffort => {
                    warn!("{} may not have been deleted: {}", resource, e);
                    Ok(())
                }
            },
        }
    }
}

/// Deletion policy per resource kind. Node deletion is always fail-fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownPolicy {
    pub keypairs: DeletionPolicy,
    pub security_groups: DeletionPolicy,
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        Self {
            keypairs: DeletionPolicy::FailFast,
            security_groups: DeletionPolicy::BestEffort,
        }
    }
}

impl TeardownPolicy {
    pub fn from_config(config: &TeardownConfig) -> Self {
        let mut policy = Self::default();
        if config.best_effort_keypairs {
            policy.keypairs = DeletionPolicy::BestEffort;
        }
        policy
    }
}

/// Reverses a provisioning run: node, then keypairs, then security groups
pub struct ResourceTerminator<'a> {
    security_groups: SecurityGroupManager<'a>,
    keypairs: KeypairManager<'a>,
    compute: ComputeManager<'a>,
    management_ip: String,
    policy: TeardownPolicy,
}

impl<'a> ResourceTerminator<'a> {
    pub fn new(
        security_groups: SecurityGroupManager<'a>,
        keypairs: KeypairManager<'a>,
        compute: ComputeManager<'a>,
        management_ip: impl Into<String>,
    ) -> Self {
        Self {
            security_groups,
            keypairs,
            compute,
            management_ip: management_ip.into(),
            policy: TeardownPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TeardownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TeardownPolicy {
        self.policy
    }

    pub async fn terminate_resources(&self) -> Result<()> {
        info!("Terminating management server {}", self.management_ip);
        self.compute.delete_node(&self.management_ip).await?;

        info!("Deleting agents and management keypairs");
        self.keypairs.delete_keypairs(self.policy.keypairs).await?;

        info!("Deleting agents and management security groups");
        self.security_groups
            .delete_security_groups(self.policy.security_groups)
            .await?;

        Ok(())
    }
}
