//! Management server provisioning for exoflow
//!
//! Sequences the cloud resources a management server needs and reverses
//! them on teardown:
//!
//! ```text
//! provision:  Connector -> security groups -> keypairs -> node -> upload agents key
//! teardown:   Connector -> node (by IP) -> keypairs -> security groups
//! ```
//!
//! Every provider call is awaited in turn. The only state carried from
//! provision to teardown is the [`exoflow_cloud::ProviderContext`].

pub mod compute;
pub mod connector;
pub mod error;
pub mod keypair;
pub mod manager;
pub mod security_group;
pub mod terminator;
pub mod transfer;

pub use compute::ComputeManager;
pub use connector::{Connector, ExoscaleConnector, ensure_authenticated};
pub use error::{ProviderError, Result};
pub use keypair::{KeypairManager, KeypairOverride, KeypairOverrides, KeypairSource};
pub use manager::{ProviderManager, ProvisionOutput, ValidationErrors};
pub use security_group::SecurityGroupManager;
pub use terminator::{DeletionPolicy, ResourceTerminator, TeardownPolicy};
pub use transfer::{
    CredentialDistributor, FileTransfer, ScpTransfer, SessionConfig, UploadRequest,
};
