//! Cloud driver trait definition

use crate::error::Result;
use crate::types::{
    CreateNodeRequest, CreatedKeyPair, Image, IngressRequest, KeyPair, Node, SecurityGroup, Size,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Compute provider capability trait
///
/// Lists exactly the operations the provisioning core performs. Every
/// resource is addressed by its human-chosen name except nodes, which are
/// located through [`CloudDriver::list_nodes`].
#[async_trait]
pub trait CloudDriver: Send + Sync {
    /// Returns the driver name (e.g., "exoscale")
    fn name(&self) -> &str;

    /// Check that the configured credentials are accepted by the provider
    async fn check_auth(&self) -> Result<AuthStatus>;

    async fn list_key_pairs(&self) -> Result<Vec<KeyPair>>;

    /// Create a keypair on the provider; the private key is only ever
    /// returned by this call
    async fn create_key_pair(&self, name: &str) -> Result<CreatedKeyPair>;

    /// Register an existing public key (OpenSSH format) under `name`
    async fn import_key_pair(&self, name: &str, public_key: &str) -> Result<KeyPair>;

    async fn delete_key_pair(&self, name: &str) -> Result<()>;

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>>;

    async fn create_security_group(&self, name: &str) -> Result<SecurityGroup>;

    async fn delete_security_group(&self, name: &str) -> Result<()>;

    async fn authorize_security_group_ingress(&self, request: &IngressRequest) -> Result<()>;

    async fn list_images(&self) -> Result<Vec<Image>>;

    async fn list_sizes(&self) -> Result<Vec<Size>>;

    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Launch a node and return it once the provider reports it created
    async fn create_node(&self, request: &CreateNodeRequest) -> Result<Node>;

    async fn destroy_node(&self, node: &Node) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
