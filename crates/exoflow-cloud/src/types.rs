//! Provider resource types shared by all drivers

use serde::{Deserialize, Serialize};

/// SSH keypair registered on the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub name: String,
    pub fingerprint: Option<String>,
}

/// Keypair generated by the provider, carrying its private key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedKeyPair {
    pub name: String,
    pub fingerprint: Option<String>,

    /// PEM-encoded private key
    pub private_key: String,
}

/// Security group and its ingress rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ingress_rules: Vec<IngressRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub protocol: String,
    pub start_port: Option<u16>,
    pub end_port: Option<u16>,
    pub cidr: Option<String>,
}

/// Request to open a port range on a security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRequest {
    pub security_group_name: String,
    pub protocol: String,
    pub start_port: u16,

    /// Defaults to `start_port` when absent
    pub end_port: Option<u16>,
    pub cidr_list: String,
}

impl IngressRequest {
    /// Rule for a single port
    pub fn single_port(
        security_group_name: impl Into<String>,
        protocol: impl Into<String>,
        port: u16,
        cidr_list: impl Into<String>,
    ) -> Self {
        Self {
            security_group_name: security_group_name.into(),
            protocol: protocol.into(),
            start_port: port,
            end_port: None,
            cidr_list: cidr_list.into(),
        }
    }

    pub fn effective_end_port(&self) -> u16 {
        self.end_port.unwrap_or(self.start_port)
    }
}

/// Machine image (template) in the provider catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
}

/// Instance size (service offering) in the provider catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub id: String,
    pub name: String,
    pub cpu: Option<u32>,
    pub memory_mb: Option<u64>,
}

/// Compute node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub state: NodeState,
    pub public_ips: Vec<String>,
}

impl Node {
    /// First public address, the one reachable over SSH
    pub fn public_ip(&self) -> Option<&str> {
        self.public_ips.first().map(String::as_str)
    }

    pub fn has_public_ip(&self, ip: &str) -> bool {
        self.public_ips.iter().any(|candidate| candidate == ip)
    }

    /// Whether the node still exists from the provider's point of view
    pub fn is_live(&self) -> bool {
        !matches!(self.state, NodeState::Destroyed | NodeState::Expunging)
    }
}

/// Status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Destroyed,
    Expunging,
    Error,
    Unknown,
}

impl NodeState {
    /// Parse a CloudStack virtual machine state string
    pub fn from_provider(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "starting" | "creating" | "migrating" => NodeState::Starting,
            "running" => NodeState::Running,
            "stopping" => NodeState::Stopping,
            "stopped" => NodeState::Stopped,
            "destroyed" => NodeState::Destroyed,
            "expunging" => NodeState::Expunging,
            "error" => NodeState::Error,
            _ => NodeState::Unknown,
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Starting => write!(f, "starting"),
            NodeState::Running => write!(f, "running"),
            NodeState::Stopping => write!(f, "stopping"),
            NodeState::Stopped => write!(f, "stopped"),
            NodeState::Destroyed => write!(f, "destroyed"),
            NodeState::Expunging => write!(f, "expunging"),
            NodeState::Error => write!(f, "error"),
            NodeState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Request to launch a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
    pub image: Image,
    pub size: Size,
    pub keypair_name: String,
    pub security_group_names: Vec<String>,
}
