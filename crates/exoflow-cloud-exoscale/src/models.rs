//! Exoscale compute API response payloads

use exoflow_cloud::{Image, IngressRule, KeyPair, Node, NodeState, SecurityGroup, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyPair {
    pub name: String,
    pub fingerprint: Option<String>,
    pub privatekey: Option<String>,
}

impl From<ApiKeyPair> for KeyPair {
    fn from(kp: ApiKeyPair) -> Self {
        Self {
            name: kp.name,
            fingerprint: kp.fingerprint,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListKeyPairsResponse {
    #[serde(default)]
    pub sshkeypair: Vec<ApiKeyPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyPairResponse {
    pub keypair: ApiKeyPair,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSecurityGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub ingressrule: Vec<ApiIngressRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiIngressRule {
    pub protocol: Option<String>,
    pub startport: Option<u16>,
    pub endport: Option<u16>,
    pub cidr: Option<String>,
}

impl From<ApiSecurityGroup> for SecurityGroup {
    fn from(sg: ApiSecurityGroup) -> Self {
        Self {
            id: sg.id,
            name: sg.name,
            description: sg.description,
            ingress_rules: sg
                .ingressrule
                .into_iter()
                .map(|rule| IngressRule {
                    protocol: rule.protocol.unwrap_or_default(),
                    start_port: rule.startport,
                    end_port: rule.endport,
                    cidr: rule.cidr,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSecurityGroupsResponse {
    #[serde(default)]
    pub securitygroup: Vec<ApiSecurityGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroupResponse {
    pub securitygroup: ApiSecurityGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTemplate {
    pub id: String,
    pub name: String,
}

impl From<ApiTemplate> for Image {
    fn from(t: ApiTemplate) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTemplatesResponse {
    #[serde(default)]
    pub template: Vec<ApiTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiServiceOffering {
    pub id: String,
    pub name: String,
    pub cpunumber: Option<u32>,
    /// Memory in MB
    pub memory: Option<u64>,
}

impl From<ApiServiceOffering> for Size {
    fn from(o: ApiServiceOffering) -> Self {
        Self {
            id: o.id,
            name: o.name,
            cpu: o.cpunumber,
            memory_mb: o.memory,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListServiceOfferingsResponse {
    #[serde(default)]
    pub serviceoffering: Vec<ApiServiceOffering>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiZone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListZonesResponse {
    #[serde(default)]
    pub zone: Vec<ApiZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiVirtualMachine {
    pub id: String,
    pub name: String,
    pub displayname: Option<String>,
    pub state: Option<String>,
    pub publicip: Option<String>,
    #[serde(default)]
    pub nic: Vec<ApiNic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiNic {
    pub ipaddress: Option<String>,
    #[serde(default)]
    pub isdefault: bool,
}

impl ApiVirtualMachine {
    /// Public addresses, default NIC first. In a basic zone every NIC
    /// address is public.
    pub fn public_ips(&self) -> Vec<String> {
        let mut nics: Vec<&ApiNic> = self.nic.iter().collect();
        nics.sort_by_key(|nic| !nic.isdefault);

        let mut ips: Vec<String> = Vec::new();
        let candidates = self
            .publicip
            .iter()
            .chain(nics.iter().filter_map(|nic| nic.ipaddress.as_ref()));
        for ip in candidates {
            if !ips.contains(ip) {
                ips.push(ip.clone());
            }
        }
        ips
    }
}

impl From<ApiVirtualMachine> for Node {
    fn from(vm: ApiVirtualMachine) -> Self {
        let public_ips = vm.public_ips();
        Self {
            id: vm.id,
            name: vm.name,
            state: vm
                .state
                .as_deref()
                .map(NodeState::from_provider)
                .unwrap_or(NodeState::Unknown),
            public_ips,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVirtualMachinesResponse {
    #[serde(default)]
    pub virtualmachine: Vec<ApiVirtualMachine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualMachineResult {
    pub virtualmachine: ApiVirtualMachine,
}

/// Response of any asynchronous command
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncJobResponse {
    pub jobid: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsyncJobStatus {
    /// 0 pending, 1 succeeded, 2 failed
    pub jobstatus: i32,
    pub jobresult: Option<serde_json::Value>,
}

pub const JOB_PENDING: i32 = 0;
pub const JOB_SUCCEEDED: i32 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    pub errorcode: Option<u16>,
    pub errortext: Option<String>,
}
