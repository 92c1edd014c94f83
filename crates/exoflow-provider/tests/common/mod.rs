#![allow(dead_code)]

use async_trait::async_trait;
use exoflow_cloud::{
    AuthStatus, CloudDriver, CloudError, CreateNodeRequest, CreatedKeyPair, Image,
    IngressRequest, IngressRule, KeyPair, Node, NodeState, SecurityGroup, Size,
};
use exoflow_config::ProviderConfig;
use exoflow_provider::{
    Connector, FileTransfer, ProviderError, SessionConfig, UploadRequest, ensure_authenticated,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const NODE_IP: &str = "185.19.28.10";

#[derive(Default)]
struct FakeState {
    keypairs: Vec<KeyPair>,
    security_groups: Vec<SecurityGroup>,
    images: Vec<Image>,
    sizes: Vec<Size>,
    nodes: Vec<Node>,
    calls: Vec<String>,
    failing_deletes: HashSet<String>,
    reject_nodes: bool,
    authenticated: bool,
    next_node_ips: Vec<String>,
}

/// In-memory cloud recording every mutating call
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    /// Catalog with image `img-1` and size `small`; new nodes get [`NODE_IP`]
    pub fn new() -> Self {
        let state = FakeState {
            images: vec![Image {
                id: "img-1".to_string(),
                name: "Ubuntu 22.04".to_string(),
            }],
            sizes: vec![Size {
                id: "so-small".to_string(),
                name: "small".to_string(),
                cpu: Some(1),
                memory_mb: Some(2048),
            }],
            authenticated: true,
            next_node_ips: vec![NODE_IP.to_string()],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_keypair(self, name: &str) -> Self {
        self.state.lock().unwrap().keypairs.push(KeyPair {
            name: name.to_string(),
            fingerprint: None,
        });
        self
    }

    pub fn with_security_group(self, name: &str) -> Self {
        self.state.lock().unwrap().security_groups.push(SecurityGroup {
            id: format!("sg-{}", name),
            name: name.to_string(),
            description: None,
            ingress_rules: Vec::new(),
        });
        self
    }

    pub fn with_node(self, id: &str, state: NodeState, ip: &str) -> Self {
        self.state.lock().unwrap().nodes.push(Node {
            id: id.to_string(),
            name: id.to_string(),
            state,
            public_ips: vec![ip.to_string()],
        });
        self
    }

    /// Deleting the keypair or group with this name fails
    pub fn failing_delete(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(name.to_string());
        self
    }

    pub fn rejecting_nodes(self) -> Self {
        self.state.lock().unwrap().reject_nodes = true;
        self
    }

    pub fn without_public_ips(self) -> Self {
        self.state.lock().unwrap().next_node_ips.clear();
        self
    }

    pub fn unauthenticated(self) -> Self {
        self.state.lock().unwrap().authenticated = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded calls starting with `prefix`
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn security_group(&self, name: &str) -> Option<SecurityGroup> {
        self.state
            .lock()
            .unwrap()
            .security_groups
            .iter()
            .find(|sg| sg.name == name)
            .cloned()
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.state.lock().unwrap().nodes.clone()
    }

    pub fn has_keypair(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .keypairs
            .iter()
            .any(|kp| kp.name == name)
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn delete_result(&self, name: &str) -> exoflow_cloud::Result<()> {
        if self.state.lock().unwrap().failing_deletes.contains(name) {
            Err(CloudError::ApiError(format!("{} is still in use", name)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CloudDriver for FakeDriver {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check_auth(&self) -> exoflow_cloud::Result<AuthStatus> {
        if self.state.lock().unwrap().authenticated {
            Ok(AuthStatus::ok("fake-account"))
        } else {
            Ok(AuthStatus::failed("invalid signature"))
        }
    }

    async fn list_key_pairs(&self) -> exoflow_cloud::Result<Vec<KeyPair>> {
        Ok(self.state.lock().unwrap().keypairs.clone())
    }

    async fn create_key_pair(&self, name: &str) -> exoflow_cloud::Result<CreatedKeyPair> {
        self.record(format!("create_key_pair:{}", name));
        self.state.lock().unwrap().keypairs.push(KeyPair {
            name: name.to_string(),
            fingerprint: Some("aa:bb".to_string()),
        });
        Ok(CreatedKeyPair {
            name: name.to_string(),
            fingerprint: Some("aa:bb".to_string()),
            private_key: format!("PRIVATE KEY {}", name),
        })
    }

    async fn import_key_pair(&self, name: &str, public_key: &str) -> exoflow_cloud::Result<KeyPair> {
        self.record(format!("import_key_pair:{}:{}", name, public_key.trim()));
        let keypair = KeyPair {
            name: name.to_string(),
            fingerprint: None,
        };
        self.state.lock().unwrap().keypairs.push(keypair.clone());
        Ok(keypair)
    }

    async fn delete_key_pair(&self, name: &str) -> exoflow_cloud::Result<()> {
        self.record(format!("delete_key_pair:{}", name));
        self.delete_result(name)?;
        self.state.lock().unwrap().keypairs.retain(|kp| kp.name != name);
        Ok(())
    }

    async fn list_security_groups(&self) -> exoflow_cloud::Result<Vec<SecurityGroup>> {
        Ok(self.state.lock().unwrap().security_groups.clone())
    }

    async fn create_security_group(&self, name: &str) -> exoflow_cloud::Result<SecurityGroup> {
        self.record(format!("create_security_group:{}", name));
        let group = SecurityGroup {
            id: format!("sg-{}", name),
            name: name.to_string(),
            description: None,
            ingress_rules: Vec::new(),
        };
        self.state.lock().unwrap().security_groups.push(group.clone());
        Ok(group)
    }

    async fn delete_security_group(&self, name: &str) -> exoflow_cloud::Result<()> {
        self.record(format!("delete_security_group:{}", name));
        self.delete_result(name)?;
        self.state
            .lock()
            .unwrap()
            .security_groups
            .retain(|sg| sg.name != name);
        Ok(())
    }

    async fn authorize_security_group_ingress(
        &self,
        request: &IngressRequest,
    ) -> exoflow_cloud::Result<()> {
        self.record(format!(
            "authorize:{}:{}:{}-{}:{}",
            request.security_group_name,
            request.protocol,
            request.start_port,
            request.effective_end_port(),
            request.cidr_list
        ));
        let mut state = self.state.lock().unwrap();
        let group = state
            .security_groups
            .iter_mut()
            .find(|sg| sg.name == request.security_group_name)
            .ok_or_else(|| CloudError::ResourceNotFound(request.security_group_name.clone()))?;
        group.ingress_rules.push(IngressRule {
            protocol: request.protocol.clone(),
            start_port: Some(request.start_port),
            end_port: Some(request.effective_end_port()),
            cidr: Some(request.cidr_list.clone()),
        });
        Ok(())
    }

    async fn list_images(&self) -> exoflow_cloud::Result<Vec<Image>> {
        Ok(self.state.lock().unwrap().images.clone())
    }

    async fn list_sizes(&self) -> exoflow_cloud::Result<Vec<Size>> {
        Ok(self.state.lock().unwrap().sizes.clone())
    }

    async fn list_nodes(&self) -> exoflow_cloud::Result<Vec<Node>> {
        Ok(self.state.lock().unwrap().nodes.clone())
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> exoflow_cloud::Result<Node> {
        self.record(format!(
            "create_node:{}:{}:{}:{}:{}",
            request.name,
            request.image.id,
            request.size.name,
            request.keypair_name,
            request.security_group_names.join(",")
        ));
        let mut state = self.state.lock().unwrap();
        if state.reject_nodes {
            return Err(CloudError::ApiError("Insufficient capacity".to_string()));
        }
        let node = Node {
            id: format!("vm-{}", state.nodes.len() + 1),
            name: request.name.clone(),
            state: NodeState::Running,
            public_ips: state.next_node_ips.clone(),
        };
        state.nodes.push(node.clone());
        Ok(node)
    }

    async fn destroy_node(&self, node: &Node) -> exoflow_cloud::Result<()> {
        self.record(format!("destroy_node:{}", node.id));
        let mut state = self.state.lock().unwrap();
        for existing in state.nodes.iter_mut().filter(|n| n.id == node.id) {
            existing.state = NodeState::Destroyed;
        }
        Ok(())
    }
}

/// Hands out a shared [`FakeDriver`] after the usual authentication check
pub struct FakeConnector {
    pub driver: Arc<FakeDriver>,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _config: &ProviderConfig,
    ) -> Result<Arc<dyn CloudDriver>, ProviderError> {
        ensure_authenticated(self.driver.clone()).await
    }
}

/// Records uploads instead of running scp
#[derive(Default)]
pub struct FakeTransfer {
    uploads: Mutex<Vec<(UploadRequest, SessionConfig)>>,
    pub fail: bool,
}

impl FakeTransfer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<(UploadRequest, SessionConfig)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileTransfer for FakeTransfer {
    async fn upload(
        &self,
        request: &UploadRequest,
        session: &SessionConfig,
    ) -> Result<(), ProviderError> {
        self.uploads
            .lock()
            .unwrap()
            .push((request.clone(), session.clone()));
        if self.fail {
            return Err(ProviderError::Transfer("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Temporary home for generated keys
pub struct TestKeys {
    pub dir: TempDir,
}

impl TestKeys {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub fn write(&self, file: &str, content: &str) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, content).unwrap();
        path
    }
}

/// Config with image `img-1`, size `small`, keypairs `mgmt-kp` / `agents-kp`
/// and groups `mgmt-sg` (port 22) / `agents-sg` (port 22)
pub fn test_config(keys_dir: &Path) -> ProviderConfig {
    let yaml = format!(
        r#"
authentication:
  api_key: EXOkey
  api_secret_key: secret
compute:
  management_server:
    user_on_management: ubuntu
    userhome_on_management: /home/ubuntu
    instance:
      name: exoflow-management-server
      image: img-1
      size: small
    management_keypair:
      name: mgmt-kp
      auto_generated:
        private_key_target_path: {dir}/mgmt-kp.pem
  agent_servers:
    agents_keypair:
      name: agents-kp
      auto_generated:
        private_key_target_path: {dir}/agents-kp.pem
networking:
  management_security_group:
    name: mgmt-sg
    ports: [22]
    cidr: 0.0.0.0/0
    protocol: TCP
  agents_security_group:
    name: agents-sg
    ports: [22]
    cidr: 0.0.0.0/0
    protocol: TCP
"#,
        dir = keys_dir.display()
    );
    exoflow_config::parse_config(&yaml).unwrap()
}
