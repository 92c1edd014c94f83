//! Remote file transfer to the management server

use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use exoflow_config::{ProviderConfig, Role};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// SSH session settings for one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub connection_attempts: u32,
    pub connect_timeout: Duration,
    pub forward_agent: bool,
    pub strict_host_key_checking: bool,
    /// Never prompt for passwords or passphrases
    pub batch_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection_attempts: 12,
            connect_timeout: Duration::from_secs(5),
            forward_agent: true,
            strict_host_key_checking: false,
            batch_mode: true,
        }
    }
}

/// One file to upload into a remote directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub host: String,
    pub user: String,
    /// Private key used to authenticate the session
    pub identity_file: PathBuf,
    pub local_path: PathBuf,
    pub remote_dir: String,
}

#[async_trait]
pub trait FileTransfer: Send + Sync {
    async fn upload(&self, request: &UploadRequest, session: &SessionConfig) -> Result<()>;
}

/// Uploads with the system `scp`
#[derive(Debug, Clone)]
pub struct ScpTransfer {
    program: String,
}

impl Default for ScpTransfer {
    fn default() -> Self {
        Self {
            program: "scp".to_string(),
        }
    }
}

impl ScpTransfer {
    /// Use another scp-compatible binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(request: &UploadRequest, session: &SessionConfig) -> Vec<String> {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };

        let mut args = Vec::new();
        let mut option = |value: String| {
            args.push("-o".to_string());
            args.push(value);
        };
        option(format!("ConnectionAttempts={}", session.connection_attempts));
        option(format!("ConnectTimeout={}", session.connect_timeout.as_secs()));
        option(format!("ForwardAgent={}", yes_no(session.forward_agent)));
        option(format!(
            "StrictHostKeyChecking={}",
            yes_no(session.strict_host_key_checking)
        ));
        if !session.strict_host_key_checking {
            option("UserKnownHostsFile=/dev/null".to_string());
        }
        option(format!("BatchMode={}", yes_no(session.batch_mode)));

        args.push("-i".to_string());
        args.push(request.identity_file.display().to_string());
        args.push(request.local_path.display().to_string());
        args.push(format!(
            "{}@{}:{}/",
            request.user,
            request.host,
            request.remote_dir.trim_end_matches('/')
        ));
        args
    }
}

#[async_trait]
impl FileTransfer for ScpTransfer {
    async fn upload(&self, request: &UploadRequest, session: &SessionConfig) -> Result<()> {
        let args = Self::args(request, session);
        debug!("Running: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ProviderError::Transfer(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Transfer(format!(
                "{} to {} exited with {}: {}",
                self.program,
                request.host,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Places the agents' private key on the management server
pub struct CredentialDistributor<'a> {
    transfer: &'a dyn FileTransfer,
    config: &'a ProviderConfig,
    session: SessionConfig,
    agents_key_path: Option<PathBuf>,
}

impl<'a> CredentialDistributor<'a> {
    pub fn new(
        transfer: &'a dyn FileTransfer,
        config: &'a ProviderConfig,
        session: SessionConfig,
    ) -> Self {
        Self {
            transfer,
            config,
            session,
            agents_key_path: None,
        }
    }

    /// Upload this file instead of the configured agents private key
    pub fn with_agents_key_path(mut self, path: Option<PathBuf>) -> Self {
        self.agents_key_path = path;
        self
    }

    fn agents_key_path(&self) -> Result<PathBuf> {
        match &self.agents_key_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.config.private_key_path(Role::Agents)?),
        }
    }

    /// Upload the agents' private key into `<userhome_on_management>/.ssh`,
    /// authenticating as `ssh_user` with `private_key_path`
    pub async fn copy_agents_key_to_manager(
        &self,
        host_ip: &str,
        private_key_path: &Path,
        ssh_user: &str,
    ) -> Result<()> {
        let userhome = self.config.userhome_on_management()?;
        let local_path = self.agents_key_path()?;
        let request = UploadRequest {
            host: host_ip.to_string(),
            user: ssh_user.to_string(),
            identity_file: private_key_path.to_path_buf(),
            local_path,
            remote_dir: format!("{}/.ssh", userhome.trim_end_matches('/')),
        };

        info!(
            "Uploading agents private key {} to manager",
            request.local_path.display()
        );
        self.transfer.upload(&request, &self.session).await
    }
}
