//! Provider context persistence
//!
//! The provider context is the only state carried from `provision` to
//! `teardown`. The hosting CLI keeps it in `.exoflow/context.json`.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const CONTEXT_VERSION: u32 = 1;
const CONTEXT_DIR: &str = ".exoflow";
const CONTEXT_FILE: &str = "context.json";
const CONTEXT_BACKUP: &str = "context.json.backup";

/// State handed back by `provision` and required by `teardown`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContext {
    /// Public address of the management machine
    pub ip: String,
}

impl ProviderContext {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

/// On-disk envelope around a [`ProviderContext`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContextFile {
    version: u32,
    updated_at: DateTime<Utc>,
    provider: String,
    context: ProviderContext,
}

/// Reads and writes the context file under a project root
pub struct ContextStore {
    project_root: PathBuf,
}

impl ContextStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn context_dir(&self) -> PathBuf {
        self.project_root.join(CONTEXT_DIR)
    }

    /// Path of the context file
    pub fn context_path(&self) -> PathBuf {
        self.context_dir().join(CONTEXT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.context_dir().join(CONTEXT_BACKUP)
    }

    pub fn exists(&self) -> bool {
        self.context_path().exists()
    }

    /// Load the stored context
    pub async fn load(&self) -> Result<ProviderContext> {
        let path = self.context_path();
        if !path.exists() {
            return Err(CloudError::StateError(format!(
                "no provider context at {}; run provision first",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path).await?;
        let file: ContextFile = serde_json::from_str(&content)?;

        if file.version > CONTEXT_VERSION {
            return Err(CloudError::StateError(format!(
                "Context file version {} is newer than supported version {}",
                file.version, CONTEXT_VERSION
            )));
        }

        tracing::debug!(ip = %file.context.ip, provider = %file.provider, "Loaded provider context");
        Ok(file.context)
    }

    /// Save the context, keeping the previous file as a backup
    pub async fn save(&self, provider: &str, context: &ProviderContext) -> Result<()> {
        let dir = self.context_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created context directory: {}", dir.display());
        }

        let path = self.context_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created context backup");
        }

        let file = ContextFile {
            version: CONTEXT_VERSION,
            updated_at: Utc::now(),
            provider: provider.to_string(),
            context: context.clone(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?).await?;

        tracing::debug!(ip = %context.ip, "Saved provider context");
        Ok(())
    }

    /// Remove the context file after a successful teardown
    pub async fn clear(&self) -> Result<()> {
        let path = self.context_path();
        if path.exists() {
            fs::remove_file(&path).await?;
            tracing::debug!("Removed provider context");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_context_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = ContextStore::new(temp_dir.path());

        store
            .save("exoscale", &ProviderContext::new("185.19.28.10"))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.ip, "185.19.28.10");
        assert!(store.exists());
    }

    #[tokio::test]
    async fn test_missing_context_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let store = ContextStore::new(temp_dir.path());

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CloudError::StateError(_)));
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let store = ContextStore::new(temp_dir.path());

        store.save("exoscale", &ProviderContext::new("1.1.1.1")).await.unwrap();
        store.save("exoscale", &ProviderContext::new("2.2.2.2")).await.unwrap();

        assert_eq!(store.load().await.unwrap().ip, "2.2.2.2");
        let backup = std::fs::read_to_string(temp_dir.path().join(".exoflow/context.json.backup"))
            .unwrap();
        assert!(backup.contains("1.1.1.1"));
    }

    #[tokio::test]
    async fn test_clear_removes_context() {
        let temp_dir = tempdir().unwrap();
        let store = ContextStore::new(temp_dir.path());

        store.save("exoscale", &ProviderContext::new("1.1.1.1")).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.exists());

        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = ContextStore::new(temp_dir.path());
        std::fs::create_dir_all(temp_dir.path().join(".exoflow")).unwrap();
        std::fs::write(
            store.context_path(),
            r#"{"version":99,"updated_at":"2024-01-01T00:00:00Z","provider":"exoscale","context":{"ip":"1.1.1.1"}}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load().await.unwrap_err(),
            CloudError::StateError(_)
        ));
    }
}
