use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use super::model::HostPaths;
use crate::errors::{OrchestratorError, Result};

/// Create the data and wallet directories and write the config file unless
/// one is already there. An existing config is never touched, so restarts
/// reuse whatever the operator left in place.
pub(crate) async fn prepare<F>(host: &HostPaths, render_config: F) -> Result<()>
where
    F: FnOnce() -> Result<String>,
{
    ensure_dir(&host.data_dir).await?;
    ensure_dir(&host.wallet_dir).await?;

    let exists = fs::try_exists(&host.config_path)
        .await
        .map_err(|e| OrchestratorError::io(host.config_path.display(), e))?;
    if exists {
        debug!("Keeping existing config at {}", host.config_path.display());
        return Ok(());
    }

    if let Some(parent) = host.config_path.parent() {
        ensure_dir(parent).await?;
    }
    let contents = render_config()?;
    fs::write(&host.config_path, contents)
        .await
        .map_err(|e| OrchestratorError::io(host.config_path.display(), e))?;
    info!("Wrote config to {}", host.config_path.display());
    Ok(())
}

async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| OrchestratorError::io(path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout(root: &Path) -> HostPaths {
        HostPaths {
            data_dir: root.join("data"),
            wallet_dir: root.join("keystore"),
            config_path: root.join("conf").join("config.toml"),
        }
    }

    #[tokio::test]
    async fn test_prepare_creates_directories_and_config() {
        let root = TempDir::new().unwrap();
        let host = layout(root.path());

        prepare(&host, || Ok("port = 1".to_string())).await.unwrap();

        assert!(host.data_dir.is_dir());
        assert!(host.wallet_dir.is_dir());
        assert_eq!(std::fs::read_to_string(&host.config_path).unwrap(), "port = 1");
    }

    #[tokio::test]
    async fn test_prepare_never_overwrites_config() {
        let root = TempDir::new().unwrap();
        let host = layout(root.path());
        std::fs::create_dir_all(host.config_path.parent().unwrap()).unwrap();
        std::fs::write(&host.config_path, b"\x00operator edited\xff").unwrap();

        prepare(&host, || panic!("config must not be rendered")).await.unwrap();

        assert_eq!(
            std::fs::read(&host.config_path).unwrap(),
            b"\x00operator edited\xff".to_vec()
        );
    }

    #[tokio::test]
    async fn test_prepare_propagates_render_errors() {
        let root = TempDir::new().unwrap();
        let host = layout(root.path());

        let result = prepare(&host, || {
            Err(OrchestratorError::Io {
                path: "template".to_string(),
                reason: "boom".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert!(!host.config_path.exists());
    }
}
