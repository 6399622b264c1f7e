//! Runtime configuration for the artifact server.

use anyhow::{Result, bail};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::ServeArgs;
use crate::io::{HttpObjectStore, LocalDirStore, ObjectStore};

/// Where stored objects come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    LocalDir(PathBuf),
    Http(String),
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    /// Extension without the leading dot, e.g. `tar.gz`
    pub default_extension: String,
}

impl ServerConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let store = match (&args.store_dir, &args.store_url) {
            (Some(dir), None) => StoreConfig::LocalDir(dir.clone()),
            (None, Some(url)) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    bail!("Store URL must be http:// or https://: {url}");
                }
                StoreConfig::Http(url.clone())
            }
            (Some(_), Some(_)) => bail!("Use either --store-dir or --store-url, not both"),
            (None, None) => bail!("No object store configured (set --store-dir or --store-url)"),
        };

        Ok(Self {
            bind: args.bind,
            store,
            default_extension: args.default_extension.trim_start_matches('.').to_string(),
        })
    }

    /// Construct the configured object store
    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>> {
        let store: Arc<dyn ObjectStore> = match &self.store {
            StoreConfig::LocalDir(dir) => {
                if !dir.is_dir() {
                    bail!("Store directory does not exist: {}", dir.display());
                }
                Arc::new(LocalDirStore::new(dir.clone()))
            }
            StoreConfig::Http(url) => Arc::new(HttpObjectStore::new(url.clone())?),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            bind: "127.0.0.1:8080".parse().unwrap(),
            store_dir: None,
            store_url: None,
            default_extension: ".tar.gz".to_string(),
        }
    }

    #[test]
    fn test_local_dir_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::from_args(&ServeArgs {
            store_dir: Some(dir.path().to_path_buf()),
            ..args()
        })
        .unwrap();

        assert_eq!(config.store, StoreConfig::LocalDir(dir.path().to_path_buf()));
        assert_eq!(config.default_extension, "tar.gz");
        assert!(config.build_store().is_ok());
    }

    #[test]
    fn test_requires_a_store() {
        assert!(ServerConfig::from_args(&args()).is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let res = ServerConfig::from_args(&ServeArgs {
            store_url: Some("ftp://objects".to_string()),
            ..args()
        });
        assert!(res.is_err());
    }
}
