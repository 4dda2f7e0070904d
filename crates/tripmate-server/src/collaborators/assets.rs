//! Content-addressed image storage on the local filesystem.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::debug;
use tripmate_core::collaborator::AssetStore;
use tripmate_core::error::{TripmateError, TripmateResult};

#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Directory uploaded files are written to.
    pub dir: PathBuf,
    /// Public URL prefix under which `dir` is served.
    pub public_base_url: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/assets"),
            public_base_url: "http://localhost:8080/assets".into(),
        }
    }
}

/// Writes each upload under the SHA-256 of its content, so identical
/// images share one file.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    config: AssetConfig,
}

impl LocalAssetStore {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.config.dir
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        _ => "bin",
    }
}

impl AssetStore for LocalAssetStore {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> TripmateResult<String> {
        let digest = hex::encode(Sha256::digest(&bytes));
        let name = format!("{digest}.{}", extension_for(content_type));
        let path = self.config.dir.join(&name);

        tokio::fs::create_dir_all(&self.config.dir).await.map_err(|e| {
            TripmateError::AssetStorage(format!("create {}: {e}", self.config.dir.display()))
        })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TripmateError::AssetStorage(format!("write {}: {e}", path.display())))?;

        debug!(path = %path.display(), size = bytes.len(), "Asset stored");
        Ok(format!(
            "{}/{name}",
            self.config.public_base_url.trim_end_matches('/')
        ))
    }
}
