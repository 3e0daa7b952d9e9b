use crate::application::estimators::{ModelArtifacts, ModelStore};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

const LATEST_POINTER: &str = "latest";

/// Versioned model persistence on the local filesystem.
///
/// Each training run is saved as `model_<version>.json`; a `latest`
/// pointer file names the current one. Writes go through a temp file
/// plus rename so a crash mid-save never corrupts the serving artifacts,
/// and older versions stay on disk for manual rollback.
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create model directory")?;
        }
        Ok(Self { dir })
    }

    fn write_atomic(&self, name: &str, content: &str) -> Result<()> {
        let path = self.dir.join(name);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp model file")?;
        fs::rename(&temp_path, &path).context("Failed to rename model file")?;
        Ok(())
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<ModelArtifacts>> {
        let pointer = self.dir.join(LATEST_POINTER);
        if !pointer.exists() {
            return Ok(None);
        }

        let name = fs::read_to_string(&pointer).context("Failed to read latest pointer")?;
        let path = self.dir.join(name.trim());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model file {:?}", path))?;
        let artifacts: ModelArtifacts =
            serde_json::from_str(&content).context("Failed to parse model JSON")?;

        info!(version = artifacts.version, "Loaded model artifacts from {:?}", path);
        Ok(Some(artifacts))
    }

    fn save(&self, artifacts: &ModelArtifacts) -> Result<()> {
        let content =
            serde_json::to_string(artifacts).context("Failed to serialize model artifacts")?;

        let name = format!("model_{}.json", artifacts.version);
        self.write_atomic(&name, &content)?;
        self.write_atomic(LATEST_POINTER, &name)?;

        info!(version = artifacts.version, "Saved model artifacts to {:?}", self.dir.join(&name));
        Ok(())
    }
}
