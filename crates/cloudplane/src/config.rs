//! Project-local configuration
//!
//! Provider accounts live in `.cloudplane/providers.json`; desired-state
//! documents are caller-supplied YAML parsed into descriptors.

use anyhow::{bail, Context};
use cloudplane_cloud::{CloudProvider, ProviderConfig, ProviderStore};
use cloudplane_cloud_digitalocean::DigitalOceanProvider;
use cloudplane_cloud_postgres::PostgresProvider;
use cloudplane_core::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_DIR: &str = ".cloudplane";
const PROVIDERS_FILE: &str = "providers.json";

/// A parsed desired-state document.
#[derive(Debug, Serialize, Deserialize)]
pub struct DesiredState {
    pub resources: Vec<ResourceDescriptor>,
}

pub fn load_desired_state(path: &Path) -> anyhow::Result<DesiredState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// File-backed provider account configs.
pub struct ConfigStore {
    project_root: PathBuf,
}

impl ConfigStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn providers_path(&self) -> PathBuf {
        self.project_root.join(CONFIG_DIR).join(PROVIDERS_FILE)
    }

    pub fn load_providers(&self) -> anyhow::Result<Vec<ProviderConfig>> {
        let path = self.providers_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_providers(&self, configs: &[ProviderConfig]) -> anyhow::Result<()> {
        let path = self.providers_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(configs)?)?;
        Ok(())
    }

    pub fn upsert_provider(&self, config: ProviderConfig) -> anyhow::Result<()> {
        let mut configs = self.load_providers()?;
        if let Some(existing) = configs.iter_mut().find(|c| c.name == config.name) {
            *existing = config;
        } else {
            configs.push(config);
        }
        self.save_providers(&configs)
    }

    pub fn remove_provider(&self, name: &str) -> anyhow::Result<()> {
        let mut configs = self.load_providers()?;
        let before = configs.len();
        configs.retain(|c| c.name != name);
        if configs.len() == before {
            bail!("provider {name} is not registered");
        }
        self.save_providers(&configs)
    }
}

/// Construct the concrete provider for a config, validating credentials.
pub fn build_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn CloudProvider>> {
    match config.provider_type.as_str() {
        cloudplane_cloud_digitalocean::provider::PROVIDER_TYPE => {
            Ok(Arc::new(DigitalOceanProvider::from_config(config)?))
        }
        cloudplane_cloud_postgres::provider::PROVIDER_TYPE => {
            Ok(Arc::new(PostgresProvider::from_config(config)?))
        }
        other => bail!("unknown provider type: {other}"),
    }
}

/// Populate a fresh provider store from the saved configs.
pub fn build_store(project_root: &Path) -> anyhow::Result<Arc<ProviderStore>> {
    let store = Arc::new(ProviderStore::new());
    for config in ConfigStore::new(project_root).load_providers()? {
        let provider = build_provider(&config)
            .with_context(|| format!("configuring provider {}", config.name))?;
        store.insert(provider)?;
    }
    Ok(store)
}
