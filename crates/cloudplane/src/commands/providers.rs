use crate::config::{build_provider, ConfigStore};
use anyhow::Context;
use cloudplane_cloud::ProviderConfig;
use std::path::Path;

pub async fn add(
    project: &Path,
    name: &str,
    provider_type: &str,
    credentials_path: &Path,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(credentials_path)
        .with_context(|| format!("reading {}", credentials_path.display()))?;
    let credentials: serde_json::Value = serde_json::from_str(&raw)?;

    let config = ProviderConfig {
        provider_type: provider_type.to_string(),
        name: name.to_string(),
        credentials,
    };

    // Validate the credential shape, then prove the account works before
    // persisting anything.
    let provider = build_provider(&config)?;
    if !provider.test_credentials().await? {
        anyhow::bail!("credential check failed for {name}; config not saved");
    }

    ConfigStore::new(project).upsert_provider(config)?;
    println!("Registered provider {name} ({provider_type})");
    Ok(())
}

pub fn list(project: &Path) -> anyhow::Result<()> {
    let configs = ConfigStore::new(project).load_providers()?;
    if configs.is_empty() {
        println!("No providers registered.");
        return Ok(());
    }
    for config in configs {
        println!("{} ({})", config.name, config.provider_type);
    }
    Ok(())
}

pub fn remove(project: &Path, name: &str) -> anyhow::Result<()> {
    ConfigStore::new(project).remove_provider(name)?;
    println!("Removed provider {name}");
    Ok(())
}

pub async fn test(project: &Path, name: &str) -> anyhow::Result<()> {
    let configs = ConfigStore::new(project).load_providers()?;
    let config = configs
        .into_iter()
        .find(|c| c.name == name)
        .with_context(|| format!("provider {name} is not registered"))?;

    let provider = build_provider(&config)?;
    if provider.test_credentials().await? {
        println!("{name}: credentials OK");
        Ok(())
    } else {
        eprintln!("{name}: credential check failed");
        std::process::exit(1);
    }
}
