//! Synthesis scope
//!
//! A [`Stack`] is the scope one apply run synthesizes into. Resource modules
//! add provider blocks, resources, data sources, and outputs; the stack owns
//! every construct in an arena keyed by string address, then emits the whole
//! tree as Terraform JSON syntax.

use crate::error::{Result, TerraformError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Address of a construct inside a stack, e.g.
/// `digitalocean_database_cluster.database`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstructAddress(String);

impl ConstructAddress {
    pub fn new(tf_type: &str, name: &str) -> Self {
        Self(format!("{tf_type}.{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The Terraform resource type half of the address.
    pub fn tf_type(&self) -> &str {
        self.0.split_once('.').map(|(t, _)| t).unwrap_or(&self.0)
    }

    /// Interpolation expression for an attribute of this construct,
    /// e.g. `${digitalocean_database_cluster.database.host}`.
    pub fn attr(&self, attribute: &str) -> String {
        format!("${{{}.{attribute}}}", self.0)
    }

    /// Interpolation expression for an attribute of this construct when the
    /// construct is a data source (`${data.<type>.<name>.<attr>}`).
    pub fn data_attr(&self, attribute: &str) -> String {
        format!("${{data.{}.{attribute}}}", self.0)
    }
}

impl std::fmt::Display for ConstructAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Terraform provider block plus its `required_providers` source entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderBlock {
    /// Local provider name (`digitalocean`, `postgresql`, ...)
    pub vendor: String,

    /// Registry source (`digitalocean/digitalocean`)
    pub source: String,

    /// Version constraint
    pub version: String,

    /// Provider configuration (endpoint, credentials, safety flags)
    pub properties: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
struct Construct {
    properties: BTreeMap<String, serde_json::Value>,
    data_source: bool,
}

/// The synthesis scope for one apply run.
#[derive(Debug, Default)]
pub struct Stack {
    providers: Vec<ProviderBlock>,
    registered: HashSet<String>,
    constructs: BTreeMap<ConstructAddress, Construct>,
    outputs: BTreeMap<String, serde_json::Value>,
    sensitive_outputs: HashSet<String>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider block.
    ///
    /// Idempotent per vendor: calling this twice for the same vendor keeps
    /// the first registration, so many modules of the same provider can
    /// share one scope.
    pub fn register_provider(&mut self, block: ProviderBlock) {
        if !self.registered.insert(block.vendor.clone()) {
            tracing::debug!("Provider {} already registered in scope", block.vendor);
            return;
        }
        self.providers.push(block);
    }

    pub fn has_provider(&self, vendor: &str) -> bool {
        self.registered.contains(vendor)
    }

    /// Add a managed resource; fails on address collision.
    pub fn add_resource(
        &mut self,
        tf_type: &str,
        name: &str,
        properties: BTreeMap<String, serde_json::Value>,
    ) -> Result<ConstructAddress> {
        self.add_construct(tf_type, name, properties, false)
    }

    /// Add a data source; fails on address collision.
    pub fn add_data_source(
        &mut self,
        tf_type: &str,
        name: &str,
        properties: BTreeMap<String, serde_json::Value>,
    ) -> Result<ConstructAddress> {
        self.add_construct(tf_type, name, properties, true)
    }

    fn add_construct(
        &mut self,
        tf_type: &str,
        name: &str,
        properties: BTreeMap<String, serde_json::Value>,
        data_source: bool,
    ) -> Result<ConstructAddress> {
        let address = ConstructAddress::new(tf_type, name);
        if self.constructs.contains_key(&address) {
            return Err(TerraformError::AddressCollision(address.to_string()));
        }
        self.constructs.insert(
            address.clone(),
            Construct {
                properties,
                data_source,
            },
        );
        Ok(address)
    }

    /// Declare a root output.
    pub fn add_output(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.outputs.insert(key.into(), value);
    }

    /// Declare a root output whose value must not appear in plan text.
    pub fn add_sensitive_output(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        self.sensitive_outputs.insert(key.clone());
        self.outputs.insert(key, value);
    }

    /// Look up a construct's properties by address.
    pub fn construct(&self, address: &ConstructAddress) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.constructs.get(address).map(|c| &c.properties)
    }

    /// Addresses of all managed (non-data) resources, sorted.
    pub fn resource_addresses(&self) -> Vec<&ConstructAddress> {
        self.constructs
            .iter()
            .filter(|(_, c)| !c.data_source)
            .map(|(a, _)| a)
            .collect()
    }

    /// Emit the whole scope as Terraform JSON syntax.
    ///
    /// BTreeMap ordering makes the emission deterministic for a fixed set of
    /// constructs.
    pub fn synthesize(&self) -> serde_json::Value {
        let mut required: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        let mut provider_blocks: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        for block in &self.providers {
            required.insert(
                block.vendor.clone(),
                serde_json::json!({
                    "source": block.source,
                    "version": block.version,
                }),
            );
            provider_blocks.insert(
                block.vendor.clone(),
                serde_json::to_value(&block.properties).unwrap_or_default(),
            );
        }

        // resource/data maps are keyed type -> name -> properties
        let mut resources: BTreeMap<String, BTreeMap<String, serde_json::Value>> = BTreeMap::new();
        let mut data_sources: BTreeMap<String, BTreeMap<String, serde_json::Value>> = BTreeMap::new();
        for (address, construct) in &self.constructs {
            let (tf_type, name) = address
                .as_str()
                .split_once('.')
                .expect("construct addresses always contain a dot");
            let target = if construct.data_source {
                &mut data_sources
            } else {
                &mut resources
            };
            target.entry(tf_type.to_string()).or_default().insert(
                name.to_string(),
                serde_json::to_value(&construct.properties).unwrap_or_default(),
            );
        }

        let mut outputs: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        for (key, value) in &self.outputs {
            let mut body = serde_json::Map::new();
            body.insert("value".to_string(), value.clone());
            if self.sensitive_outputs.contains(key) {
                body.insert("sensitive".to_string(), serde_json::Value::Bool(true));
            }
            outputs.insert(key.clone(), serde_json::Value::Object(body));
        }

        let mut root = serde_json::Map::new();
        root.insert(
            "terraform".to_string(),
            serde_json::json!({ "required_providers": required }),
        );
        if !provider_blocks.is_empty() {
            root.insert(
                "provider".to_string(),
                serde_json::to_value(&provider_blocks).unwrap_or_default(),
            );
        }
        if !resources.is_empty() {
            root.insert(
                "resource".to_string(),
                serde_json::to_value(&resources).unwrap_or_default(),
            );
        }
        if !data_sources.is_empty() {
            root.insert(
                "data".to_string(),
                serde_json::to_value(&data_sources).unwrap_or_default(),
            );
        }
        if !outputs.is_empty() {
            root.insert(
                "output".to_string(),
                serde_json::to_value(&outputs).unwrap_or_default(),
            );
        }

        serde_json::Value::Object(root)
    }

    /// Write the synthesized configuration to `<dir>/main.tf.json`.
    pub async fn write_to(&self, dir: &std::path::Path) -> Result<std::path::PathBuf> {
        let path = dir.join("main.tf.json");
        let content = serde_json::to_string_pretty(&self.synthesize())?;
        tokio::fs::write(&path, content).await?;
        tracing::debug!("Synthesized stack to {}", path.display());
        Ok(path)
    }
}
