//! DigitalOcean provider implementation

use crate::api::DoApi;
use crate::credentials::DigitalOceanCredentials;
use crate::error::DoError;
use crate::services::{ClusterService, DatabaseService, DatabaseUserService, VpcService};
use async_trait::async_trait;
use cloudplane_cloud::{
    validate_credentials, CloudError, CloudProvider, ProviderConfig, ResourceService,
};
use cloudplane_core::ResourceKind;
use std::sync::Arc;

pub const PROVIDER_TYPE: &str = "digitalocean";

/// One DigitalOcean account binding.
pub struct DigitalOceanProvider {
    name: String,
    api: Arc<DoApi>,
    database: DatabaseService,
    database_user: DatabaseUserService,
    vpc: VpcService,
    cluster: ClusterService,
}

impl DigitalOceanProvider {
    pub fn new(name: impl Into<String>, credentials: DigitalOceanCredentials) -> Self {
        let api = Arc::new(DoApi::new(&credentials.token));
        Self {
            name: name.into(),
            database: DatabaseService::new(api.clone(), credentials.clone()),
            database_user: DatabaseUserService::new(api.clone(), credentials.clone()),
            vpc: VpcService::new(api.clone(), credentials.clone()),
            cluster: ClusterService::new(api.clone(), credentials),
            api,
        }
    }

    /// Construct from a raw provider config, validating the credential bag
    /// first.
    pub fn from_config(config: &ProviderConfig) -> cloudplane_cloud::Result<Self> {
        let credentials: DigitalOceanCredentials =
            validate_credentials(PROVIDER_TYPE, &config.credentials)?;
        Ok(Self::new(&config.name, credentials))
    }
}

#[async_trait]
impl CloudProvider for DigitalOceanProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    fn display_name(&self) -> &str {
        "DigitalOcean"
    }

    fn resources(&self) -> Vec<ResourceKind> {
        vec![
            ResourceKind::Database,
            ResourceKind::DatabaseUser,
            ResourceKind::Vpc,
            ResourceKind::Cluster,
        ]
    }

    fn service(&self, kind: ResourceKind) -> cloudplane_cloud::Result<&dyn ResourceService> {
        match kind {
            ResourceKind::Database => Ok(&self.database),
            ResourceKind::DatabaseUser => Ok(&self.database_user),
            ResourceKind::Vpc => Ok(&self.vpc),
            ResourceKind::Cluster => Ok(&self.cluster),
            other => Err(CloudError::UnsupportedResource {
                kind: other,
                provider_type: PROVIDER_TYPE.to_string(),
            }),
        }
    }

    async fn test_credentials(&self) -> cloudplane_cloud::Result<bool> {
        match self.api.account().await {
            Ok(account) => {
                tracing::debug!("DigitalOcean account {} authenticated", account.uuid);
                Ok(true)
            }
            Err(DoError::Unauthorized) => Ok(false),
            Err(e) => {
                // Network trouble is indistinguishable from bad credentials
                // for gating purposes; report it but do not raise.
                tracing::warn!("DigitalOcean credential check failed: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> DigitalOceanProvider {
        DigitalOceanProvider::new(
            "do-prod",
            DigitalOceanCredentials {
                token: "dop_v1_test".to_string(),
                default_region: Some("nyc3".to_string()),
            },
        )
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let err = match provider().service(ResourceKind::AppDeployment) {
            Ok(_) => panic!("expected AppDeployment to be unsupported"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            CloudError::UnsupportedResource { provider_type, .. } if provider_type == "digitalocean"
        ));
    }

    #[test]
    fn supported_kinds_resolve() {
        let provider = provider();
        for kind in provider.resources() {
            assert_eq!(provider.service(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn from_config_validates_credentials() {
        let config = ProviderConfig {
            provider_type: PROVIDER_TYPE.to_string(),
            name: "do-prod".to_string(),
            credentials: json!({"wrong": true}),
        };
        assert!(matches!(
            DigitalOceanProvider::from_config(&config),
            Err(CloudError::CredentialsInvalid { .. })
        ));
    }
}
