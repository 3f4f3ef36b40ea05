//! PostgreSQL provider implementation

use crate::credentials::PostgresCredentials;
use crate::error::PgError;
use crate::psql::Psql;
use crate::services::{DatabaseSchemaService, DatabaseUserService};
use async_trait::async_trait;
use cloudplane_cloud::{
    validate_credentials, CloudError, CloudProvider, ProviderConfig, ResourceService,
};
use cloudplane_core::ResourceKind;

pub const PROVIDER_TYPE: &str = "postgres";

/// One PostgreSQL server binding.
#[derive(Debug)]
pub struct PostgresProvider {
    name: String,
    psql: Psql,
    database_schema: DatabaseSchemaService,
    database_user: DatabaseUserService,
}

impl PostgresProvider {
    pub fn new(name: impl Into<String>, credentials: PostgresCredentials) -> Self {
        Self {
            name: name.into(),
            psql: Psql::new(credentials.clone()),
            database_schema: DatabaseSchemaService::new(credentials.clone()),
            database_user: DatabaseUserService::new(credentials),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> cloudplane_cloud::Result<Self> {
        let credentials: PostgresCredentials =
            validate_credentials(PROVIDER_TYPE, &config.credentials)?;
        Ok(Self::new(&config.name, credentials))
    }
}

#[async_trait]
impl CloudProvider for PostgresProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    fn display_name(&self) -> &str {
        "PostgreSQL"
    }

    fn resources(&self) -> Vec<ResourceKind> {
        vec![ResourceKind::DatabaseSchema, ResourceKind::DatabaseUser]
    }

    fn service(&self, kind: ResourceKind) -> cloudplane_cloud::Result<&dyn ResourceService> {
        match kind {
            ResourceKind::DatabaseSchema => Ok(&self.database_schema),
            ResourceKind::DatabaseUser => Ok(&self.database_user),
            other => Err(CloudError::UnsupportedResource {
                kind: other,
                provider_type: PROVIDER_TYPE.to_string(),
            }),
        }
    }

    async fn test_credentials(&self) -> cloudplane_cloud::Result<bool> {
        match self.psql.check_connection().await {
            Ok(()) => Ok(true),
            Err(PgError::PsqlNotFound) => {
                tracing::warn!("psql is not installed; cannot verify credentials");
                Ok(false)
            }
            Err(e) => {
                tracing::debug!("PostgreSQL credential check failed: {e}");
                Ok(false)
            }
        }
    }
}
