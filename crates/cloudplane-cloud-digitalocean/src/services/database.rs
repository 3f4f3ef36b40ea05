//! Live queries and apply wiring for managed databases

use super::digitalocean_provider_block;
use crate::api::{ApiDatabase, DoApi};
use crate::credentials::DigitalOceanCredentials;
use crate::modules::DatabaseModule;
use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, ListFilter, OutputMap, PagedRows, Paging, ResourceModule, ResourceService,
    SecretGenerator, UNRESOLVED,
};
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use serde_json::json;
use std::sync::Arc;

pub struct DatabaseService {
    api: Arc<DoApi>,
    credentials: DigitalOceanCredentials,
}

impl DatabaseService {
    pub fn new(api: Arc<DoApi>, credentials: DigitalOceanCredentials) -> Self {
        Self { api, credentials }
    }
}

/// Normalize one API row into the `database` output shape.
pub(crate) fn normalize_database(database: &ApiDatabase) -> cloudplane_cloud::Result<OutputMap> {
    let Some(connection) = &database.connection else {
        return Err(CloudError::ProviderDataCorrupt {
            kind: ResourceKind::Database,
            raw: format!("{database:?}"),
        });
    };

    let mut row = OutputMap::new();
    row.insert("id".to_string(), json!(database.id));
    row.insert("name".to_string(), json!(database.name));
    row.insert("protocol".to_string(), json!(database.protocol()));
    row.insert("host".to_string(), json!(connection.host));
    row.insert("port".to_string(), json!(connection.port));
    row.insert(
        "username".to_string(),
        json!(connection.user.as_deref().unwrap_or(UNRESOLVED)),
    );
    row.insert(
        "password".to_string(),
        json!(connection.password.as_deref().unwrap_or(UNRESOLVED)),
    );
    row.insert("certificate".to_string(), json!(UNRESOLVED));
    Ok(row)
}

#[async_trait]
impl ResourceService for DatabaseService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        let databases = self
            .api
            .list_databases()
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::Database,
                reason: e.to_string(),
            })?;

        let rows = databases
            .iter()
            .map(normalize_database)
            .collect::<cloudplane_cloud::Result<Vec<_>>>()?;

        Ok(PagedRows::paginate(rows, filter, paging))
    }

    fn configure_terraform_providers(&self, stack: &mut Stack) {
        stack.register_provider(digitalocean_provider_block(&self.credentials.token));
    }

    fn plan_module(
        &self,
        stack: &mut Stack,
        _id: &str,
        inputs: &OutputMap,
        _secrets: &dyn SecretGenerator,
    ) -> cloudplane_cloud::Result<Box<dyn ResourceModule>> {
        let module =
            DatabaseModule::new(stack, inputs, self.credentials.default_region.as_deref())?;
        Ok(Box::new(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiDatabaseConnection;

    fn database(id: &str, name: &str) -> ApiDatabase {
        ApiDatabase {
            id: id.to_string(),
            name: name.to_string(),
            engine: "pg".to_string(),
            version: Some("15".to_string()),
            connection: Some(ApiDatabaseConnection {
                host: format!("{name}.db.ondigitalocean.com"),
                port: 25060,
                user: Some("doadmin".to_string()),
                password: None,
                database: Some("defaultdb".to_string()),
            }),
        }
    }

    #[test]
    fn normalization_maps_engine_to_protocol() {
        let row = normalize_database(&database("d1", "prod")).unwrap();
        assert_eq!(row["protocol"], "postgresql");
        assert_eq!(row["port"], 25060);
        assert_eq!(row["password"], UNRESOLVED);
    }

    #[test]
    fn missing_connection_is_corrupt_data() {
        let mut broken = database("d1", "prod");
        broken.connection = None;
        let err = normalize_database(&broken).unwrap_err();
        assert!(matches!(err, CloudError::ProviderDataCorrupt { .. }));
    }
}
