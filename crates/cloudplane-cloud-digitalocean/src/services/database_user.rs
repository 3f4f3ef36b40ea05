//! Live queries and apply wiring for database users
//!
//! The API only exposes users per cluster, so listing walks every cluster
//! and flattens. Row ids are `<cluster id>/<username>`.

use super::digitalocean_provider_block;
use crate::api::{ApiDatabase, ApiDatabaseUser, DoApi};
use crate::credentials::DigitalOceanCredentials;
use crate::modules::DatabaseUserModule;
use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, ListFilter, OutputMap, PagedRows, Paging, ResourceModule, ResourceService,
    SecretGenerator,
};
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use serde_json::json;
use std::sync::Arc;

pub struct DatabaseUserService {
    api: Arc<DoApi>,
    credentials: DigitalOceanCredentials,
}

impl DatabaseUserService {
    pub fn new(api: Arc<DoApi>, credentials: DigitalOceanCredentials) -> Self {
        Self { api, credentials }
    }
}

/// Normalize one user row in the context of its cluster.
pub(crate) fn normalize_user(
    cluster: &ApiDatabase,
    user: &ApiDatabaseUser,
) -> cloudplane_cloud::Result<OutputMap> {
    let Some(connection) = &cluster.connection else {
        return Err(CloudError::ProviderDataCorrupt {
            kind: ResourceKind::DatabaseUser,
            raw: format!("{cluster:?}"),
        });
    };

    let protocol = cluster.protocol();
    let database = connection.database.as_deref().unwrap_or("defaultdb");
    // The API never returns stored passwords on list.
    let password = user.password.as_deref().unwrap_or("");
    let url = format!(
        "{protocol}://{}:{password}@{}:{}/{database}",
        user.name, connection.host, connection.port
    );

    let mut row = OutputMap::new();
    row.insert(
        "id".to_string(),
        json!(format!("{}/{}", cluster.id, user.name)),
    );
    row.insert("username".to_string(), json!(user.name));
    row.insert("password".to_string(), json!(password));
    row.insert("database".to_string(), json!(database));
    row.insert("protocol".to_string(), json!(protocol));
    row.insert("host".to_string(), json!(connection.host));
    row.insert("port".to_string(), json!(connection.port));
    row.insert("url".to_string(), json!(url));
    Ok(row)
}

#[async_trait]
impl ResourceService for DatabaseUserService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DatabaseUser
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        let clusters = self
            .api
            .list_databases()
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::DatabaseUser,
                reason: e.to_string(),
            })?;

        let mut rows = Vec::new();
        for cluster in &clusters {
            let users = self
                .api
                .list_database_users(&cluster.id)
                .await
                .map_err(|e| CloudError::ProviderQueryFailed {
                    kind: ResourceKind::DatabaseUser,
                    reason: e.to_string(),
                })?;
            for user in &users {
                rows.push(normalize_user(cluster, user)?);
            }
        }

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
        Ok(Box::new(DatabaseUserModule::new(stack, inputs)?))
    }
}
