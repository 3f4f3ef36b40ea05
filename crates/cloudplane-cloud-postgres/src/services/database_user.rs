//! Live queries and apply wiring for database roles

use super::postgresql_provider_block;
use crate::credentials::PostgresCredentials;
use crate::modules::DatabaseUserModule;
use crate::psql::Psql;
use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, ListFilter, OutputMap, PagedRows, Paging, ResourceModule, ResourceService,
    SecretGenerator,
};
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use serde_json::json;

#[derive(Debug)]
pub struct DatabaseUserService {
    psql: Psql,
    credentials: PostgresCredentials,
}

impl DatabaseUserService {
    pub fn new(credentials: PostgresCredentials) -> Self {
        Self {
            psql: Psql::new(credentials.clone()),
            credentials,
        }
    }

    fn normalize(&self, usename: &str) -> OutputMap {
        // The catalog never exposes passwords or per-role databases; those
        // fields are present but empty, matching what a live listing can
        // actually know.
        let mut row = OutputMap::new();
        row.insert("id".to_string(), json!(usename));
        row.insert("username".to_string(), json!(usename));
        row.insert("password".to_string(), json!(""));
        row.insert("database".to_string(), json!(""));
        row.insert("protocol".to_string(), json!("postgresql"));
        row.insert("host".to_string(), json!(self.credentials.host));
        row.insert("port".to_string(), json!(self.credentials.port));
        row.insert(
            "url".to_string(),
            json!(format!(
                "postgresql://{}:{}",
                self.credentials.host, self.credentials.port
            )),
        );
        row
    }
}

#[async_trait]
impl ResourceService for DatabaseUserService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DatabaseUser
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        let names = self
            .psql
            .list_roles(filter.id.as_deref())
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::DatabaseUser,
                reason: e.to_string(),
            })?;

        let rows = names.iter().map(|name| self.normalize(name)).collect();
        Ok(PagedRows::paginate(rows, filter, paging))
    }

    fn configure_terraform_providers(&self, stack: &mut Stack) {
        stack.register_provider(postgresql_provider_block(&self.credentials));
    }

    fn plan_module(
        &self,
        stack: &mut Stack,
        _id: &str,
        inputs: &OutputMap,
        secrets: &dyn SecretGenerator,
    ) -> cloudplane_cloud::Result<Box<dyn ResourceModule>> {
        Ok(Box::new(DatabaseUserModule::new(
            stack,
            inputs,
            &self.credentials,
            secrets,
        )?))
    }
}
