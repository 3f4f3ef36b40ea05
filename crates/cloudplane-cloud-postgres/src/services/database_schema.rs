//! Live queries and apply wiring for database schemas

use super::postgresql_provider_block;
use crate::credentials::PostgresCredentials;
use crate::modules::DatabaseSchemaModule;
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
pub struct DatabaseSchemaService {
    psql: Psql,
    credentials: PostgresCredentials,
}

impl DatabaseSchemaService {
    pub fn new(credentials: PostgresCredentials) -> Self {
        Self {
            psql: Psql::new(credentials.clone()),
            credentials,
        }
    }

    fn normalize(&self, datname: &str) -> OutputMap {
        let mut row = OutputMap::new();
        row.insert("id".to_string(), json!(datname));
        row.insert("name".to_string(), json!(datname));
        row.insert("protocol".to_string(), json!("postgresql"));
        row.insert("host".to_string(), json!(self.credentials.host));
        row.insert("port".to_string(), json!(self.credentials.port));
        row.insert(
            "url".to_string(),
            json!(format!(
                "postgresql://{}:{}/{datname}",
                self.credentials.host, self.credentials.port
            )),
        );
        row
    }
}

#[async_trait]
impl ResourceService for DatabaseSchemaService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DatabaseSchema
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        // The catalog query pre-filters on the id pattern; the shared
        // paginate pass still applies the full filter semantics.
        let names = self
            .psql
            .list_databases(filter.id.as_deref())
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::DatabaseSchema,
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
        _secrets: &dyn SecretGenerator,
    ) -> cloudplane_cloud::Result<Box<dyn ResourceModule>> {
        Ok(Box::new(DatabaseSchemaModule::new(
            stack,
            inputs,
            &self.credentials,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_rows_carry_connection_info() {
        let service = DatabaseSchemaService::new(PostgresCredentials {
            host: "db.internal".to_string(),
            port: 5433,
            username: "admin".to_string(),
            password: "pw".to_string(),
            database: "postgres".to_string(),
        });
        let row = service.normalize("app");
        assert_eq!(row["url"], "postgresql://db.internal:5433/app");
        for field in ResourceKind::DatabaseSchema.output_schema().fields {
            assert!(row.contains_key(field.name));
        }
    }
}
