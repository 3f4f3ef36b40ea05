//! Database (schema) synthesis

use super::str_input;
use crate::credentials::PostgresCredentials;
use cloudplane_cloud::{ImportMap, OutputMap, ResourceModule};
use cloudplane_terraform::{ConstructAddress, Stack};
use serde_json::json;
use std::collections::BTreeMap;

/// One `postgresql_database` on the credentialed server.
pub struct DatabaseSchemaModule {
    outputs: OutputMap,
    database: ConstructAddress,
}

impl DatabaseSchemaModule {
    pub fn new(
        stack: &mut Stack,
        inputs: &OutputMap,
        credentials: &PostgresCredentials,
    ) -> cloudplane_cloud::Result<Self> {
        let name = str_input(inputs, "name").unwrap_or_default().to_string();

        let database = stack.add_resource(
            "postgresql_database",
            "schema",
            [("name".to_string(), json!(name))].into_iter().collect(),
        )?;

        let url = format!(
            "postgresql://{}:{}/{name}",
            credentials.host, credentials.port
        );

        let mut outputs = OutputMap::new();
        outputs.insert("id".to_string(), json!(name));
        outputs.insert("name".to_string(), json!(name));
        outputs.insert("protocol".to_string(), json!("postgresql"));
        outputs.insert("host".to_string(), json!(credentials.host));
        outputs.insert("port".to_string(), json!(credentials.port));
        outputs.insert("url".to_string(), json!(url));

        Ok(Self { outputs, database })
    }
}

impl ResourceModule for DatabaseSchemaModule {
    fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    fn gen_imports(&self, external_id: &str) -> cloudplane_cloud::Result<ImportMap> {
        Ok([(self.database.clone(), external_id.to_string())]
            .into_iter()
            .collect())
    }

    fn display_names(&self) -> BTreeMap<ConstructAddress, String> {
        [(self.database.clone(), "Database".to_string())]
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudplane_core::ResourceKind;

    fn credentials() -> PostgresCredentials {
        PostgresCredentials {
            host: "db.internal".to_string(),
            port: 5432,
            username: "admin".to_string(),
            password: "pw".to_string(),
            database: "postgres".to_string(),
        }
    }

    #[test]
    fn synthesizes_database_resource() {
        let mut stack = Stack::new();
        let inputs: OutputMap = [("name".to_string(), json!("app"))].into_iter().collect();
        let module = DatabaseSchemaModule::new(&mut stack, &inputs, &credentials()).unwrap();

        let synth = stack.synthesize();
        assert_eq!(synth["resource"]["postgresql_database"]["schema"]["name"], "app");
        assert_eq!(module.outputs()["url"], "postgresql://db.internal:5432/app");
    }

    #[test]
    fn outputs_cover_the_schema() {
        let mut stack = Stack::new();
        let inputs: OutputMap = [("name".to_string(), json!("app"))].into_iter().collect();
        let module = DatabaseSchemaModule::new(&mut stack, &inputs, &credentials()).unwrap();
        for field in ResourceKind::DatabaseSchema.output_schema().fields {
            assert!(module.outputs().contains_key(field.name));
        }
    }

    #[test]
    fn import_covers_the_database() {
        let mut stack = Stack::new();
        let inputs: OutputMap = [("name".to_string(), json!("app"))].into_iter().collect();
        let module = DatabaseSchemaModule::new(&mut stack, &inputs, &credentials()).unwrap();
        let imports = module.gen_imports("app").unwrap();
        cloudplane_cloud::check_import_coverage(&stack.resource_addresses(), &imports).unwrap();
    }
}
