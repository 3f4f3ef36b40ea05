//! Managed database cluster synthesis

use super::str_input;
use cloudplane_cloud::{ImportMap, OutputMap, ResourceModule, UNRESOLVED};
use cloudplane_terraform::{ConstructAddress, Stack};
use serde_json::json;
use std::collections::BTreeMap;

/// One `digitalocean_database_cluster` plus its CA data source.
pub struct DatabaseModule {
    outputs: OutputMap,
    cluster: ConstructAddress,
}

impl DatabaseModule {
    pub fn new(
        stack: &mut Stack,
        inputs: &OutputMap,
        default_region: Option<&str>,
    ) -> cloudplane_cloud::Result<Self> {
        let name = str_input(inputs, "name").unwrap_or_default();
        let database_type = str_input(inputs, "databaseType").unwrap_or_default();

        // The API calls postgres "pg"; clients speak "postgresql".
        let engine = if database_type == "postgres" { "pg" } else { database_type };
        let protocol = if database_type == "postgres" {
            "postgresql"
        } else {
            database_type
        };

        let vpc = str_input(inputs, "vpc");
        let region = str_input(inputs, "region")
            .or(default_region)
            .unwrap_or("nyc1");

        let mut props: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        props.insert(
            "name".to_string(),
            json!(name.replace('/', "--").to_lowercase()),
        );
        props.insert("region".to_string(), json!(region));
        props.insert(
            "size".to_string(),
            json!(str_input(inputs, "databaseSize").unwrap_or("db-s-1vcpu-1gb")),
        );
        props.insert("engine".to_string(), json!(engine));
        props.insert(
            "version".to_string(),
            json!(str_input(inputs, "databaseVersion").unwrap_or("15")),
        );
        props.insert("node_count".to_string(), json!(1));
        if let Some(vpc) = vpc {
            props.insert("private_network_uuid".to_string(), json!(vpc));
        }

        let cluster = stack.add_resource("digitalocean_database_cluster", "database", props)?;

        let ca = stack.add_data_source(
            "digitalocean_database_ca",
            "ca",
            [("cluster_id".to_string(), json!(cluster.attr("id")))]
                .into_iter()
                .collect(),
        )?;

        let mut outputs = OutputMap::new();
        outputs.insert("id".to_string(), json!(cluster.attr("id")));
        outputs.insert("protocol".to_string(), json!(protocol));
        outputs.insert("host".to_string(), json!(cluster.attr("host")));
        outputs.insert("port".to_string(), json!(cluster.attr("port")));
        outputs.insert("username".to_string(), json!(cluster.attr("user")));
        outputs.insert("password".to_string(), json!(cluster.attr("password")));
        outputs.insert("certificate".to_string(), json!(ca.data_attr("certificate")));

        Ok(Self { outputs, cluster })
    }
}

impl ResourceModule for DatabaseModule {
    fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    fn gen_imports(&self, external_id: &str) -> cloudplane_cloud::Result<ImportMap> {
        Ok([(self.cluster.clone(), external_id.to_string())]
            .into_iter()
            .collect())
    }

    fn display_names(&self) -> BTreeMap<ConstructAddress, String> {
        [(self.cluster.clone(), "Database".to_string())]
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudplane_core::ResourceKind;

    fn inputs() -> OutputMap {
        [
            ("name".to_string(), json!("My/App")),
            ("databaseType".to_string(), json!("postgres")),
            ("databaseVersion".to_string(), json!("15")),
            ("vpc".to_string(), json!("vpc-123")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn synthesizes_cluster_and_ca() {
        let mut stack = Stack::new();
        let module = DatabaseModule::new(&mut stack, &inputs(), None).unwrap();

        let synth = stack.synthesize();
        let cluster = &synth["resource"]["digitalocean_database_cluster"]["database"];
        assert_eq!(cluster["name"], "my--app");
        assert_eq!(cluster["engine"], "pg");
        assert_eq!(cluster["private_network_uuid"], "vpc-123");
        assert_eq!(
            synth["data"]["digitalocean_database_ca"]["ca"]["cluster_id"],
            "${digitalocean_database_cluster.database.id}"
        );

        assert_eq!(module.outputs()["protocol"], "postgresql");
        assert_eq!(
            module.outputs()["host"],
            "${digitalocean_database_cluster.database.host}"
        );
    }

    #[test]
    fn outputs_cover_the_schema() {
        let mut stack = Stack::new();
        let module = DatabaseModule::new(&mut stack, &inputs(), None).unwrap();
        for field in ResourceKind::Database.output_schema().fields {
            assert!(
                module.outputs().contains_key(field.name),
                "missing output {}",
                field.name
            );
        }
        assert_eq!(
            module.outputs().len(),
            ResourceKind::Database.output_schema().fields.len()
        );
    }

    #[test]
    fn default_region_comes_from_credentials() {
        let mut stack = Stack::new();
        let mut no_region = inputs();
        no_region.remove("region");
        DatabaseModule::new(&mut stack, &no_region, Some("fra1")).unwrap();
        let synth = stack.synthesize();
        assert_eq!(
            synth["resource"]["digitalocean_database_cluster"]["database"]["region"],
            "fra1"
        );
    }

    #[test]
    fn imports_cover_every_managed_construct() {
        let mut stack = Stack::new();
        let module = DatabaseModule::new(&mut stack, &inputs(), None).unwrap();
        let imports = module.gen_imports("9cc10173").unwrap();
        cloudplane_cloud::check_import_coverage(&stack.resource_addresses(), &imports).unwrap();
    }

    #[test]
    fn display_names_have_no_secrets() {
        let mut stack = Stack::new();
        let module = DatabaseModule::new(&mut stack, &inputs(), None).unwrap();
        for label in module.display_names().values() {
            assert!(!label.contains("password"));
        }
    }

    #[test]
    fn unused_sentinel_is_not_in_outputs() {
        // Every database output is either computed or a literal.
        let mut stack = Stack::new();
        let module = DatabaseModule::new(&mut stack, &inputs(), None).unwrap();
        assert!(!module.outputs().values().any(|v| v.as_str() == Some(UNRESOLVED)));
    }
}
