//! Database user synthesis
//!
//! Looks the owning cluster up by name through a data source, so the user
//! lands on the right cluster even when the caller only references the
//! database's id output.

use super::str_input;
use cloudplane_cloud::{ImportMap, OutputMap, ResourceModule};
use cloudplane_terraform::{ConstructAddress, Stack};
use serde_json::json;
use std::collections::BTreeMap;

pub struct DatabaseUserModule {
    outputs: OutputMap,
    user: ConstructAddress,
}

impl DatabaseUserModule {
    pub fn new(stack: &mut Stack, inputs: &OutputMap) -> cloudplane_cloud::Result<Self> {
        let username = str_input(inputs, "username").unwrap_or_default().to_string();
        let database = str_input(inputs, "database").unwrap_or_default().to_string();

        let instance = stack.add_data_source(
            "digitalocean_database_cluster",
            "instance",
            [("name".to_string(), json!(database))].into_iter().collect(),
        )?;

        let user = stack.add_resource(
            "digitalocean_database_user",
            "user",
            [
                ("cluster_id".to_string(), json!(instance.data_attr("id"))),
                ("name".to_string(), json!(username)),
            ]
            .into_iter()
            .collect(),
        )?;

        // The engine attribute says "pg" for postgres; normalize inside the
        // expression so the output is the client-facing protocol.
        let engine = format!("data.{}.engine", instance.as_str());
        let protocol = format!("${{{engine} == \"pg\" ? \"postgresql\" : {engine}}}");

        let host = instance.data_attr("host");
        let port = instance.data_attr("port");
        let password = user.attr("password");
        let url = format!("{protocol}://{username}:{password}@{host}:{port}/{database}");

        let mut outputs = OutputMap::new();
        outputs.insert("id".to_string(), json!(format!("{database}/{username}")));
        outputs.insert("username".to_string(), json!(username));
        outputs.insert("password".to_string(), json!(password));
        outputs.insert("database".to_string(), json!(database));
        outputs.insert("protocol".to_string(), json!(protocol));
        outputs.insert("host".to_string(), json!(host));
        outputs.insert("port".to_string(), json!(port));
        outputs.insert("url".to_string(), json!(url));

        Ok(Self { outputs, user })
    }
}

impl ResourceModule for DatabaseUserModule {
    fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    fn gen_imports(&self, external_id: &str) -> cloudplane_cloud::Result<ImportMap> {
        // terraform imports database users as `<cluster id>,<name>`; the
        // caller supplies the full external id.
        Ok([(self.user.clone(), external_id.to_string())]
            .into_iter()
            .collect())
    }

    fn display_names(&self) -> BTreeMap<ConstructAddress, String> {
        [(self.user.clone(), "Database user".to_string())]
            .into_iter()
            .collect()
    }
}
