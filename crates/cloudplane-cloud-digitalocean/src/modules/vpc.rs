//! VPC synthesis

use super::str_input;
use cloudplane_cloud::{ImportMap, OutputMap, ResourceModule, UNRESOLVED};
use cloudplane_terraform::{ConstructAddress, Stack};
use serde_json::json;
use std::collections::BTreeMap;

pub struct VpcModule {
    outputs: OutputMap,
    vpc: ConstructAddress,
}

impl VpcModule {
    pub fn new(
        stack: &mut Stack,
        inputs: &OutputMap,
        default_region: Option<&str>,
    ) -> cloudplane_cloud::Result<Self> {
        let name = str_input(inputs, "name").unwrap_or_default().to_string();
        let region = str_input(inputs, "region")
            .or(default_region)
            .unwrap_or("nyc1")
            .to_string();
        let description = str_input(inputs, "description").map(str::to_string);

        let mut props: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        props.insert("name".to_string(), json!(name));
        props.insert("region".to_string(), json!(region));
        if let Some(description) = &description {
            props.insert("description".to_string(), json!(description));
        }

        let vpc = stack.add_resource("digitalocean_vpc", "vpc", props)?;

        let mut outputs = OutputMap::new();
        outputs.insert("id".to_string(), json!(vpc.attr("id")));
        outputs.insert("name".to_string(), json!(name));
        outputs.insert("region".to_string(), json!(region));
        outputs.insert(
            "description".to_string(),
            json!(description.as_deref().unwrap_or(UNRESOLVED)),
        );

        Ok(Self { outputs, vpc })
    }
}

impl ResourceModule for VpcModule {
    fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    fn gen_imports(&self, external_id: &str) -> cloudplane_cloud::Result<ImportMap> {
        Ok([(self.vpc.clone(), external_id.to_string())]
            .into_iter()
            .collect())
    }

    fn display_names(&self) -> BTreeMap<ConstructAddress, String> {
        [(self.vpc.clone(), "VPC".to_string())].into_iter().collect()
    }
}
