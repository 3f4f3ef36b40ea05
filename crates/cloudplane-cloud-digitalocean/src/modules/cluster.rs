//! Kubernetes cluster synthesis

use super::str_input;
use cloudplane_cloud::{ImportMap, OutputMap, ResourceModule, UNRESOLVED};
use cloudplane_terraform::{ConstructAddress, Stack};
use serde_json::json;
use std::collections::BTreeMap;

pub struct ClusterModule {
    outputs: OutputMap,
    cluster: ConstructAddress,
}

impl ClusterModule {
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
        let version = str_input(inputs, "kubernetesVersion")
            .unwrap_or_default()
            .to_string();
        let vpc = str_input(inputs, "vpc").map(str::to_string);
        let node_count = inputs
            .get("nodeCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(1);

        let mut props: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        props.insert("name".to_string(), json!(name));
        props.insert("region".to_string(), json!(region));
        props.insert("version".to_string(), json!(version));
        if let Some(vpc) = &vpc {
            props.insert("vpc_uuid".to_string(), json!(vpc));
        }
        props.insert(
            "node_pool".to_string(),
            json!({
                "name": "default",
                "size": "s-2vcpu-2gb",
                "node_count": node_count,
            }),
        );

        let cluster = stack.add_resource("digitalocean_kubernetes_cluster", "cluster", props)?;

        let mut outputs = OutputMap::new();
        outputs.insert("id".to_string(), json!(cluster.attr("id")));
        outputs.insert("name".to_string(), json!(name));
        outputs.insert(
            "vpc".to_string(),
            json!(vpc.as_deref().unwrap_or(UNRESOLVED)),
        );
        outputs.insert("kubernetesVersion".to_string(), json!(version));
        // The kubeconfig lands on disk out of band; nothing to report here.
        outputs.insert("configPath".to_string(), json!(UNRESOLVED));

        Ok(Self { outputs, cluster })
    }
}

impl ResourceModule for ClusterModule {
    fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    fn gen_imports(&self, external_id: &str) -> cloudplane_cloud::Result<ImportMap> {
        Ok([(self.cluster.clone(), external_id.to_string())]
            .into_iter()
            .collect())
    }

    fn display_names(&self) -> BTreeMap<ConstructAddress, String> {
        [(self.cluster.clone(), "Kubernetes cluster".to_string())]
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
            ("name".to_string(), json!("workers")),
            ("region".to_string(), json!("nyc3")),
            ("kubernetesVersion".to_string(), json!("1.27")),
            ("vpc".to_string(), json!("vpc-9")),
            ("nodeCount".to_string(), json!(3)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn synthesizes_cluster_with_node_pool() {
        let mut stack = Stack::new();
        let module = ClusterModule::new(&mut stack, &inputs(), None).unwrap();

        let synth = stack.synthesize();
        let cluster = &synth["resource"]["digitalocean_kubernetes_cluster"]["cluster"];
        assert_eq!(cluster["vpc_uuid"], "vpc-9");
        assert_eq!(cluster["node_pool"]["node_count"], 3);
        assert_eq!(module.outputs()["vpc"], "vpc-9");
    }

    #[test]
    fn outputs_cover_the_schema() {
        let mut stack = Stack::new();
        let module = ClusterModule::new(&mut stack, &inputs(), None).unwrap();
        for field in ResourceKind::Cluster.output_schema().fields {
            assert!(module.outputs().contains_key(field.name));
        }
    }
}
