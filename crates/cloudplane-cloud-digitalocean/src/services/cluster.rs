//! Live queries and apply wiring for Kubernetes clusters

use super::digitalocean_provider_block;
use crate::api::{ApiKubernetesCluster, DoApi};
use crate::credentials::DigitalOceanCredentials;
use crate::modules::ClusterModule;
use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, ListFilter, OutputMap, PagedRows, Paging, ResourceModule, ResourceService,
    SecretGenerator, UNRESOLVED,
};
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use serde_json::json;
use std::sync::Arc;

pub struct ClusterService {
    api: Arc<DoApi>,
    credentials: DigitalOceanCredentials,
}

impl ClusterService {
    pub fn new(api: Arc<DoApi>, credentials: DigitalOceanCredentials) -> Self {
        Self { api, credentials }
    }
}

pub(crate) fn normalize_cluster(cluster: &ApiKubernetesCluster) -> OutputMap {
    let mut row = OutputMap::new();
    row.insert("id".to_string(), json!(cluster.id));
    row.insert("name".to_string(), json!(cluster.name));
    row.insert(
        "vpc".to_string(),
        json!(cluster.vpc_uuid.as_deref().unwrap_or(UNRESOLVED)),
    );
    row.insert("kubernetesVersion".to_string(), json!(cluster.version));
    row.insert("configPath".to_string(), json!(UNRESOLVED));
    row
}

#[async_trait]
impl ResourceService for ClusterService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Cluster
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        let clusters = self
            .api
            .list_clusters()
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::Cluster,
                reason: e.to_string(),
            })?;

        let rows = clusters.iter().map(normalize_cluster).collect();
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
        let module = ClusterModule::new(stack, inputs, self.credentials.default_region.as_deref())?;
        Ok(Box::new(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_covers_the_output_schema() {
        let cluster = ApiKubernetesCluster {
            id: "c1".to_string(),
            name: "workers".to_string(),
            version: "1.27".to_string(),
            vpc_uuid: Some("vpc-9".to_string()),
        };
        let row = normalize_cluster(&cluster);
        for field in ResourceKind::Cluster.output_schema().fields {
            assert!(row.contains_key(field.name), "missing {}", field.name);
        }
    }
}
