//! Live queries and apply wiring for VPCs

use super::digitalocean_provider_block;
use crate::api::{ApiVpc, DoApi};
use crate::credentials::DigitalOceanCredentials;
use crate::modules::VpcModule;
use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, ListFilter, OutputMap, PagedRows, Paging, ResourceModule, ResourceService,
    SecretGenerator, UNRESOLVED,
};
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use serde_json::json;
use std::sync::Arc;

pub struct VpcService {
    api: Arc<DoApi>,
    credentials: DigitalOceanCredentials,
}

impl VpcService {
    pub fn new(api: Arc<DoApi>, credentials: DigitalOceanCredentials) -> Self {
        Self { api, credentials }
    }
}

pub(crate) fn normalize_vpc(vpc: &ApiVpc) -> OutputMap {
    let mut row = OutputMap::new();
    row.insert("id".to_string(), json!(vpc.id));
    row.insert("name".to_string(), json!(vpc.name));
    row.insert("region".to_string(), json!(vpc.region));
    row.insert(
        "description".to_string(),
        json!(vpc.description.as_deref().unwrap_or(UNRESOLVED)),
    );
    row
}

#[async_trait]
impl ResourceService for VpcService {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Vpc
    }

    async fn list(&self, filter: &ListFilter, paging: &Paging) -> cloudplane_cloud::Result<PagedRows> {
        let vpcs = self
            .api
            .list_vpcs()
            .await
            .map_err(|e| CloudError::ProviderQueryFailed {
                kind: ResourceKind::Vpc,
                reason: e.to_string(),
            })?;

        let rows = vpcs.iter().map(normalize_vpc).collect();
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
        let module = VpcModule::new(stack, inputs, self.credentials.default_region.as_deref())?;
        Ok(Box::new(module))
    }
}
