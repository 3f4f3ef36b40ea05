//! Per-kind, per-provider resource service contract

use crate::error::Result;
use crate::module::ResourceModule;
use crate::paging::{ListFilter, PagedRows, Paging};
use crate::secrets::SecretGenerator;
use async_trait::async_trait;
use cloudplane_core::ResourceKind;
use cloudplane_terraform::Stack;
use std::collections::BTreeMap;

/// A normalized resource row: output-schema key -> value.
pub type OutputMap = BTreeMap<String, serde_json::Value>;

/// One resource kind as implemented by one provider.
///
/// Binds the live-query capability (straight against the vendor API, not
/// through the IaC backend) to the synthesis module used for apply, plus
/// the knowledge of how to configure the Terraform provider block.
///
/// Stateless beyond its credentials; one instance serves many operations.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// The kind this service implements.
    fn kind(&self) -> ResourceKind;

    /// Query the provider's live API for matching resources.
    ///
    /// `total` in the response is the full match count even when `rows` is
    /// a page subset. Failures surface as `ProviderQueryFailed` (retryable)
    /// or `ProviderDataCorrupt` (fatal, carries the raw row).
    async fn list(&self, filter: &ListFilter, paging: &Paging) -> Result<PagedRows>;

    /// Retrieve one resource by id.
    ///
    /// Defined as `list` with an id filter, taking the first row. This
    /// composition is a fixed convention — it guarantees `get` and `list`
    /// share one filter semantics — and concrete services do not override
    /// it. A service with a cheaper point lookup can use it inside `list`
    /// when an id filter is present.
    async fn get(&self, id: &str) -> Result<Option<OutputMap>> {
        let page = self.list(&ListFilter::by_id(id), &Paging::first()).await?;
        Ok(page.rows.into_iter().next())
    }

    /// Register this vendor's Terraform provider block into the synthesis
    /// scope: endpoint, credentials, and safety flags. Idempotent — the
    /// stack keeps the first registration per vendor.
    fn configure_terraform_providers(&self, stack: &mut Stack);

    /// Build the synthesis module for one resource instance.
    ///
    /// `inputs` carries the descriptor's inputs with every reference already
    /// substituted by dependency outputs. Constructing the module adds its
    /// construct subtree to the stack and fixes its output map.
    fn plan_module(
        &self,
        stack: &mut Stack,
        id: &str,
        inputs: &OutputMap,
        secrets: &dyn SecretGenerator,
    ) -> Result<Box<dyn ResourceModule>>;
}
