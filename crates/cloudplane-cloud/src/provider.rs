//! Cloud provider trait definition

use crate::error::Result;
use crate::service::ResourceService;
use async_trait::async_trait;
use cloudplane_core::ResourceKind;

/// A named, credentialed binding of one vendor to the subset of resource
/// kinds it implements.
///
/// Constructed once per account/credential set; immutable with respect to
/// its credentials once active. Credential rotation means constructing a
/// new provider and replacing the store entry — never mutating in place
/// while operations are in flight.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// The account name this instance is bound to (e.g. "do-prod").
    fn name(&self) -> &str;

    /// The provider type (e.g. "digitalocean", "postgres").
    fn provider_type(&self) -> &str;

    /// Display name for plan rendering.
    fn display_name(&self) -> &str {
        self.provider_type()
    }

    /// The resource kinds this provider implements.
    fn resources(&self) -> Vec<ResourceKind>;

    /// Look up the service for a kind.
    ///
    /// Fails with `UnsupportedResource` for kinds outside
    /// [`resources`](Self::resources).
    fn service(&self, kind: ResourceKind) -> Result<&dyn ResourceService>;

    /// Lightweight live check that the credentials work: an authenticated
    /// no-op call, never a mutation.
    ///
    /// Ordinary auth failure returns `Ok(false)`; `Err` is reserved for
    /// unrecoverable conditions.
    async fn test_credentials(&self) -> Result<bool>;
}
