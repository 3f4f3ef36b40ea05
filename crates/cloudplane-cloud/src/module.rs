//! Synthesis module contract

use crate::error::{CloudError, Result};
use crate::service::OutputMap;
use cloudplane_terraform::ConstructAddress;
use std::collections::BTreeMap;

/// Sentinel for output values the provider cannot supply.
///
/// Output maps cover every key in the kind's output schema; a field with no
/// provider-side value is set to this sentinel — never left out — so
/// dependents can detect "not available" deterministically.
pub const UNRESOLVED: &str = "(unknown)";

/// Mapping from construct address to the external id terraform should
/// import for it.
pub type ImportMap = BTreeMap<ConstructAddress, String>;

/// One synthesized resource instance.
///
/// Created once per descriptor during apply. Construction (via
/// [`crate::ResourceService::plan_module`]) builds the construct subtree
/// into the synthesis scope; afterwards the module exposes its computed
/// outputs and import/display metadata.
pub trait ResourceModule: Send + Sync {
    /// The computed output map.
    ///
    /// Deterministic for fixed inputs: contains every key of the kind's
    /// output schema exactly once. Values that only exist after apply are
    /// Terraform interpolation expressions; values the provider never
    /// returns are [`UNRESOLVED`].
    fn outputs(&self) -> &OutputMap;

    /// Map construct addresses to the external id each should be imported
    /// under, for adopting a pre-existing live resource.
    fn gen_imports(&self, external_id: &str) -> Result<ImportMap>;

    /// Human-readable labels per construct address. Cosmetic only — used
    /// by plan rendering and never by apply semantics. Must not contain
    /// secrets.
    fn display_names(&self) -> BTreeMap<ConstructAddress, String>;
}

/// Fail fast when an import map does not cover every managed construct.
///
/// Called before any terraform import runs: every address the apply step
/// would otherwise create must have an external id.
pub fn check_import_coverage(
    managed: &[&ConstructAddress],
    imports: &ImportMap,
) -> Result<()> {
    let missing: Vec<String> = managed
        .iter()
        .filter(|address| !imports.contains_key(*address))
        .map(|address| address.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CloudError::IncompleteImportMapping { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_import_map_passes() {
        let a = ConstructAddress::new("postgresql_role", "user");
        let managed = vec![&a];
        let imports: ImportMap = [(a.clone(), "role-1".to_string())].into_iter().collect();
        assert!(check_import_coverage(&managed, &imports).is_ok());
    }

    #[test]
    fn missing_address_fails_fast() {
        let a = ConstructAddress::new("postgresql_role", "user");
        let b = ConstructAddress::new("postgresql_grant", "grant");
        let managed = vec![&a, &b];
        let imports: ImportMap = [(a.clone(), "role-1".to_string())].into_iter().collect();

        let err = check_import_coverage(&managed, &imports).unwrap_err();
        let CloudError::IncompleteImportMapping { missing } = err else {
            panic!("expected IncompleteImportMapping");
        };
        assert_eq!(missing, vec!["postgresql_grant.grant".to_string()]);
    }
}
