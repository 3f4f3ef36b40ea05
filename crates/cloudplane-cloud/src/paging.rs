//! Shared filter and paging semantics for live queries
//!
//! Every resource service goes through these helpers so that one filter
//! semantics exists everywhere — `get` is defined as `list` with an id
//! filter, and that only works if all services filter the same way.

use crate::service::OutputMap;
use serde::{Deserialize, Serialize};

/// Filter options for `list`. Matching is substring on both fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ListFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    /// Whether a row with the given id/name matches this filter.
    pub fn matches(&self, id: &str, name: &str) -> bool {
        if let Some(want) = &self.id {
            if !id.contains(want.as_str()) {
                return false;
            }
        }
        if let Some(want) = &self.name {
            if !name.contains(want.as_str()) {
                return false;
            }
        }
        true
    }

    /// Match a normalized output row on its `id`/`name` keys.
    pub fn matches_row(&self, row: &OutputMap) -> bool {
        let id = row.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        let name = row.get("name").and_then(|v| v.as_str()).unwrap_or(id);
        self.matches(id, name)
    }
}

/// Offset/limit paging for `list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub offset: usize,

    /// No limit means all matching rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Paging {
    pub fn first() -> Self {
        Self {
            offset: 0,
            limit: Some(1),
        }
    }
}

/// A page of list results.
///
/// `total` is the full matching count, independent of the page window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagedRows {
    pub total: usize,
    pub rows: Vec<OutputMap>,
}

impl PagedRows {
    /// Apply filter + paging to a fully materialized row set.
    ///
    /// Services that fetch everything from the vendor API funnel through
    /// here so `total` always reflects the complete match count.
    pub fn paginate(rows: Vec<OutputMap>, filter: &ListFilter, paging: &Paging) -> Self {
        let matching: Vec<OutputMap> = rows
            .into_iter()
            .filter(|row| filter.matches_row(row))
            .collect();
        let total = matching.len();

        let rows = match paging.limit {
            Some(limit) => matching.into_iter().skip(paging.offset).take(limit).collect(),
            None => matching.into_iter().skip(paging.offset).collect(),
        };

        Self { total, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, name: &str) -> OutputMap {
        [
            ("id".to_string(), json!(id)),
            ("name".to_string(), json!(name)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn substring_filter_on_id() {
        let filter = ListFilter::by_id("db");
        assert!(filter.matches("prod-db-1", "anything"));
        assert!(!filter.matches("cache", "anything"));
    }

    #[test]
    fn total_reflects_full_match_count() {
        let rows = vec![row("x-1", "a"), row("x-2", "b"), row("y-1", "c")];
        let page = PagedRows::paginate(
            rows,
            &ListFilter::by_id("x"),
            &Paging {
                offset: 0,
                limit: Some(1),
            },
        );
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
    }

    #[test]
    fn offset_skips_rows() {
        let rows = vec![row("a", "a"), row("b", "b"), row("c", "c")];
        let page = PagedRows::paginate(
            rows,
            &ListFilter::default(),
            &Paging {
                offset: 2,
                limit: None,
            },
        );
        assert_eq!(page.total, 3);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["id"], "c");
    }

    #[test]
    fn rows_without_name_fall_back_to_id() {
        let mut only_id = OutputMap::new();
        only_id.insert("id".to_string(), json!("solo"));
        let page = PagedRows::paginate(
            vec![only_id],
            &ListFilter {
                id: None,
                name: Some("sol".to_string()),
            },
            &Paging::default(),
        );
        assert_eq!(page.total, 1);
    }
}
