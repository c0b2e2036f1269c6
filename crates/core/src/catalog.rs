//! Catalog (spreadsheet) row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One known article from the publisher catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRow {
    /// Raw article URL. `None` means the row has no url field at all,
    /// which is a schema error; `Some("")` is an ordinary missing value.
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<NaiveDate>,
    /// Any other spreadsheet columns, carried through unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl CatalogRow {
    /// Creates a catalog row with just a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published_at(mut self, date: NaiveDate) -> Self {
        self.published_at = Some(date);
        self
    }
}

/// Keeps the catalog rows that belong to `domain`.
///
/// A row matches when its URL contains the domain, case-insensitively.
/// Rows without a url field are kept so reconciliation can report them.
pub fn filter_catalog_by_domain(catalog: &[CatalogRow], domain: &str) -> Vec<CatalogRow> {
    let needle = domain.trim().to_lowercase();

    catalog
        .iter()
        .filter(|row| match &row.url {
            Some(url) => url.to_lowercase().contains(&needle),
            None => true,
        })
        .cloned()
        .collect()
}

/// Distinct, sorted author names in the catalog.
pub fn authors(catalog: &[CatalogRow]) -> Vec<String> {
    let mut names: Vec<String> = catalog
        .iter()
        .filter_map(|row| row.author.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Keeps rows written by any of `selected` authors. An empty selection keeps everything.
pub fn filter_by_authors(catalog: Vec<CatalogRow>, selected: &[String]) -> Vec<CatalogRow> {
    if selected.is_empty() {
        return catalog;
    }

    catalog
        .into_iter()
        .filter(|row| {
            row.author
                .as_deref()
                .map(|a| selected.iter().any(|s| s.trim() == a.trim()))
                .unwrap_or(false)
        })
        .collect()
}
