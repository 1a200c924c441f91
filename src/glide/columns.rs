//! Column ID / column name translation
//!
//! The mutation wire format is keyed by opaque column IDs, while callers work
//! with human-readable column names. A [`ColumnMap`] is the caller-supplied
//! ID → name map for one table.

use super::error::{GlideError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Mapping from column ID to column name for a single table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap(BTreeMap<String, String>);

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of an `id → name` entry
    pub fn with(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.0.insert(id.into(), name.into());
        self
    }

    /// Iterate `(column_id, column_name)` pairs in column ID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Column names that appear under more than one ID
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for name in self.0.values() {
            *counts.entry(name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name)
            .collect()
    }

    /// Resolve a column name to its ID, treating an unknown name as a
    /// configuration error
    pub fn resolve(&self, name: &str) -> Result<&str> {
        id_for_name(self, name).ok_or_else(|| {
            GlideError::Config(format!("No column ID found for column name '{}'", name))
        })
    }

    /// Sub-map containing only the given column names
    ///
    /// Fails on the first name that has no column ID.
    pub fn restrict<S: AsRef<str>>(&self, names: &[S]) -> Result<ColumnMap> {
        let mut restricted = ColumnMap::new();
        for name in names {
            let name = name.as_ref();
            let id = self.resolve(name)?;
            restricted.0.insert(id.to_string(), name.to_string());
        }
        Ok(restricted)
    }
}

impl FromIterator<(String, String)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ColumnMap(iter.into_iter().collect())
    }
}

/// Look up the column ID for a column name
///
/// The reverse map is rebuilt on every call. If two IDs share a name, the ID
/// that sorts last wins and a warning is logged.
pub fn id_for_name<'a>(column_map: &'a ColumnMap, name: &str) -> Option<&'a str> {
    let mut name_to_id: HashMap<&str, &str> = HashMap::with_capacity(column_map.len());
    for (id, column_name) in column_map.iter() {
        if let Some(previous) = name_to_id.insert(column_name, id) {
            warn!(
                "Column name '{}' is mapped by both '{}' and '{}'; using '{}'",
                column_name, previous, id, id
            );
        }
    }
    name_to_id.get(name).copied()
}
