//! Mutation batch construction
//!
//! Row-level operations are translated into the uniform `mutateTables`
//! envelope. All three kinds share one endpoint and are told apart by the
//! `kind` tag on each item.

use super::columns::ColumnMap;
use super::error::{GlideError, Result};
use super::values::{Row, UNDEFINED_CELL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column-ID-keyed values, always stringified
pub type ColumnValues = BTreeMap<String, String>;

/// Which mutation to build for a list of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Update,
    Delete,
}

impl MutationKind {
    /// Verb used in log messages
    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Add => "Adding",
            MutationKind::Update => "Editing",
            MutationKind::Delete => "Deleting",
        }
    }
}

/// One entry of a mutation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MutationItem {
    #[serde(rename = "add-row-to-table", rename_all = "camelCase")]
    Add {
        table_name: String,
        column_values: ColumnValues,
    },

    #[serde(rename = "set-columns-in-row", rename_all = "camelCase")]
    SetColumns {
        table_name: String,
        column_values: ColumnValues,
        #[serde(rename = "rowID")]
        row_id: String,
    },

    #[serde(rename = "delete-row", rename_all = "camelCase")]
    Delete {
        table_name: String,
        #[serde(rename = "rowID")]
        row_id: String,
    },
}

/// Request body for the `mutateTables` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationBatch {
    #[serde(rename = "appID")]
    pub app_id: String,
    pub mutations: Vec<MutationItem>,
}

/// Map a row's values onto column IDs
///
/// The column map decides which columns are sent: row columns without an ID
/// are dropped, and mapped columns the row lacks are sent as `"undefined"`.
pub fn column_values(row: &Row, column_map: &ColumnMap) -> ColumnValues {
    column_map
        .iter()
        .map(|(id, name)| {
            let value = row
                .get(name)
                .map(|v| v.to_wire_string())
                .unwrap_or_else(|| UNDEFINED_CELL.to_string());
            (id.to_string(), value)
        })
        .collect()
}

fn required_row_id(row: &Row, index: usize) -> Result<String> {
    row.identity()
        .map(str::to_string)
        .ok_or(GlideError::MissingRowId { index })
}

/// Build one mutation item per row, in row order
///
/// Any update or delete row without a row ID fails the whole batch.
pub fn build_mutations(
    rows: &[Row],
    column_map: &ColumnMap,
    table_name: &str,
    kind: MutationKind,
) -> Result<Vec<MutationItem>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| -> Result<MutationItem> {
            let item = match kind {
                MutationKind::Add => MutationItem::Add {
                    table_name: table_name.to_string(),
                    column_values: column_values(row, column_map),
                },
                MutationKind::Update => MutationItem::SetColumns {
                    table_name: table_name.to_string(),
                    row_id: required_row_id(row, index)?,
                    column_values: column_values(row, column_map),
                },
                MutationKind::Delete => MutationItem::Delete {
                    table_name: table_name.to_string(),
                    row_id: required_row_id(row, index)?,
                },
            };
            Ok(item)
        })
        .collect()
}
