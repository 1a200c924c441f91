//! Scalar cell values and row records
//!
//! Rows coming from callers are dynamically typed. At the boundary they are
//! narrowed to [`CellValue`], and every value is turned into a string with
//! [`CellValue::to_wire_string`] before it is put on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// Wire text used for a mapped column that the row does not carry
pub const UNDEFINED_CELL: &str = "undefined";

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(Number),
    String(String),
}

impl CellValue {
    /// Convert to the string form sent in `columnValues`
    ///
    /// Integral numbers are printed without a fractional part (`2.0` → `"2"`);
    /// magnitudes below `1e-6` or from `1e21` up use exponent form
    /// (`1e-7`, `1e+21`), the same as JavaScript's `String(number)`.
    pub fn to_wire_string(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => number_to_wire_string(n),
        }
    }
}

fn number_to_wire_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() >= 1e21 || f.abs() < 1e-6 => exponent_form(f),
        Some(f) if f.fract() == 0.0 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Shortest exponent form with an explicit sign on the exponent (`1.5e+21`)
fn exponent_form(f: f64) -> String {
    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => CellValue::Number(n),
            None if value.is_nan() => CellValue::String("NaN".to_string()),
            None if value > 0.0 => CellValue::String("Infinity".to_string()),
            None => CellValue::String("-Infinity".to_string()),
        }
    }
}

/// A table row keyed by human-readable column name
///
/// `row_id` is the store-assigned identity (`$rowID` on the wire). It is
/// required for updates and deletes and absent for inserts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "$rowID", default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,

    #[serde(flatten)]
    pub values: BTreeMap<String, CellValue>,
}

impl Row {
    /// Create an empty row with no identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row targeting an existing row ID
    pub fn with_id(row_id: impl Into<String>) -> Self {
        Row {
            row_id: Some(row_id.into()),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a column value
    pub fn set(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Row ID if present and non-empty
    pub fn identity(&self) -> Option<&str> {
        self.row_id.as_deref().filter(|id| !id.is_empty())
    }
}
