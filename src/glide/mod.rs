//! Glide tables API client module
//!
//! Structure:
//! - `client.rs`: `GlideClient` construction and batched writes
//! - `pagination.rs`: paginated table reads
//! - `mutations.rs`: mutation items and batch construction
//! - `columns.rs`: column ID / name mapping
//! - `values.rs`: scalar cell values and rows
//! - `transport.rs`: authenticated JSON transport
//! - `stash.rs`: stash-based bulk table API
//! - `error.rs`: Error types

pub mod client;
pub mod columns;
pub mod error;
pub mod mutations;
pub mod pagination;
pub mod stash;
pub mod transport;
pub mod values;

// Re-exports for convenience
pub use client::GlideClient;
pub use columns::{id_for_name, ColumnMap};
pub use error::{GlideError, Result};
pub use mutations::{build_mutations, MutationBatch, MutationItem, MutationKind};
pub use pagination::{QueryPage, QueryRequest, TableQuery};
pub use stash::{ColumnKind, StashClient, TableColumn};
pub use transport::{Endpoint, HttpTransport, Transport};
pub use values::{CellValue, Row};
