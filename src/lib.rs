//! Glide Tables Library
//!
//! Batched row mutations and paginated table queries against the Glide
//! tables API. The `glide_tables` binary is a thin command-line front end.

pub mod config;
pub mod glide;
