//! Pure client-side logic for the Renku platform: the search filter
//! model with its URL query-string codec, and the dataset-import job
//! model (states, status text, version gate, polling budget).
//!
//! This crate has zero I/O and zero async. The HTTP plumbing that
//! drives imports lives in `renku-import`.

pub mod dates;
pub mod import;
pub mod query;
pub mod search;
