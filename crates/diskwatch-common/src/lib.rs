//! Shared data model for diskwatch.
//!
//! The types here cross crate boundaries: [`types::DiskSnapshot`] flows from
//! the sampler to the HTTP view layer, and [`types::Sample`] is the unit the
//! storage layer persists.

pub mod types;
