//! service-core: shared infrastructure for the ashram booking backend.
pub mod error;
pub mod middleware;
