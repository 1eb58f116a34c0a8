#![allow(missing_docs)]
//! Pipeline engine for the Estimo pricing system.
//!
//! Validates a proposed stage sequence against the calculators' position
//! constraints, runs it stage by stage over a per-item context and hands the
//! accumulated result to the catalog collaborators.

/// Catalog reader, writer and price tier traits plus an in-memory backend
pub mod catalog;
/// Error types for ordering, execution and catalog access
pub mod error;
/// Stage-by-stage execution of a sequence
pub mod executor;
/// Option defaults and coercion
pub mod normalize;
/// Position constraint validation
pub mod ordering;
/// Stage, batch item and result types
pub mod types;

pub use catalog::{
    CatalogItem, CatalogReader, CatalogWrite, CatalogWriter, InMemoryCatalog, PipelineSnapshot,
    PriceRow, PriceTier, PriceTierDirectory, build_catalog_write,
};
pub use error::{
    CatalogError, CatalogResult, OrderingError, PipelineError, StageErrorKind, StageErrorRecord,
};
pub use executor::PipelineExecutor;
pub use normalize::normalize_options;
pub use ordering::validate_order;
pub use types::{BatchItem, PipelineResult, PipelineStage};
