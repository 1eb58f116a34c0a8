//! Estimo Types
//!
//! This crate defines the data structures shared across the Estimo workspace
//! (`estimo-calculator`, `estimo-core` and `estimo-api`): option values, the
//! per-run pipeline context and the pricing shapes produced by calculators.

#![warn(missing_docs)]

mod context;
mod pricing;
mod value;

pub use context::{ItemAttributes, LengthUnit, Measurements, PipelineContext};
pub use pricing::{MarkupConfig, MarkupRange, MarkupResult, PriceComponent, PricedRange, RangeMode};
pub use value::OptionValue;
