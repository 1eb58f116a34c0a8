//! The calculator ecosystem for the Estimo pricing pipeline.
//!
//! This crate provides the [`CalculatorPlugin`] trait, the static
//! [`CalculatorDescriptor`] each plugin publishes, the [`CalculatorRegistry`]
//! the pipeline resolves stage codes against, and the built-in calculators.

pub mod built_in;
pub mod descriptor;
pub mod error;
pub mod plugin;
pub mod registry;

pub use descriptor::{CalculatorDescriptor, OptionSpec, OptionType};
pub use error::{CalculatorError, ErrorCode};
pub use plugin::{CalculationResult, CalculatorPlugin, StageOptions, StageOutcome};
pub use registry::{
    CalculatorConfig, CalculatorGroup, CalculatorRegistry, GroupInfo, PositionConstraints,
};
