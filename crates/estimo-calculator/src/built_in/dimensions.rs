//! Normalizes the target item's catalog dimensions to millimetres and grams.
//!
//! Every cost calculator that depends on the item's size requires this stage
//! earlier in the chain; the registry lists it first.

use estimo_types::{Measurements, PipelineContext};

use crate::descriptor::{CalculatorDescriptor, OptionSpec};
use crate::error::CalculatorError;
use crate::plugin::{CalculationResult, CalculatorPlugin, StageOptions, StageOutcome};

pub const CODE: &str = "dimensions";

/// Converts width/length/height into millimetres, optionally adding bleed.
///
/// # Options
/// * `BLEED_MM` - Bleed added to each edge of width and length
///
/// # Output
/// No price component; writes `Measurements` into the context.
#[derive(Debug)]
pub struct DimensionsCalculator {
    descriptor: CalculatorDescriptor,
}

impl Default for DimensionsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionsCalculator {
    pub fn new() -> Self {
        let descriptor = CalculatorDescriptor::new(CODE, "Dimensions and weight", "general")
            .first_eligible()
            .option(OptionSpec::number("BLEED_MM", "Bleed per edge, mm", 0.0).bounded(
                Some(0.0),
                None,
                Some(0.5),
            ));
        Self { descriptor }
    }
}

impl CalculatorPlugin for DimensionsCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn compute(&self, context: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult {
        let attributes = context
            .attributes
            .as_ref()
            .ok_or_else(|| CalculatorError::missing_context("item attributes"))?;

        let width = attributes.width.ok_or_else(|| CalculatorError::missing_context("item width"))?;
        let length =
            attributes.length.ok_or_else(|| CalculatorError::missing_context("item length"))?;
        if width <= 0.0 || length <= 0.0 {
            return Err(CalculatorError::rule_violation(format!(
                "item dimensions must be positive, got {width}x{length}"
            )));
        }

        let bleed = options.get_f64("BLEED_MM")?;
        let factor = attributes.length_unit.to_mm();
        let pieces_per_measure =
            if attributes.measure_ratio > 0.0 { attributes.measure_ratio } else { 1.0 };

        Ok(StageOutcome::measurements(Measurements {
            width_mm: width * factor + 2.0 * bleed,
            length_mm: length * factor + 2.0 * bleed,
            height_mm: attributes.height.unwrap_or(0.0) * factor,
            weight_g: attributes.weight.unwrap_or(0.0),
            pieces_per_measure,
        }))
    }
}
