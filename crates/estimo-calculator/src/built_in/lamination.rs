use estimo_types::{PipelineContext, PriceComponent};

use crate::descriptor::{CalculatorDescriptor, OptionSpec};
use crate::error::CalculatorError;
use crate::plugin::{CalculationResult, CalculatorPlugin, StageOptions, StageOutcome};

pub const CODE: &str = "lamination";

/// Film lamination priced by laminated area:
/// `cost = area_m2 * pieces * PRICE_PER_SQM * sides`.
#[derive(Debug)]
pub struct LaminationCalculator {
    descriptor: CalculatorDescriptor,
}

impl Default for LaminationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl LaminationCalculator {
    pub fn new() -> Self {
        let descriptor = CalculatorDescriptor::new(CODE, "Lamination", "finishing")
            .changes_price()
            .requires(super::dimensions::CODE)
            .option(OptionSpec::number("QUANTITY", "Quantity", 1.0).bounded(Some(1.0), None, Some(1.0)))
            .option(OptionSpec::number("PRICE_PER_SQM", "Price per m²", 0.0).bounded(Some(0.0), None, None))
            .option(OptionSpec::boolean("BOTH_SIDES", "Laminate both sides", false))
            .option(OptionSpec::single_reference("FILM", "Film", "films"));
        Self { descriptor }
    }
}

impl CalculatorPlugin for LaminationCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn compute(&self, context: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult {
        let measurements = context
            .measurements
            .ok_or_else(|| CalculatorError::missing_context("measurements"))?;

        let quantity = options.get_f64("QUANTITY")?;
        let price_per_sqm = options.get_f64("PRICE_PER_SQM")?;
        let sides = if options.get_bool("BOTH_SIDES") { 2.0 } else { 1.0 };

        let area = measurements.area_m2() * quantity * measurements.pieces_per_measure;
        let cost = area * price_per_sqm * sides;

        let mut component = PriceComponent::new("Lamination", cost)
            .with_meta("areaM2", area)
            .with_meta("sides", sides as i64);
        if let Some(film) = options.get("FILM").filter(|f| !f.is_null()) {
            component = component.with_meta("film", film.clone());
        }
        Ok(StageOutcome::component(component))
    }
}
