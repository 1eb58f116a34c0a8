//! Digital print costing by sheet imposition.

use estimo_types::{PipelineContext, PriceComponent};

use crate::descriptor::{CalculatorDescriptor, OptionSpec};
use crate::error::CalculatorError;
use crate::plugin::{CalculationResult, CalculatorPlugin, StageOptions, StageOutcome};

pub const CODE: &str = "digital_print";

const COLOR_MODES: &[&str] = &["4+0", "4+4", "1+0", "1+1"];

/// Prices a run of digitally printed items.
///
/// The item is imposed on the press sheet in both orientations and the better
/// fit is used: `sheets = ceil(pieces / per_sheet)` and
/// `cost = sheets * PRICE_PER_SHEET * sides`.
#[derive(Debug)]
pub struct DigitalPrintCalculator {
    descriptor: CalculatorDescriptor,
}

impl Default for DigitalPrintCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalPrintCalculator {
    pub fn new() -> Self {
        let descriptor = CalculatorDescriptor::new(CODE, "Digital print", "printing")
            .changes_price()
            .requires(super::dimensions::CODE)
            .option(OptionSpec::number("QUANTITY", "Quantity", 1.0).bounded(Some(1.0), None, Some(1.0)))
            .option(OptionSpec::number("SHEET_WIDTH", "Sheet width, mm", 320.0).bounded(Some(1.0), None, None))
            .option(OptionSpec::number("SHEET_HEIGHT", "Sheet height, mm", 450.0).bounded(Some(1.0), None, None))
            .option(OptionSpec::number("PRICE_PER_SHEET", "Price per sheet side", 0.0).bounded(Some(0.0), None, None))
            .option(OptionSpec::enumerated("COLOR_MODE", "Colors", COLOR_MODES, "4+0"))
            .option(OptionSpec::single_reference("PAPER", "Paper", "papers"));
        Self { descriptor }
    }
}

/// Items of `w`x`h` that fit on a `sheet_w`x`sheet_h` sheet without rotation.
fn fit(sheet_w: f64, sheet_h: f64, w: f64, h: f64) -> u64 {
    if w <= 0.0 || h <= 0.0 {
        return 0;
    }
    ((sheet_w / w).floor() * (sheet_h / h).floor()) as u64
}

impl CalculatorPlugin for DigitalPrintCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn compute(&self, context: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult {
        let measurements = context
            .measurements
            .ok_or_else(|| CalculatorError::missing_context("measurements"))?;

        let quantity = options.get_f64("QUANTITY")?;
        let sheet_w = options.get_f64("SHEET_WIDTH")?;
        let sheet_h = options.get_f64("SHEET_HEIGHT")?;
        let price_per_sheet = options.get_f64("PRICE_PER_SHEET")?;
        let sides = match options.get_str("COLOR_MODE")? {
            "4+0" | "1+0" => 1.0,
            "4+4" | "1+1" => 2.0,
            other => {
                return Err(CalculatorError::invalid_value(
                    "COLOR_MODE",
                    format!("unknown color mode '{other}'"),
                ));
            }
        };

        let per_sheet = fit(sheet_w, sheet_h, measurements.width_mm, measurements.length_mm)
            .max(fit(sheet_w, sheet_h, measurements.length_mm, measurements.width_mm));
        if per_sheet == 0 {
            return Err(CalculatorError::rule_violation(format!(
                "a {}x{} mm item does not fit on a {sheet_w}x{sheet_h} mm sheet",
                measurements.width_mm, measurements.length_mm
            )));
        }

        let pieces = quantity * measurements.pieces_per_measure;
        let sheets = (pieces / per_sheet as f64).ceil();
        let cost = sheets * price_per_sheet * sides;

        let mut component = PriceComponent::new("Digital print", cost)
            .with_meta("perSheet", per_sheet as i64)
            .with_meta("sheets", sheets as i64)
            .with_meta("sides", sides as i64);
        if let Some(paper) = options.get("PAPER").filter(|p| !p.is_null()) {
            component = component.with_meta("paper", paper.clone());
        }
        Ok(StageOutcome::component(component))
    }
}
