//! Finalization calculator: turns the accumulated cost into sale prices per
//! price tier.
//!
//! For every configured range the raw price is
//! `total_cost * (1 + percent_markup / 100)`, rounded up to the next multiple
//! of ten. With marketing prices enabled, prices of 100 and above are further
//! rounded up to a multiple of their own magnitude and given a charm suffix
//! (`440 -> 490`, `1000 -> 990`).
//!
//! The stage reshapes pricing and never adds cost: its component's cost is `0`.

use std::collections::BTreeMap;

use estimo_types::{MarkupConfig, MarkupResult, PipelineContext, PriceComponent, PricedRange};
use tracing::debug;

use crate::descriptor::{CalculatorDescriptor, OptionSpec};
use crate::error::CalculatorError;
use crate::plugin::{CalculationResult, CalculatorPlugin, StageOptions, StageOutcome};

pub const CODE: &str = "price_markup";

/// Amount subtracted from a magnitude-rounded price.
pub const CHARM_SUFFIX: u64 = 10;

/// Prices below this are left at their base-rounded value.
pub const CHARM_THRESHOLD: f64 = 100.0;

#[derive(Debug)]
pub struct PriceMarkupCalculator {
    descriptor: CalculatorDescriptor,
}

impl Default for PriceMarkupCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceMarkupCalculator {
    pub fn new() -> Self {
        let descriptor = CalculatorDescriptor::new(CODE, "Price markup", "pricing")
            .changes_price()
            .finalizer()
            .option(OptionSpec::markup_ranges("PRICE_MARKUPS", "Markups by price type"))
            .option(OptionSpec::boolean("MARKETING_PRICE", "Marketing (charm) prices", false));
        Self { descriptor }
    }
}

impl CalculatorPlugin for PriceMarkupCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn compute(&self, context: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult {
        if !context.is_last_step() {
            return Err(CalculatorError::not_terminal(CODE));
        }

        let configs: Vec<MarkupConfig> = options.deserialize("PRICE_MARKUPS")?;
        let marketing = options.get_bool("MARKETING_PRICE");
        let base_cost = context.total_cost();

        let prices = tier_prices(base_cost, &configs, marketing);
        debug!(
            target_id = context.target_id(),
            base_cost,
            tiers = prices.len(),
            marketing,
            "Resolved tier prices"
        );

        let component = PriceComponent::new("Price markup", 0.0)
            .with_meta("baseCost", base_cost)
            .with_meta("marketingPrice", marketing)
            .with_prices(prices);
        Ok(StageOutcome::component(component))
    }
}

/// Resolve every tier's ranges against `total_cost`.
///
/// Entries without a tier id are skipped entirely and ranges without a
/// markup are skipped silently, so a tier may publish fewer ranges than it
/// configures. A tier id configured twice keeps its last entry.
pub fn tier_prices(
    total_cost: f64,
    configs: &[MarkupConfig],
    marketing: bool,
) -> BTreeMap<String, MarkupResult> {
    let mut prices = BTreeMap::new();
    for config in configs {
        let Some(tier_id) = config.price_tier_id.as_ref() else {
            continue;
        };
        let ranges = config
            .ranges
            .iter()
            .filter_map(|range| {
                range.percent_markup.map(|percent| PricedRange {
                    from: range.from,
                    to: range.to,
                    price: markup_price(total_cost, percent, marketing),
                })
            })
            .collect();
        prices.insert(tier_id.clone(), MarkupResult { range_mode: config.range_mode, ranges });
    }
    prices
}

/// Sale price for one range.
pub fn markup_price(total_cost: f64, percent_markup: f64, marketing: bool) -> f64 {
    let price = base_round(total_cost * (1.0 + percent_markup / 100.0));
    if marketing { charm_price(price) } else { price }
}

/// Round up to the next multiple of 10, never below `raw`.
///
/// A few ulps of slack absorb float noise such as
/// `100.0 * 1.1 == 110.00000000000001`.
pub fn base_round(raw: f64) -> f64 {
    let noise = raw.abs() * 4.0 * f64::EPSILON;
    ((raw - noise) / 10.0).ceil() * 10.0
}

/// Round up to a multiple of the price's own magnitude and subtract the charm
/// suffix. Prices under [`CHARM_THRESHOLD`], non-finite or non-positive prices
/// are returned unchanged, as are prices whose rounded value does not fit a
/// `u64`.
pub fn charm_price(price: f64) -> f64 {
    if !price.is_finite() || price < CHARM_THRESHOLD || price >= u64::MAX as f64 {
        return price;
    }
    let whole = price.ceil() as u64;
    let mut magnitude = 1u64;
    while magnitude <= whole / 10 {
        magnitude *= 10;
    }
    whole
        .div_ceil(magnitude)
        .checked_mul(magnitude)
        .and_then(|rounded| rounded.checked_sub(CHARM_SUFFIX))
        .map_or(price, |charmed| charmed as f64)
}
