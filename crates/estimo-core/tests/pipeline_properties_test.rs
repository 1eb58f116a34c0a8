use std::sync::Arc;

use estimo_calculator::built_in::price_markup::{base_round, charm_price};
use estimo_calculator::{
    CalculationResult, CalculatorDescriptor, CalculatorError, CalculatorPlugin,
    CalculatorRegistry, StageOptions, StageOutcome,
};
use estimo_core::{BatchItem, PipelineExecutor, PipelineStage, StageErrorKind, validate_order};
use estimo_types::{PipelineContext, PriceComponent};
use proptest::prelude::*;

/// Adds `COST` to the running total, or fails when `FAIL` is set.
struct Adder {
    descriptor: CalculatorDescriptor,
}

impl Adder {
    fn new(code: &str) -> Self {
        Self { descriptor: CalculatorDescriptor::new(code, code, "general").first_eligible() }
    }
}

impl CalculatorPlugin for Adder {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn compute(&self, _: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult {
        if options.get_bool("FAIL") {
            return Err(CalculatorError::rule_violation("requested failure"));
        }
        let cost = options.get_f64("COST")?;
        Ok(StageOutcome::component(PriceComponent::new(self.code(), cost)))
    }
}

fn adder_executor() -> PipelineExecutor {
    let mut registry = CalculatorRegistry::new();
    for code in ["a", "b", "c"] {
        registry.register(Box::new(Adder::new(code)));
    }
    PipelineExecutor::new(Arc::new(registry))
}

fn stage_strategy() -> impl Strategy<Value = PipelineStage> {
    (prop::sample::select(vec!["a", "b", "c"]), 0u32..10_000, prop::bool::weighted(0.2)).prop_map(
        |(code, cost, fail)| {
            PipelineStage::new(code).with_option("COST", f64::from(cost)).with_option("FAIL", fail)
        },
    )
}

const BUILT_IN_CODES: [&str; 5] = ["dimensions", "digital_print", "lamination", "price_markup", "x"];

proptest! {
    #[test]
    fn total_equals_sum_of_components(sequence in prop::collection::vec(stage_strategy(), 0..12)) {
        let result = adder_executor().run("item", &sequence);

        let sum: f64 = result.price_components.iter().map(|c| c.cost).sum();
        prop_assert_eq!(result.total_cost, sum);
    }

    #[test]
    fn failed_stages_contribute_nothing(sequence in prop::collection::vec(stage_strategy(), 0..12)) {
        let result = adder_executor().run("item", &sequence);

        let failed = sequence.iter().filter(|s| s.options["FAIL"].is_truthy()).count();
        prop_assert_eq!(result.errors.len(), failed);
        prop_assert_eq!(result.price_components.len(), sequence.len() - failed);
        for err in &result.errors {
            prop_assert_eq!(err.kind, StageErrorKind::StageExecution);
        }
    }

    #[test]
    fn accepted_sequences_satisfy_position_constraints(
        codes in prop::collection::vec(prop::sample::select(BUILT_IN_CODES.to_vec()), 0..6)
    ) {
        let registry = CalculatorRegistry::with_built_ins();
        let accepted = validate_order(&registry, &codes).is_ok();

        let mut expected = true;
        for (i, code) in codes.iter().enumerate() {
            let Some(descriptor) = registry.descriptor(code) else { continue };
            if i == 0 && !descriptor.can_be_first {
                expected = false;
            }
            if descriptor.requires_before.iter().any(|r| !codes[..i].contains(&r.as_str())) {
                expected = false;
            }
        }
        prop_assert_eq!(accepted, expected);
    }

    #[test]
    fn rejected_sequences_produce_no_components(
        codes in prop::collection::vec(prop::sample::select(BUILT_IN_CODES.to_vec()), 1..6)
    ) {
        let registry = Arc::new(CalculatorRegistry::with_built_ins());
        prop_assume!(validate_order(&registry, &codes).is_err());

        let sequence: Vec<_> = codes.iter().map(|c| PipelineStage::new(*c)).collect();
        let result = PipelineExecutor::new(registry).run("item", &sequence);

        prop_assert!(result.price_components.is_empty());
        prop_assert_eq!(result.errors.len(), 1);
        prop_assert_eq!(result.errors[0].kind, StageErrorKind::Ordering);
    }

    #[test]
    fn batch_items_are_independent(
        sequence in prop::collection::vec(stage_strategy(), 0..8),
        item_count in 1usize..16
    ) {
        let executor = adder_executor();
        let items: Vec<_> = (0..item_count).map(|i| BatchItem::new(format!("item-{i}"))).collect();

        let batch = executor.run_batch(&items, &sequence);

        prop_assert_eq!(batch.len(), item_count);
        for (item, result) in items.iter().zip(&batch) {
            let single = executor.run(&item.target_id, &sequence);
            prop_assert_eq!(&result.target_id, &item.target_id);
            prop_assert_eq!(&result.price_components, &single.price_components);
            prop_assert_eq!(result.total_cost, single.total_cost);
        }
    }

    #[test]
    fn base_round_is_a_multiple_of_ten_not_below_input(raw in 0.0..1_000_000.0f64) {
        let rounded = base_round(raw);
        prop_assert!(rounded >= raw);
        prop_assert!(rounded - raw < 10.0);
        prop_assert_eq!(rounded % 10.0, 0.0);
    }

    #[test]
    fn charm_prices_end_in_ninety(tens in 10u64..100_000) {
        let price = (tens * 10) as f64;
        let charmed = charm_price(price);
        prop_assert_eq!((charmed as u64) % 100, 90);
        prop_assert!(charmed >= price - 10.0);
    }
}

#[test]
fn registering_built_ins_twice_is_a_no_op() {
    let mut registry = CalculatorRegistry::with_built_ins();
    let before = registry.len();
    registry.register_all();
    assert_eq!(registry.len(), before);
}
