//! Sequential stage execution over a shared pipeline context.
//!
//! A sequence is validated once before anything runs. Each stage then walks
//! Resolved -> Normalized -> Executed and either commits its outcome to the
//! context or is recorded as failed; a failed stage never leaves partial
//! changes behind and never stops the stages after it.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use estimo_calculator::{CalculatorRegistry, StageOptions, StageOutcome};
use estimo_types::PipelineContext;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, StageErrorRecord};
use crate::normalize::normalize_options;
use crate::ordering::validate_order;
use crate::types::{BatchItem, PipelineResult, PipelineStage};

/// Runs stage sequences against a shared, read-only calculator registry.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    registry: Arc<CalculatorRegistry>,
}

impl PipelineExecutor {
    pub fn new(registry: Arc<CalculatorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CalculatorRegistry {
        &self.registry
    }

    /// Run `sequence` for a target with no catalog attributes.
    pub fn run(&self, target_id: &str, sequence: &[PipelineStage]) -> PipelineResult {
        self.run_with_context(PipelineContext::new(target_id), sequence)
    }

    /// Run `sequence` starting from a caller-prepared context.
    #[instrument(skip(self, context, sequence), fields(target_id = context.target_id(), stages = sequence.len()))]
    pub fn run_with_context(
        &self,
        mut context: PipelineContext,
        sequence: &[PipelineStage],
    ) -> PipelineResult {
        let codes: Vec<&str> = sequence.iter().map(|s| s.stage_code.as_str()).collect();
        if let Err(err) = validate_order(&self.registry, &codes) {
            warn!(error = %err, "Rejecting stage sequence");
            return PipelineResult::rejected(context.target_id(), err);
        }

        let mut errors = Vec::new();
        let last = sequence.len().saturating_sub(1);
        for (position, stage) in sequence.iter().enumerate() {
            if let Err(err) = self.execute_stage(&mut context, stage, position == last) {
                warn!(stage = stage.stage_code.as_str(), position, error = %err, "Stage failed");
                errors.push(StageErrorRecord::from(&err));
            }
        }

        info!(
            total_cost = context.total_cost(),
            components = context.price_components().len(),
            failed = errors.len(),
            "Pipeline completed"
        );
        PipelineResult::completed(context, errors)
    }

    /// Run the same sequence for many items. Each item gets its own context
    /// and results come back in input order.
    #[instrument(skip(self, items, sequence), fields(items = items.len(), stages = sequence.len()))]
    pub fn run_batch(&self, items: &[BatchItem], sequence: &[PipelineStage]) -> Vec<PipelineResult> {
        items
            .par_iter()
            .map(|item| {
                let context =
                    PipelineContext::new(&item.target_id).with_attributes(item.attributes.clone());
                self.run_with_context(context, sequence)
            })
            .collect()
    }

    fn execute_stage(
        &self,
        context: &mut PipelineContext,
        stage: &PipelineStage,
        is_last: bool,
    ) -> Result<(), PipelineError> {
        let code = stage.stage_code.as_str();
        let plugin = self
            .registry
            .get_by_code(code)
            .ok_or_else(|| PipelineError::UnknownStage { code: code.to_string() })?;

        let options = normalize_options(&plugin.descriptor().options_spec, &stage.options);
        debug!(stage = code, "Stage options normalized");

        context.set_last_step(is_last);
        let computed = catch_unwind(AssertUnwindSafe(|| {
            plugin.compute(context, &StageOptions::new(&options))
        }));
        context.set_last_step(false);

        let outcome = computed
            .map_err(|payload| stage_failure(code, panic_message(payload.as_ref())))?
            .map_err(|err| stage_failure(code, err.to_string()))?;

        apply_outcome(context, code, outcome)?;
        debug!(stage = code, total_cost = context.total_cost(), "Stage committed");
        Ok(())
    }
}

/// Commit a stage's outcome in one step, after checking it.
fn apply_outcome(
    context: &mut PipelineContext,
    code: &str,
    outcome: StageOutcome,
) -> Result<(), PipelineError> {
    if let Some(component) = &outcome.component {
        if !component.cost.is_finite() || component.cost < 0.0 {
            return Err(stage_failure(code, format!("invalid component cost {}", component.cost)));
        }
    }

    if let Some(measurements) = outcome.measurements {
        context.measurements = Some(measurements);
    }
    if let Some(mut component) = outcome.component {
        component.stage_code = code.to_string();
        context.commit(component);
    }
    Ok(())
}

fn stage_failure(code: &str, message: String) -> PipelineError {
    PipelineError::StageExecution { code: code.to_string(), message }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("calculator panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("calculator panicked: {msg}")
    } else {
        "calculator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageErrorKind;
    use estimo_calculator::{
        CalculationResult, CalculatorDescriptor, CalculatorError, CalculatorPlugin,
    };
    use estimo_types::PriceComponent;

    struct Fixed {
        descriptor: CalculatorDescriptor,
        cost: f64,
    }

    impl Fixed {
        fn new(code: &str, cost: f64) -> Self {
            Self {
                descriptor: CalculatorDescriptor::new(code, code, "general").first_eligible(),
                cost,
            }
        }
    }

    impl CalculatorPlugin for Fixed {
        fn descriptor(&self) -> &CalculatorDescriptor {
            &self.descriptor
        }

        fn compute(&self, _: &PipelineContext, _: &StageOptions<'_>) -> CalculationResult {
            Ok(StageOutcome::component(PriceComponent::new(&self.descriptor.code, self.cost)))
        }
    }

    struct Failing(CalculatorDescriptor);

    impl CalculatorPlugin for Failing {
        fn descriptor(&self) -> &CalculatorDescriptor {
            &self.0
        }

        fn compute(&self, _: &PipelineContext, _: &StageOptions<'_>) -> CalculationResult {
            Err(CalculatorError::rule_violation("out of stock"))
        }
    }

    struct Panicking(CalculatorDescriptor);

    impl CalculatorPlugin for Panicking {
        fn descriptor(&self) -> &CalculatorDescriptor {
            &self.0
        }

        fn compute(&self, _: &PipelineContext, _: &StageOptions<'_>) -> CalculationResult {
            panic!("boom")
        }
    }

    fn executor() -> PipelineExecutor {
        let mut registry = CalculatorRegistry::new();
        registry.register(Box::new(Fixed::new("a", 10.0)));
        registry.register(Box::new(Fixed::new("b", 32.5)));
        registry.register(Box::new(Fixed::new("negative", -1.0)));
        registry.register(Box::new(Failing(
            CalculatorDescriptor::new("failing", "Failing", "general").first_eligible(),
        )));
        registry.register(Box::new(Panicking(
            CalculatorDescriptor::new("panicking", "Panicking", "general").first_eligible(),
        )));
        PipelineExecutor::new(Arc::new(registry))
    }

    fn seq(codes: &[&str]) -> Vec<PipelineStage> {
        codes.iter().map(|c| PipelineStage::new(*c)).collect()
    }

    #[test]
    fn accumulates_components_in_order() {
        let result = executor().run("42", &seq(&["a", "b"]));

        assert!(result.is_success());
        assert_eq!(result.total_cost, 42.5);
        let codes: Vec<_> = result.price_components.iter().map(|c| c.stage_code.as_str()).collect();
        assert_eq!(codes, ["a", "b"]);
    }

    #[test]
    fn failed_stage_does_not_stop_the_rest() {
        let result = executor().run("42", &seq(&["a", "failing", "b"]));

        assert_eq!(result.total_cost, 42.5);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, StageErrorKind::StageExecution);
        assert_eq!(result.errors[0].stage_code.as_deref(), Some("failing"));
        assert!(result.errors[0].message.contains("out of stock"));
    }

    #[test]
    fn panic_is_contained_to_its_stage() {
        let result = executor().run("42", &seq(&["panicking", "a"]));

        assert_eq!(result.total_cost, 10.0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("boom"));
    }

    #[test]
    fn unknown_stage_is_reported_and_skipped() {
        let result = executor().run("42", &seq(&["a", "nope", "b"]));

        assert_eq!(result.price_components.len(), 2);
        assert_eq!(result.errors[0].kind, StageErrorKind::UnknownStage);
        assert_eq!(result.errors[0].stage_code.as_deref(), Some("nope"));
    }

    #[test]
    fn negative_cost_is_rejected() {
        let result = executor().run("42", &seq(&["a", "negative"]));

        assert_eq!(result.total_cost, 10.0);
        assert_eq!(result.price_components.len(), 1);
        assert_eq!(result.errors[0].stage_code.as_deref(), Some("negative"));
    }

    #[test]
    fn empty_sequence_yields_empty_result() {
        let result = executor().run("42", &[]);

        assert!(result.is_success());
        assert_eq!(result.total_cost, 0.0);
        assert!(result.price_components.is_empty());
    }
}
