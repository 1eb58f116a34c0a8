use crate::descriptor::CalculatorDescriptor;
use crate::error::CalculatorError;
use estimo_types::{Measurements, OptionValue, PipelineContext, PriceComponent};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub type CalculationResult = Result<StageOutcome, CalculatorError>;

/// A trait for calculator plugins.
/// Calculators are stateless and thread-safe; one instance serves every run.
pub trait CalculatorPlugin: Send + Sync {
    /// Static metadata of the calculator.
    fn descriptor(&self) -> &CalculatorDescriptor;

    /// Stable code of the calculator.
    fn code(&self) -> &str {
        &self.descriptor().code
    }

    /// Computes the stage against the running context.
    ///
    /// The context is read-only here; whatever the stage wants to change is
    /// returned in the [`StageOutcome`] and applied by the executor only when
    /// the stage succeeds.
    fn compute(&self, context: &PipelineContext, options: &StageOptions<'_>) -> CalculationResult;
}

/// What a successful stage hands back to the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutcome {
    pub component: Option<PriceComponent>,
    pub measurements: Option<Measurements>,
}

impl StageOutcome {
    /// The stage succeeded without contributing anything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn component(component: PriceComponent) -> Self {
        Self { component: Some(component), measurements: None }
    }

    pub fn measurements(measurements: Measurements) -> Self {
        Self { component: None, measurements: Some(measurements) }
    }
}

/// Provides typed access to a stage's normalized options.
#[derive(Debug, Clone, Copy)]
pub struct StageOptions<'a> {
    values: &'a HashMap<String, OptionValue>,
}

impl<'a> StageOptions<'a> {
    pub fn new(values: &'a HashMap<String, OptionValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&'a OptionValue> {
        self.values.get(name)
    }

    /// Gets a number. Numeric strings are accepted.
    pub fn get_f64(&self, name: &str) -> Result<f64, CalculatorError> {
        match self.values.get(name) {
            Some(OptionValue::Null) | None => Err(CalculatorError::missing_field(name)),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| CalculatorError::invalid_type(name, "a number", value.type_name())),
        }
    }

    /// Gets a boolean using the canonical truthy coercion. Missing means `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(OptionValue::is_truthy)
    }

    pub fn get_str(&self, name: &str) -> Result<&'a str, CalculatorError> {
        match self.values.get(name) {
            Some(OptionValue::String(s)) => Ok(s),
            Some(OptionValue::Null) | None => Err(CalculatorError::missing_field(name)),
            Some(other) => Err(CalculatorError::invalid_type(name, "a string", other.type_name())),
        }
    }

    /// Deserializes a structured option. A string value is parsed as JSON,
    /// a missing or null value yields `T::default()`.
    pub fn deserialize<T>(&self, name: &str) -> Result<T, CalculatorError>
    where
        T: DeserializeOwned + Default,
    {
        match self.values.get(name) {
            Some(OptionValue::Null) | None => Ok(T::default()),
            Some(OptionValue::String(raw)) if raw.trim().is_empty() => Ok(T::default()),
            Some(OptionValue::String(raw)) => {
                serde_json::from_str(raw).map_err(|e| CalculatorError::invalid_value(name, e))
            }
            Some(value) => value.deserialize_into().map_err(|e| CalculatorError::invalid_value(name, e)),
        }
    }
}
