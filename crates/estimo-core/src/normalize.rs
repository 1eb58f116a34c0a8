//! Option normalization against a calculator's declared option schema.
//!
//! Each declared option type has one normalization function; options the
//! schema does not declare pass through untouched.

use std::collections::HashMap;

use estimo_calculator::{OptionSpec, OptionType};
use estimo_types::OptionValue;

/// Fill defaults and coerce declared options to their canonical form.
pub fn normalize_options(
    spec: &[OptionSpec],
    input: &HashMap<String, OptionValue>,
) -> HashMap<String, OptionValue> {
    let mut normalized = input.clone();
    for option in spec {
        let value = match input.get(&option.code) {
            Some(value) if !is_absent(value) => normalize_value(&option.option_type, value),
            _ => option.default.clone(),
        };
        normalized.insert(option.code.clone(), value);
    }
    normalized
}

fn is_absent(value: &OptionValue) -> bool {
    match value {
        OptionValue::Null => true,
        OptionValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn normalize_value(option_type: &OptionType, value: &OptionValue) -> OptionValue {
    match option_type {
        OptionType::Boolean => normalize_boolean(value),
        OptionType::Number { min, max, .. } => normalize_number(value, *min, *max),
        OptionType::MultiReference { .. } => normalize_multi_reference(value),
        OptionType::SingleReference { .. }
        | OptionType::EnumeratedList { .. }
        | OptionType::MarkupRanges => value.clone(),
    }
}

fn normalize_boolean(value: &OptionValue) -> OptionValue {
    OptionValue::Boolean(value.is_truthy())
}

/// Numeric strings become numbers and values are clamped into `[min, max]`.
/// Anything that is not a number is left for the calculator to reject.
fn normalize_number(value: &OptionValue, min: Option<f64>, max: Option<f64>) -> OptionValue {
    let Some(mut number) = value.as_f64() else {
        return value.clone();
    };
    let mut clamped = false;
    if let Some(min) = min.filter(|&min| number < min) {
        number = min;
        clamped = true;
    }
    if let Some(max) = max.filter(|&max| number > max) {
        number = max;
        clamped = true;
    }
    match value {
        OptionValue::Integer(_) if !clamped => value.clone(),
        _ => OptionValue::Float(number),
    }
}

fn normalize_multi_reference(value: &OptionValue) -> OptionValue {
    match value {
        OptionValue::Array(_) => value.clone(),
        scalar => OptionValue::Array(vec![scalar.clone()]),
    }
}
