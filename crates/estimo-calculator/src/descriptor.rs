//! Static calculator metadata: identity, option schema and position capabilities.

use estimo_types::OptionValue;
use serde::Serialize;

/// Describes one pluggable stage. Immutable once registered.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorDescriptor {
    /// Unique, stable key
    pub code: String,
    /// Display name
    pub title: String,
    /// Display group id; presentational only
    pub group: String,
    /// May appear inside a multi-stage sequence
    pub supports_chain: bool,
    /// May be the terminal stage
    pub supports_finalization: bool,
    /// Contributes to final pricing
    pub can_change_price: bool,
    /// Injected by the host, not user-selectable
    pub is_system: bool,
    /// May occupy position 0
    pub can_be_first: bool,
    /// Codes that must appear earlier whenever this stage is present
    pub requires_before: Vec<String>,
    /// Declared options, in display order
    pub options_spec: Vec<OptionSpec>,
}

impl CalculatorDescriptor {
    pub fn new(code: &str, title: &str, group: &str) -> Self {
        Self {
            code: code.to_string(),
            title: title.to_string(),
            group: group.to_string(),
            supports_chain: true,
            supports_finalization: false,
            can_change_price: false,
            is_system: false,
            can_be_first: false,
            requires_before: Vec::new(),
            options_spec: Vec::new(),
        }
    }

    pub fn first_eligible(mut self) -> Self {
        self.can_be_first = true;
        self
    }

    pub fn changes_price(mut self) -> Self {
        self.can_change_price = true;
        self
    }

    pub fn finalizer(mut self) -> Self {
        self.supports_finalization = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn standalone(mut self) -> Self {
        self.supports_chain = false;
        self
    }

    pub fn requires(mut self, code: &str) -> Self {
        self.requires_before.push(code.to_string());
        self
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options_spec.push(spec);
        self
    }

    pub fn option_spec(&self, code: &str) -> Option<&OptionSpec> {
        self.options_spec.iter().find(|spec| spec.code == code)
    }
}

/// One declared option of a calculator.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    pub code: String,
    pub title: String,
    #[serde(flatten)]
    pub option_type: OptionType,
    pub default: OptionValue,
}

/// Declared option type together with its type-specific constraints.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OptionType {
    Boolean,
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    SingleReference {
        catalog: String,
    },
    MultiReference {
        catalog: String,
    },
    EnumeratedList {
        values: Vec<String>,
    },
    MarkupRanges,
}

impl OptionSpec {
    fn with_type(code: &str, title: &str, option_type: OptionType, default: OptionValue) -> Self {
        Self { code: code.to_string(), title: title.to_string(), option_type, default }
    }

    pub fn boolean(code: &str, title: &str, default: bool) -> Self {
        Self::with_type(code, title, OptionType::Boolean, OptionValue::Boolean(default))
    }

    pub fn number(code: &str, title: &str, default: f64) -> Self {
        Self::with_type(
            code,
            title,
            OptionType::Number { min: None, max: None, step: None },
            OptionValue::Float(default),
        )
    }

    pub fn single_reference(code: &str, title: &str, catalog: &str) -> Self {
        Self::with_type(
            code,
            title,
            OptionType::SingleReference { catalog: catalog.to_string() },
            OptionValue::Null,
        )
    }

    pub fn multi_reference(code: &str, title: &str, catalog: &str) -> Self {
        Self::with_type(
            code,
            title,
            OptionType::MultiReference { catalog: catalog.to_string() },
            OptionValue::Array(Vec::new()),
        )
    }

    pub fn enumerated(code: &str, title: &str, values: &[&str], default: &str) -> Self {
        Self::with_type(
            code,
            title,
            OptionType::EnumeratedList { values: values.iter().map(|v| v.to_string()).collect() },
            OptionValue::String(default.to_string()),
        )
    }

    pub fn markup_ranges(code: &str, title: &str) -> Self {
        Self::with_type(code, title, OptionType::MarkupRanges, OptionValue::Array(Vec::new()))
    }

    /// Set number bounds. No effect on non-number options.
    pub fn bounded(mut self, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        if let OptionType::Number { min: lo, max: hi, step: st } = &mut self.option_type {
            *lo = min;
            *hi = max;
            *st = step;
        }
        self
    }
}
