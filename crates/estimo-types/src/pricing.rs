use crate::value::OptionValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One cost line contributed by a single stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceComponent {
    /// Code of the stage that produced the component. Filled in by the executor.
    #[serde(default)]
    pub stage_code: String,
    /// Human-readable label
    pub label: String,
    /// Non-negative amount added to the running total
    pub cost: f64,
    /// Stage-specific diagnostic data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, OptionValue>,
    /// Sale prices per price tier. Only set by the finalization stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices_by_type: Option<BTreeMap<String, MarkupResult>>,
}

impl PriceComponent {
    /// Create a component with a label and cost and no metadata.
    pub fn new(label: impl Into<String>, cost: f64) -> Self {
        Self {
            stage_code: String::new(),
            label: label.into(),
            cost,
            meta: BTreeMap::new(),
            prices_by_type: None,
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Attach tier prices.
    #[must_use]
    pub fn with_prices(mut self, prices: BTreeMap<String, MarkupResult>) -> Self {
        self.prices_by_type = Some(prices);
        self
    }
}

/// What the `from`/`to` bounds of a markup range measure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    /// Bounds are item quantities
    #[default]
    Quantity,
    /// Bounds are accumulated cost amounts
    Cost,
}

/// Markup configuration for one price tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkupConfig {
    /// Target price tier. Entries without one are skipped.
    #[serde(default, alias = "priceTypeId", deserialize_with = "lenient_id")]
    pub price_tier_id: Option<String>,
    /// Meaning of the range bounds
    #[serde(default)]
    pub range_mode: RangeMode,
    /// Caller-ordered ranges; coverage is not validated here
    #[serde(default)]
    pub ranges: Vec<MarkupRange>,
}

/// A single markup range. `to = None` is unbounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkupRange {
    /// Lower bound
    #[serde(default, deserialize_with = "lenient_f64_or_zero")]
    pub from: f64,
    /// Upper bound, `None` for unbounded
    #[serde(default, deserialize_with = "lenient_f64")]
    pub to: Option<f64>,
    /// Markup in percent. Ranges without one are skipped.
    #[serde(
        default,
        rename = "value",
        alias = "percentMarkup",
        deserialize_with = "lenient_f64"
    )]
    pub percent_markup: Option<f64>,
}

/// Resolved sale prices for one price tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkupResult {
    /// Copied from the tier's configuration
    pub range_mode: RangeMode,
    /// One entry per resolved range, in configuration order
    pub ranges: Vec<PricedRange>,
}

/// A range with its final sale price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricedRange {
    /// Lower bound
    pub from: f64,
    /// Upper bound, `None` for unbounded
    pub to: Option<f64>,
    /// Rounded sale price
    pub price: f64,
}

// Catalog back-ends hand out ids and bounds as numbers or as strings; accept both.

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.unwrap_or(0.0))
}
