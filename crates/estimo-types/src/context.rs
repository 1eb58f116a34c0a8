use crate::pricing::PriceComponent;
use serde::{Deserialize, Serialize};

/// Length unit of an item's catalog dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Millimetres
    #[default]
    Mm,
    /// Centimetres
    Cm,
    /// Metres
    M,
}

impl LengthUnit {
    /// Millimetres per one unit.
    #[must_use]
    pub const fn to_mm(self) -> f64 {
        match self {
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::M => 1000.0,
        }
    }
}

/// Physical attributes of a target item, as read from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    /// Width in `length_unit`
    #[serde(default)]
    pub width: Option<f64>,
    /// Length in `length_unit`
    #[serde(default)]
    pub length: Option<f64>,
    /// Height in `length_unit`
    #[serde(default)]
    pub height: Option<f64>,
    /// Weight in grams
    #[serde(default)]
    pub weight: Option<f64>,
    /// Unit of width/length/height
    #[serde(default)]
    pub length_unit: LengthUnit,
    /// Sale measure code (e.g. "pcs", "pack")
    #[serde(default = "default_measure")]
    pub measure: String,
    /// Pieces per one sale measure
    #[serde(default = "default_ratio")]
    pub measure_ratio: f64,
}

fn default_measure() -> String {
    "pcs".to_string()
}

fn default_ratio() -> f64 {
    1.0
}

/// Dimensions normalized to millimetres and grams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    /// Width in mm
    pub width_mm: f64,
    /// Length in mm
    pub length_mm: f64,
    /// Height in mm
    pub height_mm: f64,
    /// Weight in g
    pub weight_g: f64,
    /// Pieces per sale measure
    pub pieces_per_measure: f64,
}

impl Measurements {
    /// Face area in square metres.
    #[must_use]
    pub fn area_m2(&self) -> f64 {
        self.width_mm * self.length_mm / 1_000_000.0
    }
}

/// Running state of one pipeline invocation.
///
/// Owned by exactly one run. The component list is append-only and the
/// running total is only updated together with it, so `total_cost` always
/// equals the sum of the committed components' costs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    target_id: String,
    price_components: Vec<PriceComponent>,
    total_cost: f64,
    is_last_step: bool,
    /// Catalog attributes of the target, when the host has them
    pub attributes: Option<ItemAttributes>,
    /// Normalized dimensions written by the dimension stage
    pub measurements: Option<Measurements>,
}

impl PipelineContext {
    /// Fresh context for one target item.
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            price_components: Vec::new(),
            total_cost: 0.0,
            is_last_step: false,
            attributes: None,
            measurements: None,
        }
    }

    /// Attach catalog attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Option<ItemAttributes>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Identifier of the item being priced
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Components committed so far, in execution order
    #[must_use]
    pub fn price_components(&self) -> &[PriceComponent] {
        &self.price_components
    }

    /// Sum of committed component costs
    #[must_use]
    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// True only while the final stage executes
    #[must_use]
    pub const fn is_last_step(&self) -> bool {
        self.is_last_step
    }

    /// Mark whether the stage about to run is the final one.
    pub fn set_last_step(&mut self, is_last_step: bool) {
        self.is_last_step = is_last_step;
    }

    /// Append a component and add its cost to the running total.
    pub fn commit(&mut self, component: PriceComponent) {
        self.total_cost += component.cost;
        self.price_components.push(component);
    }

    /// Consume the context, returning its target id, components and total.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<PriceComponent>, f64) {
        (self.target_id, self.price_components, self.total_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_keeps_total_in_step_with_components() {
        let mut ctx = PipelineContext::new("42");
        ctx.commit(PriceComponent::new("a", 10.0));
        ctx.commit(PriceComponent::new("b", 32.0));

        assert_eq!(ctx.price_components().len(), 2);
        assert_eq!(ctx.total_cost(), 42.0);
        assert_eq!(ctx.price_components()[1].label, "b");
    }

    #[test]
    fn attributes_defaults() {
        let attrs: ItemAttributes = serde_json::from_str(r#"{"width": 10}"#).unwrap();
        assert_eq!(attrs.measure, "pcs");
        assert_eq!(attrs.measure_ratio, 1.0);
        assert_eq!(attrs.length_unit, LengthUnit::Mm);
    }

    #[test]
    fn area_in_square_metres() {
        let m = Measurements { width_mm: 1000.0, length_mm: 500.0, ..Default::default() };
        assert_eq!(m.area_m2(), 0.5);
    }
}
