//! Request and result types of a pipeline run.

use std::collections::HashMap;

use estimo_types::{ItemAttributes, OptionValue, PipelineContext, PriceComponent};
use serde::{Deserialize, Serialize};

use crate::error::{OrderingError, PipelineError, StageErrorRecord};

/// One element of a submitted stage sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub stage_code: String,
    #[serde(default)]
    pub options: HashMap<String, OptionValue>,
}

impl PipelineStage {
    pub fn new(stage_code: impl Into<String>) -> Self {
        Self { stage_code: stage_code.into(), options: HashMap::new() }
    }

    pub fn with_option(mut self, code: &str, value: impl Into<OptionValue>) -> Self {
        self.options.insert(code.to_string(), value.into());
        self
    }
}

/// A target item submitted to a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub target_id: String,
    #[serde(default)]
    pub attributes: Option<ItemAttributes>,
}

impl BatchItem {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self { target_id: target_id.into(), attributes: None }
    }
}

/// Outcome of running a sequence for one target item.
///
/// An ordering error is reported once and leaves the components empty. Other
/// errors are recorded per stage; `total_cost` is the sum of the successful
/// stages' component costs either way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub target_id: String,
    pub price_components: Vec<PriceComponent>,
    pub total_cost: f64,
    #[serde(default)]
    pub errors: Vec<StageErrorRecord>,
}

impl PipelineResult {
    pub(crate) fn completed(context: PipelineContext, errors: Vec<StageErrorRecord>) -> Self {
        let (target_id, price_components, total_cost) = context.into_parts();
        Self { target_id, price_components, total_cost, errors }
    }

    pub(crate) fn rejected(target_id: &str, err: OrderingError) -> Self {
        Self {
            target_id: target_id.to_string(),
            price_components: Vec::new(),
            total_cost: 0.0,
            errors: vec![StageErrorRecord::from(&PipelineError::from(err))],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Component produced by `stage_code`, if that stage committed one.
    pub fn component(&self, stage_code: &str) -> Option<&PriceComponent> {
        self.price_components.iter().find(|c| c.stage_code == stage_code)
    }
}
