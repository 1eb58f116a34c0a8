//! Request and response payloads of the HTTP API.

use std::collections::{BTreeMap, HashSet};

use estimo_core::{CatalogItem, PipelineResult, PipelineStage, PriceTier, StageErrorRecord};
use estimo_types::{ItemAttributes, PriceComponent};
use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::error::{ApiError, ApiResult};

/// Whether computed prices are written back to the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    #[default]
    DryRun,
    Commit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineRequest {
    pub target_ids: Vec<String>,
    pub sequence: Vec<PipelineStage>,
    #[serde(default)]
    pub mode: RunMode,
    /// Edited physical attributes by target id. They replace the catalog's for
    /// the run and are written back on commit.
    #[serde(default)]
    pub attributes: BTreeMap<String, ItemAttributes>,
}

impl RunPipelineRequest {
    pub fn validate(&self, limits: &LimitsConfig) -> ApiResult<()> {
        if self.target_ids.is_empty() {
            return Err(ApiError::validation_field("targetIds", "at least one target id is required"));
        }
        if self.target_ids.len() > limits.max_targets_per_request {
            return Err(ApiError::validation_field(
                "targetIds",
                format!(
                    "{} target ids exceed the limit of {}",
                    self.target_ids.len(),
                    limits.max_targets_per_request
                ),
            ));
        }
        if self.target_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ApiError::validation_field("targetIds", "target ids must not be blank"));
        }
        if self.sequence.is_empty() {
            return Err(ApiError::validation_field("sequence", "at least one stage is required"));
        }
        if self.sequence.len() > limits.max_stages_per_sequence {
            return Err(ApiError::validation_field(
                "sequence",
                format!(
                    "{} stages exceed the limit of {}",
                    self.sequence.len(),
                    limits.max_stages_per_sequence
                ),
            ));
        }
        if self.sequence.iter().any(|stage| stage.stage_code.trim().is_empty()) {
            return Err(ApiError::validation_field("sequence", "stage codes must not be blank"));
        }
        if let Some(id) = self.attributes.keys().find(|id| !self.target_ids.contains(id)) {
            return Err(ApiError::validation_field(
                "attributes",
                format!("attributes given for '{id}', which is not in targetIds"),
            ));
        }
        Ok(())
    }

    /// Target ids in request order, duplicates removed.
    pub fn unique_target_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.target_ids.iter().map(String::as_str).filter(|id| seen.insert(*id)).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Partial,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub stage_code: Option<String>,
    pub message: String,
}

impl ItemError {
    pub fn item(message: impl Into<String>) -> Self {
        Self { stage_code: None, message: message.into() }
    }
}

impl From<&StageErrorRecord> for ItemError {
    fn from(record: &StageErrorRecord) -> Self {
        Self { stage_code: record.stage_code.clone(), message: record.message.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub price_components: Vec<PriceComponent>,
    pub total_cost: f64,
    pub errors: Vec<ItemError>,
    #[serde(default)]
    pub committed: bool,
}

impl ItemResult {
    pub fn failed(error: ItemError) -> Self {
        Self { errors: vec![error], ..Default::default() }
    }
}

impl From<PipelineResult> for ItemResult {
    fn from(result: PipelineResult) -> Self {
        Self {
            errors: result.errors.iter().map(ItemError::from).collect(),
            price_components: result.price_components,
            total_cost: result.total_cost,
            committed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineResponse {
    pub success: bool,
    pub status: RunStatus,
    pub results: BTreeMap<String, ItemResult>,
    pub errors: BTreeMap<String, Vec<ItemError>>,
}

impl RunPipelineResponse {
    pub fn from_results(results: BTreeMap<String, ItemResult>) -> Self {
        let errors: BTreeMap<_, _> = results
            .iter()
            .filter(|(_, item)| !item.errors.is_empty())
            .map(|(id, item)| (id.clone(), item.errors.clone()))
            .collect();

        let status = if errors.is_empty() {
            RunStatus::Ok
        } else if errors.len() == results.len() {
            RunStatus::Error
        } else {
            RunStatus::Partial
        };

        Self { success: errors.is_empty(), status, results, errors }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListCalculatorsQuery {
    #[serde(default)]
    pub include_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub calculators: usize,
    pub uptime_seconds: u64,
}

/// Contents of a catalog seed file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub price_tiers: Vec<PriceTier>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(target_ids: &[&str], stages: &[&str]) -> RunPipelineRequest {
        RunPipelineRequest {
            target_ids: target_ids.iter().map(|s| s.to_string()).collect(),
            sequence: stages.iter().map(|s| PipelineStage::new(*s)).collect(),
            mode: RunMode::DryRun,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn attributes_must_name_requested_targets() {
        let mut request = request(&["1"], &["dimensions"]);
        request.attributes.insert("2".to_string(), ItemAttributes::default());

        let err = request.validate(&LimitsConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        request.attributes.clear();
        request.attributes.insert("1".to_string(), ItemAttributes::default());
        assert!(request.validate(&LimitsConfig::default()).is_ok());
    }

    #[test]
    fn request_deserializes_with_default_mode() {
        let request: RunPipelineRequest = serde_json::from_value(json!({
            "targetIds": ["1"],
            "sequence": [{"stageCode": "dimensions", "options": {"BLEED_MM": "2"}}]
        }))
        .unwrap();
        assert_eq!(request.mode, RunMode::DryRun);
        assert_eq!(request.sequence[0].stage_code, "dimensions");

        let request: RunPipelineRequest = serde_json::from_value(json!({
            "targetIds": ["1"], "sequence": [], "mode": "commit"
        }))
        .unwrap();
        assert_eq!(request.mode, RunMode::Commit);
    }

    #[test]
    fn validation_limits() {
        let limits = LimitsConfig { max_targets_per_request: 2, ..Default::default() };
        assert!(request(&["1"], &["dimensions"]).validate(&limits).is_ok());
        assert!(request(&[], &["dimensions"]).validate(&limits).is_err());
        assert!(request(&["1"], &[]).validate(&limits).is_err());
        assert!(request(&["1", "2", "3"], &["dimensions"]).validate(&limits).is_err());
        assert!(request(&[" "], &["dimensions"]).validate(&limits).is_err());
    }

    #[test]
    fn duplicate_target_ids_collapse_in_order() {
        let req = request(&["b", "a", "b"], &["dimensions"]);
        assert_eq!(req.unique_target_ids(), vec!["b", "a"]);
    }

    #[test]
    fn status_reflects_item_outcomes() {
        let ok = ItemResult::default();
        let failed = ItemResult::failed(ItemError::item("target not found"));

        let all_ok = RunPipelineResponse::from_results(BTreeMap::from([("1".to_string(), ok.clone())]));
        assert!(all_ok.success);
        assert_eq!(all_ok.status, RunStatus::Ok);

        let partial = RunPipelineResponse::from_results(BTreeMap::from([
            ("1".to_string(), ok),
            ("2".to_string(), failed.clone()),
        ]));
        assert!(!partial.success);
        assert_eq!(partial.status, RunStatus::Partial);
        assert_eq!(partial.errors.len(), 1);

        let all_failed =
            RunPipelineResponse::from_results(BTreeMap::from([("2".to_string(), failed)]));
        assert_eq!(all_failed.status, RunStatus::Error);
    }
}
