//! Catalog collaborators: reading item attributes, writing computed prices
//! and listing the price tiers a host knows about.
//!
//! The engine only depends on the traits; [`InMemoryCatalog`] backs tests and
//! the standalone server.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use estimo_types::{ItemAttributes, MarkupResult, RangeMode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::types::{PipelineResult, PipelineStage};

/// A stored price for one tier, optionally bound to a quantity range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRow {
    pub price_tier_id: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_to: Option<f64>,
}

/// A price tier (retail, wholesale, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub base: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub target_id: String,
    #[serde(default)]
    pub attributes: ItemAttributes,
    #[serde(default)]
    pub prices: Vec<PriceRow>,
}

impl CatalogItem {
    pub fn new(target_id: impl Into<String>, attributes: ItemAttributes) -> Self {
        Self { target_id: target_id.into(), attributes, prices: Vec::new() }
    }
}

/// The sequence and outcome that produced a write, kept so a price can be
/// traced back to the stages that computed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub id: Uuid,
    pub stages: Vec<PipelineStage>,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogWrite {
    pub target_id: String,
    pub prices: Vec<PriceRow>,
    #[serde(default)]
    pub attributes: Option<ItemAttributes>,
    pub snapshot: PipelineSnapshot,
}

pub trait CatalogReader: Send + Sync {
    /// `Ok(None)` when the target does not exist.
    fn read_item(&self, target_id: &str) -> CatalogResult<Option<CatalogItem>>;
}

pub trait CatalogWriter: Send + Sync {
    /// Replace the prices of every tier present in `write` and record its snapshot.
    fn write_item(&self, write: CatalogWrite) -> CatalogResult<()>;
}

pub trait PriceTierDirectory: Send + Sync {
    fn list_tiers(&self) -> CatalogResult<Vec<PriceTier>>;
}

/// Turn a successful result into a catalog write.
///
/// Prices come from the last component carrying per-tier prices. Quantity
/// mode stores one row per range; cost mode stores the single range the
/// accumulated total falls into.
pub fn build_catalog_write(
    result: &PipelineResult,
    stages: &[PipelineStage],
    attributes: Option<ItemAttributes>,
) -> CatalogWrite {
    let prices = result
        .price_components
        .iter()
        .rev()
        .find_map(|c| c.prices_by_type.as_ref())
        .map(|by_tier| {
            by_tier
                .iter()
                .flat_map(|(tier, markup)| price_rows(tier, markup, result.total_cost))
                .collect()
        })
        .unwrap_or_default();

    CatalogWrite {
        target_id: result.target_id.clone(),
        prices,
        attributes,
        snapshot: PipelineSnapshot {
            id: Uuid::new_v4(),
            stages: stages.to_vec(),
            total_cost: result.total_cost,
            created_at: Utc::now(),
        },
    }
}

fn price_rows(tier: &str, markup: &MarkupResult, total_cost: f64) -> Vec<PriceRow> {
    match markup.range_mode {
        RangeMode::Quantity => markup
            .ranges
            .iter()
            .map(|range| PriceRow {
                price_tier_id: tier.to_string(),
                price: range.price,
                quantity_from: Some(range.from),
                quantity_to: range.to,
            })
            .collect(),
        RangeMode::Cost => markup
            .ranges
            .iter()
            .find(|range| total_cost >= range.from && range.to.is_none_or(|to| total_cost < to))
            .map(|range| PriceRow {
                price_tier_id: tier.to_string(),
                price: range.price,
                quantity_from: None,
                quantity_to: None,
            })
            .into_iter()
            .collect(),
    }
}

/// Thread-safe in-memory catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: DashMap<String, CatalogItem>,
    snapshots: DashMap<String, PipelineSnapshot>,
    tiers: Vec<PriceTier>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiers(mut self, tiers: Vec<PriceTier>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn insert_item(&self, item: CatalogItem) {
        self.items.insert(item.target_id.clone(), item);
    }

    pub fn item(&self, target_id: &str) -> Option<CatalogItem> {
        self.items.get(target_id).map(|entry| entry.value().clone())
    }

    pub fn snapshot(&self, target_id: &str) -> Option<PipelineSnapshot> {
        self.snapshots.get(target_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CatalogReader for InMemoryCatalog {
    fn read_item(&self, target_id: &str) -> CatalogResult<Option<CatalogItem>> {
        Ok(self.item(target_id))
    }
}

impl CatalogWriter for InMemoryCatalog {
    fn write_item(&self, write: CatalogWrite) -> CatalogResult<()> {
        let mut item = self
            .items
            .get_mut(&write.target_id)
            .ok_or_else(|| CatalogError::NotFound { target_id: write.target_id.clone() })?;

        item.prices.retain(|row| !write.prices.iter().any(|w| w.price_tier_id == row.price_tier_id));
        item.prices.extend(write.prices);
        if let Some(attributes) = write.attributes {
            item.attributes = attributes;
        }
        drop(item);

        debug!(target_id = write.target_id.as_str(), "Catalog item written");
        self.snapshots.insert(write.target_id, write.snapshot);
        Ok(())
    }
}

impl PriceTierDirectory for InMemoryCatalog {
    fn list_tiers(&self) -> CatalogResult<Vec<PriceTier>> {
        Ok(self.tiers.clone())
    }
}
