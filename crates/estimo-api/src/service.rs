//! Host-side orchestration of a pipeline run request: catalog lookup, batch
//! execution and the optional commit of computed prices.

use std::collections::BTreeMap;
use std::sync::Arc;

use estimo_core::{
    BatchItem, CatalogReader, CatalogWriter, PipelineExecutor, build_catalog_write,
};
use tracing::{info, instrument, warn};

use crate::types::{ItemError, ItemResult, RunMode, RunPipelineRequest, RunPipelineResponse};

pub const TARGET_NOT_FOUND: &str = "target not found";

/// Runs requests against a catalog. Blocking; call from a blocking task.
#[derive(Clone)]
pub struct EstimateService {
    executor: PipelineExecutor,
    reader: Arc<dyn CatalogReader>,
    writer: Arc<dyn CatalogWriter>,
}

impl EstimateService {
    pub fn new(
        executor: PipelineExecutor,
        reader: Arc<dyn CatalogReader>,
        writer: Arc<dyn CatalogWriter>,
    ) -> Self {
        Self { executor, reader, writer }
    }

    pub fn executor(&self) -> &PipelineExecutor {
        &self.executor
    }

    #[instrument(skip(self, request), fields(targets = request.target_ids.len(), mode = ?request.mode))]
    pub fn run(&self, request: &RunPipelineRequest) -> RunPipelineResponse {
        let mut results = BTreeMap::new();
        let mut batch = Vec::new();

        for target_id in request.unique_target_ids() {
            match self.reader.read_item(target_id) {
                Ok(Some(item)) => {
                    let attributes = request.attributes.get(target_id).cloned();
                    batch.push(BatchItem {
                        target_id: item.target_id,
                        attributes: Some(attributes.unwrap_or(item.attributes)),
                    })
                }
                Ok(None) => {
                    results.insert(
                        target_id.to_string(),
                        ItemResult::failed(ItemError::item(TARGET_NOT_FOUND)),
                    );
                }
                Err(err) => {
                    warn!(target_id, error = %err, "Catalog read failed");
                    results.insert(
                        target_id.to_string(),
                        ItemResult::failed(ItemError::item(err.to_string())),
                    );
                }
            }
        }

        for result in self.executor.run_batch(&batch, &request.sequence) {
            let committed = request.mode == RunMode::Commit && result.is_success();
            let write = committed.then(|| {
                let attributes = request.attributes.get(&result.target_id).cloned();
                build_catalog_write(&result, &request.sequence, attributes)
            });
            let target_id = result.target_id.clone();
            let mut item = ItemResult::from(result);

            if let Some(write) = write {
                match self.writer.write_item(write) {
                    Ok(()) => item.committed = true,
                    Err(err) => {
                        warn!(target_id = target_id.as_str(), error = %err, "Catalog write failed");
                        item.errors.push(ItemError::item(err.to_string()));
                    }
                }
            }
            results.insert(target_id, item);
        }

        let response = RunPipelineResponse::from_results(results);
        info!(
            status = ?response.status,
            failed = response.errors.len(),
            "Pipeline request completed"
        );
        response
    }
}
