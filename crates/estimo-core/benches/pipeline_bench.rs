use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use estimo_calculator::CalculatorRegistry;
use estimo_core::{BatchItem, PipelineExecutor, PipelineStage};
use estimo_types::{ItemAttributes, OptionValue};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn print_sequence() -> Vec<PipelineStage> {
    vec![
        PipelineStage::new("dimensions").with_option("BLEED_MM", 2.0),
        PipelineStage::new("digital_print")
            .with_option("QUANTITY", 500i64)
            .with_option("PRICE_PER_SHEET", 25.0)
            .with_option("COLOR_MODE", "4+4"),
        PipelineStage::new("lamination")
            .with_option("QUANTITY", 500i64)
            .with_option("PRICE_PER_SQM", 4.0)
            .with_option("BOTH_SIDES", true),
        PipelineStage::new("price_markup")
            .with_option(
                "PRICE_MARKUPS",
                OptionValue::from(json!([
                    {"priceTierId": "retail", "ranges": [{"from": 1, "to": 99, "value": 30}, {"from": 100, "value": 20}]},
                    {"priceTierId": "dealer", "ranges": [{"from": 1, "value": 10}]}
                ])),
            )
            .with_option("MARKETING_PRICE", true),
    ]
}

fn generate_items(count: usize) -> Vec<BatchItem> {
    (0..count)
        .map(|i| BatchItem {
            target_id: format!("item-{i}"),
            attributes: Some(ItemAttributes {
                width: Some(50.0 + (i % 50) as f64),
                length: Some(50.0 + (i % 30) as f64),
                ..Default::default()
            }),
        })
        .collect()
}

fn bench_batch_run(c: &mut Criterion) {
    let executor = PipelineExecutor::new(Arc::new(CalculatorRegistry::with_built_ins()));
    let sequence = print_sequence();

    let mut group = c.benchmark_group("pipeline_batch");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for size in [1, 100, 10_000].iter() {
        let items = generate_items(*size);
        group.bench_with_input(BenchmarkId::new("run_batch", size), &items, |b, items| {
            b.iter(|| black_box(executor.run_batch(items, &sequence)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_run);
criterion_main!(benches);
