use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use larder_core::{Entity, TenantId};
use larder_costing::{CostLayer, LayerId, plan_fifo};
use larder_inventory::{ItemId, LocationId, Lot, LotId};

fn build_layers(item: ItemId, location: LocationId, count: usize) -> Vec<CostLayer> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let lot = Lot::receive(
                LotId::new(),
                TenantId::new(),
                item,
                location,
                format!("LOT-{i}"),
                Decimal::from(10),
                Decimal::new(250 + i as i64, 2),
                None,
                t0 + Duration::minutes(i as i64),
            )
            .unwrap();
            CostLayer::for_lot(LayerId::new(), &lot)
        })
        .collect()
}

/// FIFO planning across layer counts: the hot path of every depletion.
fn bench_plan_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_fifo");

    for layer_count in [10usize, 100, 1_000] {
        let item = ItemId::new();
        let location = LocationId::new();
        let layers = build_layers(item, location, layer_count);
        let refs: Vec<&CostLayer> = layers.iter().collect();
        // Draw through half the layers, splitting one in the middle.
        let requested = Decimal::from(layer_count as i64 * 10 / 2) + Decimal::new(5, 1);

        group.throughput(Throughput::Elements(layer_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(layer_count),
            &layer_count,
            |b, _| {
                b.iter(|| {
                    let plan =
                        plan_fifo(item, location, black_box(&refs), black_box(requested)).unwrap();
                    black_box(plan.weighted_unit_cost)
                })
            },
        );
    }

    group.finish();
}

/// Applying a plan to owned layers: draw cost without the store around it.
fn bench_apply_draws(c: &mut Criterion) {
    let item = ItemId::new();
    let location = LocationId::new();
    let layers = build_layers(item, location, 100);
    let refs: Vec<&CostLayer> = layers.iter().collect();
    let requested = Decimal::from(505);
    let plan = plan_fifo(item, location, &refs, requested).unwrap();

    c.bench_function("apply_draws_100_layers", |b| {
        b.iter(|| {
            let mut scratch = layers.clone();
            for draw in &plan.draws {
                let layer = scratch
                    .iter_mut()
                    .find(|l| l.id() == &draw.layer_id)
                    .unwrap();
                layer.draw(draw.quantity).unwrap();
            }
            black_box(scratch.len())
        })
    });
}

criterion_group!(benches, bench_plan_fifo, bench_apply_draws);
criterion_main!(benches);
