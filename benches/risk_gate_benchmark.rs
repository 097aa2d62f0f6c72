use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fx_sentinel::config::{RiskConfig, SizeMode, TargetMode};
use fx_sentinel::core::events::{Timeframe, TradeDirection};
use fx_sentinel::health::{ErrorHandler, HealthState};
use fx_sentinel::host::MockHost;
use fx_sentinel::risk::{sizing, targets, RiskEngine};
use rust_decimal::Decimal;
use std::sync::Arc;

fn engine(config: RiskConfig, host: Arc<MockHost>) -> RiskEngine {
    let state = Arc::new(HealthState::new());
    let handler = Arc::new(ErrorHandler::new(state));
    RiskEngine::new(config, host.clone(), host, handler).expect("valid config")
}

fn bench_full_gate_fixed(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let host = Arc::new(MockHost::new());
    let engine = engine(RiskConfig::default(), host.clone());
    let instrument = rt.block_on(host.instrument("EURUSD")).unwrap();

    c.bench_function("risk_gate_fixed_lots", |b| {
        b.iter(|| {
            let decision =
                rt.block_on(engine.run(black_box(&instrument), TradeDirection::Buy));
            black_box(decision)
        })
    });
}

fn bench_full_gate_atr(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let host = Arc::new(MockHost::new());
    let mut config = RiskConfig::default();
    config.stop_loss_mode = TargetMode::Atr;
    config.size_mode = SizeMode::Auto;
    let engine = engine(config, host.clone());

    rt.block_on(host.set_bars(
        Timeframe::Trading,
        MockHost::flat_bars(50, Decimal::new(11, 1), Decimal::new(1, 3)),
    ));
    let instrument = rt.block_on(host.instrument("EURUSD")).unwrap();

    c.bench_function("risk_gate_atr_auto_sized", |b| {
        b.iter(|| {
            let decision =
                rt.block_on(engine.run(black_box(&instrument), TradeDirection::Buy));
            black_box(decision)
        })
    });
}

fn bench_atr_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_true_range");
    for period in [14, 50, 200].iter() {
        let bars = MockHost::flat_bars(period + 1, Decimal::new(11, 1), Decimal::new(1, 3));
        group.bench_with_input(format!("period_{}", period), period, |b, &period| {
            b.iter(|| targets::average_true_range(black_box(&bars), period))
        });
    }
    group.finish();
}

fn bench_size_normalization(c: &mut Criterion) {
    let host = Arc::new(MockHost::new());
    let rt = tokio::runtime::Runtime::new().unwrap();
    let instrument = rt.block_on(host.instrument("EURUSD")).unwrap();
    let raw = fx_sentinel::types::Lots::from_str("0.163").unwrap();

    c.bench_function("size_normalization", |b| {
        b.iter(|| sizing::normalize(black_box(raw), black_box(&instrument)))
    });
}

criterion_group!(
    benches,
    bench_full_gate_fixed,
    bench_full_gate_atr,
    bench_atr_computation,
    bench_size_normalization
);
criterion_main!(benches);
