//! Throughput and latency lab for the matching engine.
//!
//! Measures the hot paths in-process: order submission, crossing sweeps,
//! cancellation and the read surface, plus a short sustained mixed
//! workload.

use std::time::Instant;

use matchbook::{Engine, OrderRequest, OrderType, Side};

fn limit(symbol: &str, side: Side, qty: f64, price: f64) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        side,
        order_type: OrderType::Limit,
        quantity: qty,
        price: Some(price),
        client_order_id: None,
        is_futures: false,
    }
}

fn market(symbol: &str, side: Side, qty: f64) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        side,
        order_type: OrderType::Market,
        quantity: qty,
        price: None,
        client_order_id: None,
        is_futures: false,
    }
}

/// Populates a spread book: bids below 10000, asks above.
fn seeded_engine(levels: usize) -> Engine {
    let mut engine = Engine::new();
    for i in 0..levels {
        engine
            .create_order(limit("BTCUSDT", Side::Buy, 1.0, 9999.0 - i as f64))
            .expect("seed bid");
        engine
            .create_order(limit("BTCUSDT", Side::Sell, 1.0, 10001.0 + i as f64))
            .expect("seed ask");
    }
    engine
}

pub fn run_latency_tests() {
    println!("Latency tests");

    market_data_latency();
    submission_latency();
    matching_latency();
    cancellation_latency();
}

fn market_data_latency() {
    let engine = seeded_engine(100);
    let iterations = 100_000;

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(engine.get_order_book_data("BTCUSDT", 30));
    }
    let elapsed = start.elapsed();
    println!(
        "  depth snapshot (30 levels): {:.0} ns/call",
        elapsed.as_nanos() as f64 / iterations as f64
    );

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(engine.get_trades("BTCUSDT", 50));
    }
    let elapsed = start.elapsed();
    println!(
        "  recent trades: {:.0} ns/call",
        elapsed.as_nanos() as f64 / iterations as f64
    );
}

fn submission_latency() {
    let iterations = 10_000u32;
    let mut total_ns = 0u128;

    for i in 0..iterations {
        let mut engine = Engine::new();
        let order = limit("BTCUSDT", Side::Buy, 1.0, 10000.0 - i as f64);

        let start = Instant::now();
        std::hint::black_box(engine.create_order(order).expect("submit"));
        total_ns += start.elapsed().as_nanos();
    }
    println!(
        "  non-crossing submit: {:.0} ns/order",
        total_ns as f64 / iterations as f64
    );
}

fn matching_latency() {
    let iterations = 1_000u32;
    let mut total_ns = 0u128;
    let sweep_size = 50.0;

    for _ in 0..iterations {
        let mut engine = seeded_engine(100);
        let sweep = market("BTCUSDT", Side::Buy, sweep_size);

        let start = Instant::now();
        let (trades, _) = engine.create_order(sweep).expect("sweep");
        total_ns += start.elapsed().as_nanos();
        assert_eq!(trades.len(), sweep_size as usize);
    }
    println!(
        "  50-level market sweep: {:.0} ns/order",
        total_ns as f64 / iterations as f64
    );
}

fn cancellation_latency() {
    let iterations = 1_000u32;
    let mut total_ns = 0u128;

    for _ in 0..iterations {
        let mut engine = Engine::new();
        let (_, order) = engine
            .create_order(limit("BTCUSDT", Side::Buy, 1.0, 9999.0))
            .expect("rest");

        let start = Instant::now();
        std::hint::black_box(engine.cancel_order("BTCUSDT", &order.order_id));
        total_ns += start.elapsed().as_nanos();
    }
    println!(
        "  cancel resting order: {:.0} ns/cancel",
        total_ns as f64 / iterations as f64
    );
}

/// Mixed workload: 70% resting submits, 20% crossing orders, 10% cancels.
pub fn run_throughput_test() {
    println!("Sustained mixed throughput");

    let mut engine = Engine::new();
    let mut resting = Vec::new();
    let operations = 100_000u64;

    let start = Instant::now();
    for i in 0..operations {
        match i % 10 {
            0..=6 => {
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                let price = if side == Side::Buy {
                    9999.0 - (i % 200) as f64
                } else {
                    10001.0 + (i % 200) as f64
                };
                let (_, order) = engine
                    .create_order(limit("BTCUSDT", side, 1.0, price))
                    .expect("submit");
                resting.push(order.order_id);
            }
            7 | 8 => {
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                engine
                    .create_order(market("BTCUSDT", side, 2.0))
                    .expect("cross");
            }
            _ => {
                if let Some(order_id) = resting.pop() {
                    engine.cancel_order("BTCUSDT", &order_id);
                }
            }
        }
    }
    let elapsed = start.elapsed();

    println!(
        "  {} ops in {:.2?} ({:.0} ops/sec)",
        operations,
        elapsed,
        operations as f64 / elapsed.as_secs_f64()
    );
    println!(
        "  tape length {}, open orders {}",
        engine.get_trades("BTCUSDT", usize::MAX).len(),
        engine.get_open_orders("BTCUSDT").len()
    );
}
