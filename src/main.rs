//! Engine demo and performance lab.
//!
//! Runs the throughput tests, then walks one symbol through the core order
//! flow: resting, crossing at the maker price, a market sweep and a cancel,
//! printing the market data surface along the way.

use matchbook::{Engine, Interval, OrderRequest, OrderType, Side};

mod throughput;

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

fn main() {
    println!("=== simex matching engine lab ===");

    throughput::run_latency_tests();
    throughput::run_throughput_test();

    println!("\n=== Basic demo ===");
    run_basic_demo();
}

fn run_basic_demo() {
    let mut engine = Engine::new();

    // two resting orders forming a spread
    let (_, bid) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 1.0, 59000.0))
        .expect("bid");
    engine
        .create_order(limit("BTCUSDT", Side::Sell, 0.5, 59100.0))
        .expect("ask");
    println!("Rested bid {} and an ask at 59100", bid.order_id);

    let depth = engine.get_order_book_data("BTCUSDT", 10);
    println!(
        "Spread: best bid {:?}, best ask {:?}",
        depth.bids.first().map(|l| l.price),
        depth.asks.first().map(|l| l.price)
    );

    // crossing sell executes at the resting bid's price
    let (trades, taker) = engine
        .create_order(limit("BTCUSDT", Side::Sell, 2.0, 58500.0))
        .expect("crossing sell");
    for trade in &trades {
        println!("Trade: {} @ {} (maker price)", trade.quantity, trade.price);
    }
    println!("Taker finished {} with {} filled", taker.status, taker.filled_quantity);

    // market buy sweeps what is left on the ask side
    let (trades, _) = engine
        .create_order(OrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            order_type: OrderType::Market,
            quantity: 0.5,
            price: None,
            client_order_id: None,
            is_futures: false,
        })
        .expect("market buy");
    println!("Market buy produced {} trade(s)", trades.len());

    let tape = engine.get_trades("BTCUSDT", 10);
    println!("Tape holds {} trades, last at {:?}", tape.len(), tape.last().map(|t| t.price));

    let bars = engine.get_klines("BTCUSDT", Interval::OneMinute, 10);
    if let Some(bar) = bars.last() {
        println!(
            "1m bar: o={} h={} l={} c={} v={}",
            bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }

    // the taker's remainder is resting; cancel it
    let open = engine.get_open_orders("BTCUSDT");
    println!("{} order(s) open", open.len());
    if let Some(order) = open.first() {
        let cancelled = engine.cancel_order("BTCUSDT", &order.order_id);
        println!("Cancelled {} -> {}", cancelled.order_id, cancelled.status);
    }
}
