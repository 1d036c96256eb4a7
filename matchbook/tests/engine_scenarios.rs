//! End-to-end scenarios against the public engine API: resting, crossing,
//! sweeping, priority, eviction and the read surface working together.

use matchbook::{
    Engine, OrderRequest, OrderStatus, OrderType, PushOutcome, Side, SideBook,
};

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

#[test]
fn resting_limit_on_empty_book() {
    let mut engine = Engine::new();
    let (trades, order) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 1.0, 59000.0))
        .unwrap();

    assert!(trades.is_empty());
    assert_eq!(order.status, OrderStatus::New);

    let depth = engine.get_order_book_data("BTCUSDT", 30);
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].price, 59000.0);
    assert_eq!(depth.bids[0].quantity, 1.0);
    assert!(depth.asks.is_empty());
}

#[test]
fn crossing_limit_fills_both_at_maker_price() {
    let mut engine = Engine::new();
    let (_, maker) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 1.0, 59000.0))
        .unwrap();
    let (trades, taker) = engine
        .create_order(limit("BTCUSDT", Side::Sell, 1.0, 58000.0))
        .unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, 59000.0);
    assert_eq!(trades[0].quantity, 1.0);
    assert_eq!(trades[0].buy_order_id, maker.order_id);
    assert_eq!(trades[0].sell_order_id, taker.order_id);
    assert_eq!(taker.status, OrderStatus::Filled);

    let depth = engine.get_order_book_data("BTCUSDT", 30);
    assert!(depth.bids.is_empty());
    assert!(depth.asks.is_empty());
}

#[test]
fn partial_fill_rests_remainder_as_best_bid() {
    let mut engine = Engine::new();
    engine
        .create_order(limit("BTCUSDT", Side::Sell, 0.5, 60000.0))
        .unwrap();

    let (trades, taker) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 2.0, 60000.0))
        .unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!((trades[0].price, trades[0].quantity), (60000.0, 0.5));
    assert_eq!(taker.status, OrderStatus::PartiallyFilled);

    let depth = engine.get_order_book_data("BTCUSDT", 30);
    assert!(depth.asks.is_empty());
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].price, 60000.0);
    assert_eq!(depth.bids[0].quantity, 1.5);
}

#[test]
fn market_buy_sweeps_two_levels() {
    let mut engine = Engine::new();
    engine
        .create_order(limit("ETHUSDT", Side::Sell, 1.0, 100.0))
        .unwrap();
    engine
        .create_order(limit("ETHUSDT", Side::Sell, 2.0, 101.0))
        .unwrap();

    let (trades, taker) = engine
        .create_order(market("ETHUSDT", Side::Buy, 2.5))
        .unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!((trades[0].price, trades[0].quantity), (100.0, 1.0));
    assert_eq!((trades[1].price, trades[1].quantity), (101.0, 1.5));
    assert_eq!(taker.status, OrderStatus::Filled);

    let depth = engine.get_order_book_data("ETHUSDT", 30);
    assert_eq!(depth.asks.len(), 1);
    assert_eq!(depth.asks[0].price, 101.0);
    assert_eq!(depth.asks[0].quantity, 0.5);
}

#[test]
fn equal_price_bids_fill_in_arrival_order() {
    let mut engine = Engine::new();
    let (_, order_a) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 1.0, 50.0))
        .unwrap();
    let (_, order_b) = engine
        .create_order(limit("BTCUSDT", Side::Buy, 1.0, 50.0))
        .unwrap();

    let (trades, _) = engine
        .create_order(limit("BTCUSDT", Side::Sell, 1.0, 50.0))
        .unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, order_a.order_id);

    let open = engine.get_open_orders("BTCUSDT");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].order_id, order_b.order_id);
}

#[test]
fn capacity_three_bid_side_evicts_the_cheapest() {
    let mut side = SideBook::with_capacity(Side::Buy, 3);
    for price in [10.0, 20.0, 30.0, 40.0] {
        let order = matchbook::Order::new(
            "BTCUSDT",
            Side::Buy,
            OrderType::Limit,
            1.0,
            Some(price),
            None,
            false,
        );
        match side.push(order) {
            PushOutcome::Added => {}
            PushOutcome::AddedEvicting(evicted) => {
                assert_eq!(evicted.limit_price(), 10.0);
                assert_eq!(evicted.status, OrderStatus::Cancelled);
            }
            PushOutcome::Rejected(order) => panic!("unexpected rejection at {}", order.limit_price()),
        }
    }

    let prices: Vec<f64> = side.iter().map(|o| o.limit_price()).collect();
    assert_eq!(prices, vec![40.0, 30.0, 20.0]);
    assert_eq!(side.peek().unwrap().limit_price(), 40.0);
}

#[test]
fn book_uncrossed_and_orders_well_formed_after_mixed_flow() {
    let mut engine = Engine::new();
    let flow = [
        (Side::Sell, 2.0, 101.0),
        (Side::Buy, 1.0, 99.0),
        (Side::Buy, 3.0, 102.0),
        (Side::Sell, 1.5, 98.0),
        (Side::Buy, 0.5, 100.0),
        (Side::Sell, 2.5, 100.5),
    ];
    for (side, qty, price) in flow {
        engine
            .create_order(limit("BTCUSDT", side, qty, price))
            .unwrap();
    }

    let open = engine.get_open_orders("BTCUSDT");
    for order in &open {
        assert!(order.filled_quantity >= 0.0);
        assert!(order.filled_quantity <= order.quantity);
        assert!(matches!(
            order.status,
            OrderStatus::New | OrderStatus::PartiallyFilled
        ));
    }

    let depth = engine.get_order_book_data("BTCUSDT", 30);
    if let (Some(bid), Some(ask)) = (depth.bids.first(), depth.asks.first()) {
        assert!(bid.price < ask.price);
    }

    let trades = engine.get_trades("BTCUSDT", 100);
    assert!(trades
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn cancel_round_trip_through_the_facade() {
    let mut engine = Engine::new();
    let (_, order) = engine
        .create_order(limit("JPMUSDT", Side::Sell, 2.0, 150.0))
        .unwrap();

    let results = engine.cancel_orders(
        "JPMUSDT",
        &[order.order_id.clone(), matchbook::OrderId::from("missing")],
    );
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].order_id, order.order_id);
    assert_eq!(results[0].quantity, 2.0);
    assert_eq!(results[1].quantity, 0.0);
    assert!(results.iter().all(|o| o.status == OrderStatus::Cancelled));
    assert!(engine.get_order_book_data("JPMUSDT", 30).asks.is_empty());
}
