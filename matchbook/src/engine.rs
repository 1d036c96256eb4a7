//! Engine facade: one instance per market (spot or futures), owning every
//! symbol's book, tape and candle state.
//!
//! The engine is a plain synchronous structure. Callers that share it
//! across threads wrap it in a lock and hold the lock for the whole
//! operation; no method here calls back into another public method, so a
//! non-reentrant lock is enough.

use std::collections::HashMap;

use tracing::debug;

use crate::book::SymbolOrderBook;
use crate::error::EngineError;
use crate::klines::{Interval, Kline, KlineSeries};
use crate::side_book::PushOutcome;
use crate::tape::TradeTape;
use crate::types::{now_ms, Depth, Order, OrderId, OrderStatus, OrderType, Side, Trade};

/// Open orders returned per side by `get_open_orders`.
const OPEN_ORDERS_PER_SIDE: usize = 10;

/// Admission parameters for one order.
#[derive(Clone, Debug)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: Option<f64>,
    pub client_order_id: Option<String>,
    pub is_futures: bool,
}

#[derive(Default)]
pub struct Engine {
    books: HashMap<String, SymbolOrderBook>,
    tapes: HashMap<String, TradeTape>,
    klines: HashMap<String, KlineSeries>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    fn book_mut(&mut self, symbol: &str) -> &mut SymbolOrderBook {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolOrderBook::new(symbol))
    }

    fn validate(request: &OrderRequest) -> Result<(), EngineError> {
        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return Err(EngineError::InvalidQuantity(request.quantity));
        }
        match request.order_type {
            OrderType::Limit => match request.price {
                Some(price) if price.is_finite() && price > 0.0 => Ok(()),
                _ => Err(EngineError::MissingPrice),
            },
            OrderType::Market => match request.price {
                Some(_) => Err(EngineError::UnexpectedPrice),
                None => Ok(()),
            },
        }
    }

    fn build_order(request: &OrderRequest) -> Order {
        Order::new(
            &request.symbol,
            request.side,
            request.order_type,
            request.quantity,
            request.price,
            request.client_order_id.clone(),
            request.is_futures,
        )
    }

    /// Runs one order through the matching loop and feeds the tape and
    /// candle state with whatever executed.
    fn submit(&mut self, order: Order) -> (Vec<Trade>, Order) {
        let symbol = order.symbol.clone();
        let (trades, order) = self.book_mut(&symbol).process(order);
        self.record_trades(&symbol, &trades);
        (trades, order)
    }

    fn record_trades(&mut self, symbol: &str, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        let series = self.klines.entry(symbol.to_string()).or_default();
        let now = now_ms();
        for trade in trades {
            series.record_at(now, trade.price, trade.quantity);
        }
        let tape = self.tapes.entry(symbol.to_string()).or_default();
        for trade in trades {
            tape.record(trade.clone());
        }
    }

    /// Admits and matches a single order. Returns the trades it produced
    /// (execution order, best price first) and the order's final state.
    pub fn create_order(
        &mut self,
        request: OrderRequest,
    ) -> Result<(Vec<Trade>, Order), EngineError> {
        Self::validate(&request)?;
        let order = Self::build_order(&request);
        debug!(
            symbol = %order.symbol,
            order_id = %order.order_id,
            side = %order.side,
            order_type = %order.order_type,
            quantity = order.quantity,
            "order admitted"
        );
        Ok(self.submit(order))
    }

    /// Batch admission. Buys are submitted best-priced first, then sells,
    /// so the most aggressive order on each side sees the deepest opposite
    /// liquidity. Once a limit order on a side fails to fill completely,
    /// later limit orders on that side rest directly without matching: they
    /// are priced no better, so nothing on the opposite side can cross
    /// them. Market orders always run the matching loop.
    pub fn create_orders(
        &mut self,
        requests: Vec<OrderRequest>,
    ) -> Result<(Vec<Trade>, Vec<Order>), EngineError> {
        for request in &requests {
            Self::validate(request)?;
        }

        let (mut buys, mut sells): (Vec<OrderRequest>, Vec<OrderRequest>) =
            requests.into_iter().partition(|r| r.side == Side::Buy);
        let price_of = |r: &OrderRequest| r.price.unwrap_or(0.0);
        buys.sort_by(|a, b| price_of(b).total_cmp(&price_of(a)));
        sells.sort_by(|a, b| price_of(a).total_cmp(&price_of(b)));

        let mut all_trades = Vec::new();
        let mut orders = Vec::new();
        for batch in [buys, sells] {
            let mut skip_match = false;
            for request in batch {
                let mut order = Self::build_order(&request);
                let order = if skip_match && order.order_type == OrderType::Limit {
                    order.status = OrderStatus::New;
                    let snapshot = order.clone();
                    let symbol = order.symbol.clone();
                    match self.book_mut(&symbol).add_order(order) {
                        PushOutcome::Rejected(rejected) => rejected,
                        _ => snapshot,
                    }
                } else {
                    let (trades, order) = self.submit(order);
                    all_trades.extend(trades);
                    order
                };
                if order.status != OrderStatus::Filled {
                    skip_match = true;
                }
                orders.push(order);
            }
        }
        Ok((all_trades, orders))
    }

    /// Cancels a resting order, or fabricates a cancelled stub for ids the
    /// book does not hold so responses stay total.
    pub fn cancel_order(&mut self, symbol: &str, order_id: &OrderId) -> Order {
        match self.book_mut(symbol).remove_order(order_id) {
            Some(mut order) => {
                order.status = OrderStatus::Cancelled;
                order.update_timestamp = now_ms();
                debug!(symbol, order_id = %order.order_id, "order cancelled");
                order
            }
            None => Order::cancelled_stub(order_id.clone(), symbol),
        }
    }

    pub fn cancel_orders(&mut self, symbol: &str, order_ids: &[OrderId]) -> Vec<Order> {
        order_ids
            .iter()
            .map(|id| self.cancel_order(symbol, id))
            .collect()
    }

    /// Up to ten best asks followed by up to ten best bids.
    pub fn get_open_orders(&self, symbol: &str) -> Vec<Order> {
        let Some(book) = self.books.get(symbol) else {
            return Vec::new();
        };
        book.asks()
            .peek_n(OPEN_ORDERS_PER_SIDE)
            .chain(book.bids().peek_n(OPEN_ORDERS_PER_SIDE))
            .cloned()
            .collect()
    }

    pub fn get_order_book_data(&self, symbol: &str, depth: usize) -> Depth {
        match self.books.get(symbol) {
            Some(book) => book.depth(depth),
            None => Depth::empty(symbol),
        }
    }

    pub fn get_trades(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        self.tapes
            .get(symbol)
            .map(|tape| tape.recent(limit))
            .unwrap_or_default()
    }

    pub fn last_trade(&self, symbol: &str) -> Option<Trade> {
        self.tapes.get(symbol).and_then(|tape| tape.last().cloned())
    }

    pub fn get_klines(&self, symbol: &str, interval: Interval, limit: usize) -> Vec<Kline> {
        self.klines
            .get(symbol)
            .map(|series| series.recent(interval, limit))
            .unwrap_or_default()
    }

    /// Feeds the candle state directly, without a trade or book mutation.
    /// Backs the `mock` endpoint used to synthesize chart data.
    pub fn update_klines(&mut self, symbol: &str, price: f64, quantity: f64) {
        debug!(symbol, price, quantity, "mock trade into klines");
        self.klines
            .entry(symbol.to_string())
            .or_default()
            .record_at(now_ms(), price, quantity);
    }
}
