use std::collections::HashMap;

use crate::side_book::{PushOutcome, SideBook};
use crate::types::{now_ms, Depth, Order, OrderId, PriceLevel, Side};

/// Both sides of one symbol plus an id index over everything resting.
///
/// The index key set always equals the union of order ids held by the two
/// side books; `add_order`/`remove_order` keep the three in lockstep,
/// including across capacity evictions.
pub struct SymbolOrderBook {
    symbol: String,
    pub(crate) bids: SideBook,
    pub(crate) asks: SideBook,
    pub(crate) index: HashMap<OrderId, Side>,
}

impl SymbolOrderBook {
    pub fn new(symbol: &str) -> Self {
        SymbolOrderBook {
            symbol: symbol.to_string(),
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
            index: HashMap::new(),
        }
    }

    /// Same book with smaller side books, for exercising the capacity
    /// policy without pushing 200 orders.
    pub fn with_side_capacity(symbol: &str, capacity: usize) -> Self {
        SymbolOrderBook {
            symbol: symbol.to_string(),
            bids: SideBook::with_capacity(Side::Buy, capacity),
            asks: SideBook::with_capacity(Side::Sell, capacity),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bids(&self) -> &SideBook {
        &self.bids
    }

    pub fn asks(&self) -> &SideBook {
        &self.asks
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Rests an order on its side book and indexes it. The push outcome is
    /// surfaced so callers can report rejected or evicted orders.
    pub fn add_order(&mut self, order: Order) -> PushOutcome {
        let side = order.side;
        let order_id = order.order_id.clone();
        let outcome = self.side_mut(side).push(order);
        match &outcome {
            PushOutcome::Added => {
                self.index.insert(order_id, side);
            }
            PushOutcome::AddedEvicting(evicted) => {
                self.index.remove(&evicted.order_id);
                self.index.insert(order_id, side);
            }
            PushOutcome::Rejected(_) => {}
        }
        outcome
    }

    /// Removes a resting order, returning it, or `None` for unknown ids.
    pub fn remove_order(&mut self, order_id: &OrderId) -> Option<Order> {
        let side = self.index.remove(order_id)?;
        let removed = self.side_mut(side).remove(order_id);
        debug_assert!(removed.is_some(), "indexed order missing from side book");
        removed
    }

    pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
        let side = *self.index.get(order_id)?;
        self.side(side).iter().find(|o| &o.order_id == order_id)
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.peek().map(|o| o.limit_price())
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.peek().map(|o| o.limit_price())
    }

    /// Top-`levels` snapshot of `(price, remaining quantity)` per side.
    pub fn depth(&self, levels: usize) -> Depth {
        Depth {
            symbol: self.symbol.clone(),
            bids: aggregate_levels(&self.bids, levels),
            asks: aggregate_levels(&self.asks, levels),
            timestamp: now_ms(),
        }
    }
}

/// Folds the side's sorted orders into price levels. Orders at one price
/// are contiguous, so a single pass merging into the tail level suffices.
fn aggregate_levels(side: &SideBook, levels: usize) -> Vec<PriceLevel> {
    let mut out: Vec<PriceLevel> = Vec::new();
    for order in side.iter() {
        let remaining = order.remaining();
        if remaining <= 0.0 {
            continue;
        }
        let price = order.limit_price();
        let merged = match out.last_mut() {
            Some(level) if level.price == price => {
                level.quantity += remaining;
                true
            }
            _ => false,
        };
        if !merged {
            if out.len() == levels {
                break;
            }
            out.push(PriceLevel {
                price,
                quantity: remaining,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderType;

    fn limit(side: Side, price: f64, qty: f64) -> Order {
        Order::new("BTCUSDT", side, OrderType::Limit, qty, Some(price), None, false)
    }

    #[test]
    fn add_and_remove_keep_index_consistent() {
        let mut book = SymbolOrderBook::new("BTCUSDT");
        let bid = limit(Side::Buy, 59000.0, 1.0);
        let ask = limit(Side::Sell, 59100.0, 2.0);
        let bid_id = bid.order_id.clone();
        let ask_id = ask.order_id.clone();

        book.add_order(bid);
        book.add_order(ask);
        assert_eq!(book.order_count(), 2);
        assert!(book.get_order(&bid_id).is_some());

        let removed = book.remove_order(&bid_id).unwrap();
        assert_eq!(removed.order_id, bid_id);
        assert_eq!(book.order_count(), 1);
        assert!(book.get_order(&bid_id).is_none());
        assert!(book.remove_order(&bid_id).is_none());
        assert!(book.get_order(&ask_id).is_some());
    }

    #[test]
    fn eviction_unindexes_the_displaced_order() {
        let mut book = SymbolOrderBook::with_side_capacity("BTCUSDT", 2);
        let doomed = limit(Side::Buy, 10.0, 1.0);
        let doomed_id = doomed.order_id.clone();
        book.add_order(doomed);
        book.add_order(limit(Side::Buy, 20.0, 1.0));
        book.add_order(limit(Side::Buy, 30.0, 1.0));

        assert_eq!(book.order_count(), 2);
        assert!(book.get_order(&doomed_id).is_none());
        assert_eq!(book.best_bid(), Some(30.0));
    }

    #[test]
    fn rejected_order_is_never_indexed() {
        let mut book = SymbolOrderBook::with_side_capacity("BTCUSDT", 1);
        book.add_order(limit(Side::Sell, 100.0, 1.0));
        let worse = limit(Side::Sell, 101.0, 1.0);
        let worse_id = worse.order_id.clone();
        book.add_order(worse);

        assert_eq!(book.order_count(), 1);
        assert!(book.get_order(&worse_id).is_none());
    }

    #[test]
    fn depth_aggregates_remaining_quantity_per_price() {
        let mut book = SymbolOrderBook::new("BTCUSDT");
        book.add_order(limit(Side::Buy, 59000.0, 1.0));
        book.add_order(limit(Side::Buy, 59000.0, 2.0));
        book.add_order(limit(Side::Buy, 58900.0, 5.0));
        let mut partially = limit(Side::Sell, 59100.0, 4.0);
        partially.fill(1.5, 1);
        book.add_order(partially);

        let depth = book.depth(10);
        assert_eq!(depth.bids.len(), 2);
        assert_eq!(depth.bids[0].price, 59000.0);
        assert_eq!(depth.bids[0].quantity, 3.0);
        assert_eq!(depth.bids[1].price, 58900.0);
        assert_eq!(depth.asks.len(), 1);
        assert_eq!(depth.asks[0].quantity, 2.5);
    }

    #[test]
    fn depth_truncates_to_requested_levels() {
        let mut book = SymbolOrderBook::new("BTCUSDT");
        for i in 0..5 {
            book.add_order(limit(Side::Sell, 100.0 + i as f64, 1.0));
        }
        let depth = book.depth(3);
        assert_eq!(depth.asks.len(), 3);
        assert_eq!(depth.asks[0].price, 100.0);
        assert_eq!(depth.asks[2].price, 102.0);
        assert!(depth.bids.is_empty());
    }
}
