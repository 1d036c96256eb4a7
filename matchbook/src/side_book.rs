use std::collections::VecDeque;

use crate::types::{Order, OrderId, OrderStatus, Side};

/// Resting orders held per side, per symbol.
pub const SIDE_BOOK_CAPACITY: usize = 200;

/// Outcome of a `push`. The book mutates order statuses on rejection and
/// eviction, so callers get the affected orders back rather than a bool.
#[derive(Debug)]
pub enum PushOutcome {
    Added,
    /// Inserted, displacing the worst resting order (now `Cancelled`).
    AddedEvicting(Order),
    /// Book full and the incoming order did not outrank the worst resting
    /// one; the order comes back `Cancelled` and was never inserted.
    Rejected(Order),
}

/// One side of a symbol's book: a bounded queue of resting orders kept
/// sorted best-first, FIFO within a price.
///
/// Bids sort by price descending, asks ascending. Insertion walks inward
/// from the tail, so an arrival at an already-occupied price lands behind
/// the orders that were there first. When the book is full the worst
/// resting order makes room for a better-priced arrival and anything else
/// is turned away.
pub struct SideBook {
    side: Side,
    capacity: usize,
    orders: VecDeque<Order>,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self::with_capacity(side, SIDE_BOOK_CAPACITY)
    }

    pub fn with_capacity(side: Side, capacity: usize) -> Self {
        SideBook {
            side,
            capacity,
            orders: VecDeque::with_capacity(capacity),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Best resting order without removing it.
    pub fn peek(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Removes and returns the best resting order.
    pub fn pop(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Restores a partially filled maker to the head of the queue. It was
    /// the best order and remains so at its price, ahead of equal-priced
    /// arrivals that came later.
    pub fn push_front(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        self.orders.push_front(order);
    }

    /// True when `price` ranks strictly better than `than` for this side.
    fn outranks(&self, price: f64, than: f64) -> bool {
        match self.side {
            Side::Buy => price > than,
            Side::Sell => price < than,
        }
    }

    /// Inserts in sorted position, applying the capacity policy first: a
    /// full book rejects an order no better than its worst, otherwise
    /// evicts the worst to make room.
    pub fn push(&mut self, mut order: Order) -> PushOutcome {
        debug_assert_eq!(order.side, self.side);
        let price = order.limit_price();

        let mut evicted = None;
        if self.orders.len() >= self.capacity {
            let worst_price = match self.orders.back() {
                Some(worst) => worst.limit_price(),
                None => {
                    // capacity 0, nothing can rest
                    order.status = OrderStatus::Cancelled;
                    return PushOutcome::Rejected(order);
                }
            };
            if !self.outranks(price, worst_price) {
                order.status = OrderStatus::Cancelled;
                return PushOutcome::Rejected(order);
            }
            if let Some(mut worst) = self.orders.pop_back() {
                worst.status = OrderStatus::Cancelled;
                evicted = Some(worst);
            }
        }

        // Walk inward from the tail; stopping at the first order we do not
        // outrank keeps equal prices in arrival order.
        let mut idx = self.orders.len();
        while idx > 0 && self.outranks(price, self.orders[idx - 1].limit_price()) {
            idx -= 1;
        }
        self.orders.insert(idx, order);

        match evicted {
            Some(worst) => PushOutcome::AddedEvicting(worst),
            None => PushOutcome::Added,
        }
    }

    /// Linear scan removal by id.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let idx = self.orders.iter().position(|o| &o.order_id == order_id)?;
        self.orders.remove(idx)
    }

    /// Up to `n` best orders, best first.
    pub fn peek_n(&self, n: usize) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter().take(n)
    }

    /// All resting orders, best first.
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderType;

    fn limit(side: Side, price: f64, qty: f64) -> Order {
        Order::new("BTCUSDT", side, OrderType::Limit, qty, Some(price), None, false)
    }

    #[test]
    fn new_empty() {
        let bids = SideBook::new(Side::Buy);
        assert!(bids.is_empty());
        assert!(bids.peek().is_none());
        let asks = SideBook::new(Side::Sell);
        assert!(asks.peek().is_none());
    }

    #[test]
    fn bids_sort_descending() {
        let mut bids = SideBook::new(Side::Buy);
        for price in [50.0, 70.0, 60.0] {
            bids.push(limit(Side::Buy, price, 1.0));
        }
        let prices: Vec<f64> = bids.iter().map(|o| o.limit_price()).collect();
        assert_eq!(prices, vec![70.0, 60.0, 50.0]);
        assert_eq!(bids.peek().unwrap().limit_price(), 70.0);
    }

    #[test]
    fn asks_sort_ascending() {
        let mut asks = SideBook::new(Side::Sell);
        for price in [105.0, 101.0, 103.0] {
            asks.push(limit(Side::Sell, price, 1.0));
        }
        let prices: Vec<f64> = asks.iter().map(|o| o.limit_price()).collect();
        assert_eq!(prices, vec![101.0, 103.0, 105.0]);
    }

    #[test]
    fn equal_prices_keep_arrival_order() {
        let mut bids = SideBook::new(Side::Buy);
        let first = limit(Side::Buy, 50.0, 1.0);
        let second = limit(Side::Buy, 50.0, 2.0);
        let first_id = first.order_id.clone();
        let second_id = second.order_id.clone();
        bids.push(first);
        bids.push(second);
        // a better-priced order ahead, a worse one behind
        bids.push(limit(Side::Buy, 51.0, 1.0));
        bids.push(limit(Side::Buy, 49.0, 1.0));

        let ids: Vec<OrderId> = bids.iter().map(|o| o.order_id.clone()).collect();
        assert_eq!(ids[1], first_id);
        assert_eq!(ids[2], second_id);
    }

    #[test]
    fn pop_returns_best_and_shrinks() {
        let mut asks = SideBook::new(Side::Sell);
        asks.push(limit(Side::Sell, 102.0, 1.0));
        asks.push(limit(Side::Sell, 101.0, 1.0));
        let best = asks.pop().unwrap();
        assert_eq!(best.limit_price(), 101.0);
        assert_eq!(asks.len(), 1);
        assert_eq!(asks.peek().unwrap().limit_price(), 102.0);
    }

    #[test]
    fn full_book_evicts_worst_for_better_price() {
        let mut bids = SideBook::with_capacity(Side::Buy, 3);
        for price in [10.0, 20.0, 30.0] {
            assert!(matches!(bids.push(limit(Side::Buy, price, 1.0)), PushOutcome::Added));
        }
        let outcome = bids.push(limit(Side::Buy, 40.0, 1.0));
        let evicted = match outcome {
            PushOutcome::AddedEvicting(order) => order,
            other => panic!("expected eviction, got {other:?}"),
        };
        assert_eq!(evicted.limit_price(), 10.0);
        assert_eq!(evicted.status, OrderStatus::Cancelled);

        let prices: Vec<f64> = bids.iter().map(|o| o.limit_price()).collect();
        assert_eq!(prices, vec![40.0, 30.0, 20.0]);
    }

    #[test]
    fn full_book_rejects_order_no_better_than_worst() {
        let mut asks = SideBook::with_capacity(Side::Sell, 2);
        asks.push(limit(Side::Sell, 100.0, 1.0));
        asks.push(limit(Side::Sell, 110.0, 1.0));

        // equal to the worst is not better
        let outcome = asks.push(limit(Side::Sell, 110.0, 1.0));
        let rejected = match outcome {
            PushOutcome::Rejected(order) => order,
            other => panic!("expected rejection, got {other:?}"),
        };
        assert_eq!(rejected.status, OrderStatus::Cancelled);
        assert_eq!(asks.len(), 2);
    }

    #[test]
    fn remove_by_id() {
        let mut bids = SideBook::new(Side::Buy);
        let target = limit(Side::Buy, 60.0, 1.0);
        let target_id = target.order_id.clone();
        bids.push(limit(Side::Buy, 70.0, 1.0));
        bids.push(target);
        bids.push(limit(Side::Buy, 50.0, 1.0));

        let removed = bids.remove(&target_id).unwrap();
        assert_eq!(removed.order_id, target_id);
        assert_eq!(bids.len(), 2);
        assert!(bids.remove(&target_id).is_none());
    }

    #[test]
    fn peek_n_caps_at_len() {
        let mut asks = SideBook::new(Side::Sell);
        for price in [101.0, 102.0, 103.0] {
            asks.push(limit(Side::Sell, price, 1.0));
        }
        assert_eq!(asks.peek_n(2).count(), 2);
        assert_eq!(asks.peek_n(10).count(), 3);
        assert_eq!(asks.peek_n(10).next().unwrap().limit_price(), 101.0);
    }
}
