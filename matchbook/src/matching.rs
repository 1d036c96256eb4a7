//! Taker/maker matching over a [`SymbolOrderBook`].
//!
//! The loop always consumes the opposite side's best order and executes at
//! the maker's price, so a taker crossing by several ticks gets price
//! improvement and never trades through FIFO priority.

use tracing::debug;

use crate::book::SymbolOrderBook;
use crate::side_book::PushOutcome;
use crate::types::{now_ms, Order, OrderStatus, OrderType, Side, Trade};

impl SymbolOrderBook {
    /// Matches an incoming order against the book and returns the trades
    /// it produced plus the taker's final state. Limit remainders rest on
    /// their own side (which may itself reject or evict per the capacity
    /// policy); market orders never rest.
    pub fn process(&mut self, order: Order) -> (Vec<Trade>, Order) {
        match order.order_type {
            OrderType::Limit => self.process_limit(order),
            OrderType::Market => self.process_market(order),
        }
    }

    fn process_limit(&mut self, mut taker: Order) -> (Vec<Trade>, Order) {
        let mut trades = Vec::new();

        while !taker.is_filled() {
            let crosses = match self.side_mut(taker.side.opposite()).peek() {
                Some(best) => match taker.side {
                    Side::Buy => best.limit_price() <= taker.limit_price(),
                    Side::Sell => best.limit_price() >= taker.limit_price(),
                },
                None => false,
            };
            if !crosses {
                break;
            }
            let Some(maker) = self.side_mut(taker.side.opposite()).pop() else {
                break;
            };
            self.execute(&mut taker, maker, &mut trades);
        }

        if taker.is_filled() {
            taker.status = OrderStatus::Filled;
            return (trades, taker);
        }

        // Park the remainder on our own side. Snapshot first: on rejection
        // the side book hands the order back cancelled, otherwise the book
        // keeps it and the caller gets the pre-insert state.
        taker.status = if taker.filled_quantity > 0.0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::New
        };
        let snapshot = taker.clone();
        match self.add_order(taker) {
            PushOutcome::Rejected(rejected) => (trades, rejected),
            PushOutcome::AddedEvicting(evicted) => {
                debug!(
                    symbol = self.symbol(),
                    evicted = %evicted.order_id,
                    "full side book, worst order evicted"
                );
                (trades, snapshot)
            }
            PushOutcome::Added => (trades, snapshot),
        }
    }

    fn process_market(&mut self, mut taker: Order) -> (Vec<Trade>, Order) {
        let mut trades = Vec::new();

        while !taker.is_filled() {
            let Some(maker) = self.side_mut(taker.side.opposite()).pop() else {
                break;
            };
            self.execute(&mut taker, maker, &mut trades);
        }

        // A market order is terminal either way: whatever the opposite side
        // could not supply is abandoned rather than left pending.
        taker.status = if taker.filled_quantity <= 0.0 {
            OrderStatus::Cancelled
        } else if taker.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        (trades, taker)
    }

    /// One execution against a popped maker: fill both orders at the
    /// maker's price, then either retire the maker or restore it to the
    /// front of its queue.
    fn execute(&mut self, taker: &mut Order, mut maker: Order, trades: &mut Vec<Trade>) {
        let fill = taker.remaining().min(maker.remaining());
        let now = now_ms();
        taker.fill(fill, now);
        maker.fill(fill, now);

        let (buy_order_id, sell_order_id) = match taker.side {
            Side::Buy => (taker.order_id.clone(), maker.order_id.clone()),
            Side::Sell => (maker.order_id.clone(), taker.order_id.clone()),
        };
        trades.push(Trade::new(
            self.symbol(),
            maker.limit_price(),
            fill,
            buy_order_id,
            sell_order_id,
        ));

        if maker.is_filled() {
            maker.status = OrderStatus::Filled;
            self.index.remove(&maker.order_id);
        } else {
            maker.status = OrderStatus::PartiallyFilled;
            self.side_mut(maker.side).push_front(maker);
        }
    }
}
