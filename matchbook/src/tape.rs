use std::collections::VecDeque;

use crate::types::Trade;

/// Most recent trades retained per symbol.
pub const TAPE_CAPACITY: usize = 1000;

/// Append-only log of a symbol's most recent trades, oldest first.
#[derive(Default)]
pub struct TradeTape {
    trades: VecDeque<Trade>,
}

impl TradeTape {
    pub fn new() -> Self {
        TradeTape::default()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push_back(trade);
        while self.trades.len() > TAPE_CAPACITY {
            self.trades.pop_front();
        }
    }

    /// Last `limit` trades in chronological order.
    pub fn recent(&self, limit: usize) -> Vec<Trade> {
        let skip = self.trades.len().saturating_sub(limit);
        self.trades.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderId;

    fn trade(price: f64, seq: u64) -> Trade {
        let mut t = Trade::new(
            "BTCUSDT",
            price,
            1.0,
            OrderId::from("buy"),
            OrderId::from("sell"),
        );
        t.timestamp = seq;
        t
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut tape = TradeTape::new();
        for i in 0..5 {
            tape.record(trade(100.0 + i as f64, i));
        }
        let recent = tape.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].price, 102.0);
        assert_eq!(recent[2].price, 104.0);

        // limit larger than the tape returns everything
        assert_eq!(tape.recent(100).len(), 5);
    }

    #[test]
    fn tape_is_bounded() {
        let mut tape = TradeTape::new();
        for i in 0..(TAPE_CAPACITY as u64 + 25) {
            tape.record(trade(1.0, i));
        }
        assert_eq!(tape.len(), TAPE_CAPACITY);
        // oldest 25 were dropped
        assert_eq!(tape.recent(TAPE_CAPACITY)[0].timestamp, 25);
    }

    #[test]
    fn timestamps_non_decreasing() {
        let mut tape = TradeTape::new();
        for i in 0..10 {
            tape.record(trade(1.0, i / 2));
        }
        let all = tape.recent(usize::MAX);
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
