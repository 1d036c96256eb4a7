//! Central limit order book engine for a simulated trading venue.
//!
//! Core features:
//! - Price-time priority matching (best price first, then FIFO)
//! - Bounded side books that evict the worst resting order when full
//! - Per-symbol trade tape and rolling 1m/1h/1d candlestick bars
//! - One engine instance per market; spot and futures run side by side
//!
//! The engine is synchronous and single-owner. Not thread-safe on its own:
//! wrap each instance in a lock and hold it for a whole operation.

pub mod book;
pub mod engine;
pub mod error;
pub mod klines;
mod matching;
pub mod side_book;
pub mod tape;
pub mod types;

pub use book::SymbolOrderBook;
pub use engine::{Engine, OrderRequest};
pub use error::EngineError;
pub use klines::{Interval, Kline, KlineSeries, MAX_KLINE_SIZE};
pub use side_book::{PushOutcome, SideBook, SIDE_BOOK_CAPACITY};
pub use tape::{TradeTape, TAPE_CAPACITY};
pub use types::{
    now_ms, Depth, Order, OrderId, OrderStatus, OrderType, PriceLevel, Side, Trade,
};
