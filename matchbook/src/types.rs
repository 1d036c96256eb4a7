use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Wall clock in milliseconds since the epoch, the timestamp unit used on
/// every order, trade and bar.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(EngineError::UnknownSide(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

impl FromStr for OrderType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIMIT" => Ok(OrderType::Limit),
            "MARKET" => Ok(OrderType::Market),
            other => Err(EngineError::UnknownOrderType(other.to_string())),
        }
    }
}

/// Order lifecycle. An order rests on a side book iff its status is `New`
/// or `PartiallyFilled`; `Filled` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Venue-assigned order identifier. A string so cancel requests for ids the
/// venue never minted can still be echoed back in the stub response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn mint() -> Self {
        OrderId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(s.to_string())
    }
}

/// A single order. `price` is `Some` for limit orders and `None` for market
/// orders; admission validation enforces this before an order is built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: Option<f64>,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub status: OrderStatus,
    pub is_futures: bool,
    pub timestamp: u64,
    pub update_timestamp: u64,
}

impl Order {
    pub fn new(
        symbol: &str,
        side: Side,
        order_type: OrderType,
        quantity: f64,
        price: Option<f64>,
        client_order_id: Option<String>,
        is_futures: bool,
    ) -> Self {
        let now = now_ms();
        Order {
            order_id: OrderId::mint(),
            client_order_id: client_order_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            symbol: symbol.to_string(),
            side,
            order_type,
            price,
            quantity,
            filled_quantity: 0.0,
            status: OrderStatus::Pending,
            is_futures,
            timestamp: now,
            update_timestamp: now,
        }
    }

    /// Synthetic order returned for cancels of ids the book does not hold,
    /// so batch cancel responses are total.
    pub fn cancelled_stub(order_id: OrderId, symbol: &str) -> Self {
        let mut order = Order::new(symbol, Side::Buy, OrderType::Limit, 0.0, None, None, false);
        order.order_id = order_id;
        order.status = OrderStatus::Cancelled;
        order
    }

    pub fn remaining(&self) -> f64 {
        (self.quantity - self.filled_quantity).max(0.0)
    }

    /// Resting price; zero stands in for "no price" when ordering market
    /// orders inside a batch.
    pub fn limit_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Applies an execution. Overfilling an order is an engine bug, not a
    /// recoverable condition.
    pub fn fill(&mut self, quantity: f64, now: u64) {
        self.filled_quantity += quantity;
        if self.filled_quantity > self.quantity {
            let excess = self.filled_quantity - self.quantity;
            assert!(
                excess <= 1e-9 * self.quantity.max(1.0),
                "order {} filled {} beyond quantity {}",
                self.order_id,
                self.filled_quantity,
                self.quantity
            );
            // float drift from summing partial fills, snap to exact
            self.filled_quantity = self.quantity;
        }
        self.update_timestamp = now;
    }
}

/// A match between one buy and one sell order, priced at the maker's level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub timestamp: u64,
}

impl Trade {
    pub fn new(
        symbol: &str,
        price: f64,
        quantity: f64,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
    ) -> Self {
        Trade {
            trade_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            price,
            quantity,
            buy_order_id,
            sell_order_id,
            timestamp: now_ms(),
        }
    }
}

/// Aggregated resting quantity at one price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Top-of-book snapshot: best levels per side, best first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Depth {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: u64,
}

impl Depth {
    pub fn empty(symbol: &str) -> Self {
        Depth {
            symbol: symbol.to_string(),
            bids: Vec::new(),
            asks: Vec::new(),
            timestamp: now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_round_trips_wire_strings() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert!(matches!(
            "buy".parse::<Side>(),
            Err(EngineError::UnknownSide(_))
        ));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PartiallyFilled).unwrap(),
            "\"PARTIALLY_FILLED\"".to_string()
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\"".to_string()
        );
    }

    #[test]
    fn new_order_starts_pending_and_unfilled() {
        let order = Order::new(
            "BTCUSDT",
            Side::Buy,
            OrderType::Limit,
            1.5,
            Some(59000.0),
            None,
            false,
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.filled_quantity, 0.0);
        assert_eq!(order.remaining(), 1.5);
        assert!(!order.client_order_id.is_empty());
    }

    #[test]
    fn fill_tracks_remaining() {
        let mut order = Order::new(
            "BTCUSDT",
            Side::Sell,
            OrderType::Limit,
            2.0,
            Some(100.0),
            None,
            false,
        );
        order.fill(0.5, 1);
        assert_eq!(order.remaining(), 1.5);
        assert!(!order.is_filled());
        order.fill(1.5, 2);
        assert!(order.is_filled());
        assert_eq!(order.filled_quantity, 2.0);
        assert_eq!(order.update_timestamp, 2);
    }

    #[test]
    #[should_panic(expected = "beyond quantity")]
    fn overfill_aborts() {
        let mut order = Order::new(
            "BTCUSDT",
            Side::Buy,
            OrderType::Limit,
            1.0,
            Some(100.0),
            None,
            false,
        );
        order.fill(2.0, 1);
    }

    #[test]
    fn cancelled_stub_carries_requested_id() {
        let stub = Order::cancelled_stub(OrderId::from("no-such-order"), "ETHUSDT");
        assert_eq!(stub.order_id, OrderId::from("no-such-order"));
        assert_eq!(stub.symbol, "ETHUSDT");
        assert_eq!(stub.status, OrderStatus::Cancelled);
        assert_eq!(stub.quantity, 0.0);
    }
}
