//! Wire types for the REST and websocket surfaces.

use matchbook::{Kline, Order, OrderId, OrderStatus, OrderType, PriceLevel, Side, Trade};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST `order` body. Numeric fields arrive as JSON numbers or decimal
/// strings, so they stay raw until the handler parses them.
#[derive(Debug, Deserialize)]
pub struct NewOrderBody {
    pub symbol: Option<String>,
    pub side: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,
    pub client_order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchOrdersBody {
    #[serde(rename = "batchOrders", default)]
    pub batch_orders: Vec<NewOrderBody>,
}

#[derive(Debug, Deserialize)]
pub struct MockTradeBody {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub price: Option<Value>,
    pub quantity: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub symbol: Option<String>,
    #[serde(rename = "orderIds")]
    pub order_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepthQuery {
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct KlinesQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

/// Order as echoed by the order, batch and cancel endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub symbol: String,
    pub order_id: OrderId,
    pub client_order_id: String,
    pub transact_time: u64,
    pub price: Option<f64>,
    pub orig_qty: f64,
    pub executed_qty: f64,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        OrderPayload {
            symbol: order.symbol.clone(),
            order_id: order.order_id.clone(),
            client_order_id: order.client_order_id.clone(),
            transact_time: order.timestamp,
            price: order.price,
            orig_qty: order.quantity,
            executed_qty: order.filled_quantity,
            status: order.status,
            order_type: order.order_type,
            side: order.side,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DepthPayload {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Serialize)]
pub struct TradePayload {
    pub id: String,
    pub price: String,
    pub quantity: String,
    pub time: u64,
    #[serde(rename = "isBuyerMaker")]
    pub is_buyer_maker: bool,
}

impl From<&Trade> for TradePayload {
    fn from(trade: &Trade) -> Self {
        TradePayload {
            id: trade.trade_id.clone(),
            price: trade.price.to_string(),
            quantity: trade.quantity.to_string(),
            time: trade.timestamp,
            is_buyer_maker: false,
        }
    }
}

/// Bar fields keyed the compact way charting clients expect, prices as
/// decimal strings.
#[derive(Debug, Serialize)]
pub struct KlinePayload {
    pub ot: u64,
    pub o: String,
    pub h: String,
    pub l: String,
    pub c: String,
    pub v: String,
    pub ct: u64,
    pub a: String,
}

impl From<&Kline> for KlinePayload {
    fn from(bar: &Kline) -> Self {
        KlinePayload {
            ot: bar.open_time,
            o: bar.open.to_string(),
            h: bar.high.to_string(),
            l: bar.low.to_string(),
            c: bar.close.to_string(),
            v: bar.volume.to_string(),
            ct: bar.close_time,
            a: bar.quote_volume.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TickerPayload {
    pub symbol: String,
    pub price: String,
    pub quantity: String,
}

/// Periodic depth push on the websocket stream.
#[derive(Debug, Serialize)]
pub struct DepthUpdateEvent {
    pub e: &'static str,
    #[serde(rename = "E")]
    pub event_time: u64,
    pub s: String,
    pub b: Vec<PriceLevel>,
    pub a: Vec<PriceLevel>,
}

/// Per-trade push on the websocket stream.
#[derive(Debug, Serialize)]
pub struct TradeEvent {
    pub e: &'static str,
    #[serde(rename = "E")]
    pub event_time: u64,
    pub id: String,
    pub s: String,
    pub p: String,
    pub q: String,
    #[serde(rename = "C")]
    pub trade_time: u64,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeFrame {
    pub method: String,
    #[serde(default)]
    pub params: Vec<String>,
}
