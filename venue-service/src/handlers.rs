//! REST handlers, shared by the spot and futures prefixes. Which engine a
//! request addresses comes in as a [`Market`] extension; everything else is
//! identical between the two.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use matchbook::{now_ms, Interval, OrderId, OrderRequest, OrderType, Side};

use crate::config;
use crate::error::ApiError;
use crate::types::{
    BatchOrdersBody, CancelQuery, DepthPayload, DepthQuery, KlinePayload, KlinesQuery,
    MockTradeBody, NewOrderBody, OrderPayload, SymbolQuery, TickerPayload, TradePayload,
    TradesQuery,
};
use crate::{AppState, Market};

type ApiResult = Result<Json<Value>, ApiError>;

fn ok(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "code": 200, "data": data }))
}

fn validated_symbol(symbol: Option<&str>) -> Result<String, ApiError> {
    match symbol {
        Some(symbol) if config::ALLOWED_SYMBOLS.contains(&symbol) => Ok(symbol.to_string()),
        Some(symbol) => Err(ApiError::SymbolNotAllowed(symbol.to_string())),
        None => Err(ApiError::BadRequest("symbol is required".to_string())),
    }
}

/// Public market data routes fall back to the default symbol.
fn default_symbol(symbol: Option<&str>) -> Result<String, ApiError> {
    validated_symbol(symbol.or(Some(config::DEFAULT_SYMBOL)))
}

fn require<'a>(value: &'a Option<Value>, field: &str) -> Result<&'a Value, ApiError> {
    value
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

/// Accepts JSON numbers and decimal strings.
fn parse_number(value: &Value, field: &str) -> Result<f64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::BadRequest(format!("malformed {field}: {value}")))
}

/// Optional price; absent, null and zero all mean "no price".
fn parse_price(value: &Option<Value>) -> Result<Option<f64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => {
            let price = parse_number(raw, "price")?;
            Ok(if price == 0.0 { None } else { Some(price) })
        }
    }
}

fn order_request(body: &NewOrderBody, market: Market) -> Result<OrderRequest, ApiError> {
    let symbol = validated_symbol(body.symbol.as_deref())?;
    let side = body
        .side
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("side is required".to_string()))?
        .parse::<Side>()?;
    let order_type = body
        .order_type
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("type is required".to_string()))?
        .parse::<OrderType>()?;
    let quantity = parse_number(require(&body.quantity, "quantity")?, "quantity")?;
    let price = parse_price(&body.price)?;

    Ok(OrderRequest {
        symbol,
        side,
        order_type,
        quantity,
        price,
        client_order_id: body.client_order_id.clone(),
        is_futures: market.is_futures(),
    })
}

pub async fn new_order(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Json(body): Json<NewOrderBody>,
) -> ApiResult {
    let request = order_request(&body, market)?;
    let mut engine = state.engine(market).write().await;
    let (_trades, order) = engine.create_order(request)?;
    Ok(ok(OrderPayload::from(&order)))
}

pub async fn new_batch_orders(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Json(body): Json<BatchOrdersBody>,
) -> ApiResult {
    let requests = body
        .batch_orders
        .iter()
        .map(|item| order_request(item, market))
        .collect::<Result<Vec<_>, _>>()?;

    let mut engine = state.engine(market).write().await;
    let (_trades, orders) = engine.create_orders(requests)?;
    Ok(ok(orders.iter().map(OrderPayload::from).collect::<Vec<_>>()))
}

pub async fn cancel_orders(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<CancelQuery>,
) -> ApiResult {
    let symbol = validated_symbol(query.symbol.as_deref())?;
    let order_ids: Vec<OrderId> = query
        .order_ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|id| !id.is_empty())
        .map(OrderId::from)
        .collect();

    let mut engine = state.engine(market).write().await;
    let cancelled = engine.cancel_orders(&symbol, &order_ids);
    Ok(ok(cancelled
        .iter()
        .map(OrderPayload::from)
        .collect::<Vec<_>>()))
}

pub async fn open_orders(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult {
    let symbol = validated_symbol(query.symbol.as_deref())?;
    let engine = state.engine(market).read().await;
    let orders = engine.get_open_orders(&symbol);
    Ok(ok(orders.iter().map(OrderPayload::from).collect::<Vec<_>>()))
}

/// Feeds the candle aggregator without touching the book, so charts can be
/// seeded with synthetic history.
pub async fn mock_trade(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Json(body): Json<MockTradeBody>,
) -> ApiResult {
    let symbol = validated_symbol(body.symbol.as_deref())?;
    let price = parse_number(require(&body.price, "price")?, "price")?;
    let quantity = parse_number(require(&body.quantity, "quantity")?, "quantity")?;

    state
        .engine(market)
        .write()
        .await
        .update_klines(&symbol, price, quantity);

    Ok(ok(json!({
        "symbol": symbol,
        "side": body.side,
        "price": price,
        "quantity": quantity,
        "status": "FILLED",
    })))
}

pub async fn depth(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<DepthQuery>,
) -> ApiResult {
    let symbol = default_symbol(query.symbol.as_deref())?;
    let limit = query.limit.unwrap_or(config::DEFAULT_DEPTH_LIMIT);
    let depth = state
        .engine(market)
        .read()
        .await
        .get_order_book_data(&symbol, limit);

    Ok(ok(DepthPayload {
        last_update_id: now_ms(),
        bids: depth.bids,
        asks: depth.asks,
    }))
}

pub async fn ticker_price(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult {
    let symbol = default_symbol(query.symbol.as_deref())?;
    let last = state
        .engine(market)
        .read()
        .await
        .last_trade(&symbol)
        .ok_or_else(|| ApiError::NotTraded(symbol.clone()))?;

    Ok(ok(TickerPayload {
        symbol,
        price: last.price.to_string(),
        quantity: last.quantity.to_string(),
    }))
}

pub async fn klines(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<KlinesQuery>,
) -> ApiResult {
    let symbol = default_symbol(query.symbol.as_deref())?;
    let interval = query.interval.as_deref().unwrap_or("1m").parse::<Interval>()?;
    let limit = query.limit.unwrap_or(config::DEFAULT_LIST_LIMIT);

    let bars = state
        .engine(market)
        .read()
        .await
        .get_klines(&symbol, interval, limit);
    Ok(ok(bars.iter().map(KlinePayload::from).collect::<Vec<_>>()))
}

pub async fn trades(
    State(state): State<AppState>,
    Extension(market): Extension<Market>,
    Query(query): Query<TradesQuery>,
) -> ApiResult {
    let symbol = default_symbol(query.symbol.as_deref())?;
    let limit = query.limit.unwrap_or(config::DEFAULT_LIST_LIMIT);

    let trades = state.engine(market).read().await.get_trades(&symbol, limit);
    Ok(ok(trades.iter().map(TradePayload::from).collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_validation() {
        assert_eq!(validated_symbol(Some("BTCUSDT")).unwrap(), "BTCUSDT");
        assert!(matches!(
            validated_symbol(Some("DOGEUSDT")),
            Err(ApiError::SymbolNotAllowed(_))
        ));
        assert!(matches!(
            validated_symbol(None),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(default_symbol(None).unwrap(), config::DEFAULT_SYMBOL);
    }

    #[test]
    fn numbers_parse_from_numbers_and_strings() {
        assert_eq!(parse_number(&json!(1.5), "quantity").unwrap(), 1.5);
        assert_eq!(parse_number(&json!("59000.5"), "price").unwrap(), 59000.5);
        assert!(parse_number(&json!("abc"), "price").is_err());
        assert!(parse_number(&json!(true), "price").is_err());
    }

    #[test]
    fn zero_and_missing_prices_collapse_to_none() {
        assert_eq!(parse_price(&None).unwrap(), None);
        assert_eq!(parse_price(&Some(Value::Null)).unwrap(), None);
        assert_eq!(parse_price(&Some(json!(0))).unwrap(), None);
        assert_eq!(parse_price(&Some(json!("0"))).unwrap(), None);
        assert_eq!(parse_price(&Some(json!(59000.0))).unwrap(), Some(59000.0));
    }

    #[test]
    fn order_request_maps_market_flag() {
        let body = NewOrderBody {
            symbol: Some("BTCUSDT".to_string()),
            side: Some("BUY".to_string()),
            order_type: Some("LIMIT".to_string()),
            quantity: Some(json!("1.0")),
            price: Some(json!(59000)),
            client_order_id: None,
        };
        let request = order_request(&body, Market::Futures).unwrap();
        assert!(request.is_futures);
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.price, Some(59000.0));

        let bad_side = NewOrderBody {
            side: Some("HOLD".to_string()),
            ..body
        };
        assert!(matches!(
            order_request(&bad_side, Market::Spot),
            Err(ApiError::BadRequest(_))
        ));
    }
}
