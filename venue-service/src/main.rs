//! Simulated trading venue: REST order entry and market data plus a
//! websocket fan-out, built on Axum.
//!
//! Two independent engine instances serve spot and futures. The REST
//! prefixes `/api/v3` and `/fapi/v1` and the websocket paths `/ws/spot`
//! and `/ws/future` select between them; everything else is shared.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};
use tokio::sync::RwLock;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

use matchbook::Engine;

mod config;
mod error;
mod handlers;
mod middleware;
mod types;
mod websocket;

use websocket::WsRegistry;

/// Which engine instance a request addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Market {
    Spot,
    Futures,
}

impl Market {
    pub fn is_futures(self) -> bool {
        matches!(self, Market::Futures)
    }
}

/// Shared state handed to every handler. Each engine sits behind its own
/// lock, held for the duration of one operation; the websocket side only
/// ever takes read snapshots.
#[derive(Clone)]
pub struct AppState {
    spot: Arc<RwLock<Engine>>,
    futures: Arc<RwLock<Engine>>,
    ws_clients: Arc<WsRegistry>,
}

impl AppState {
    fn new() -> Self {
        AppState {
            spot: Arc::new(RwLock::new(Engine::new())),
            futures: Arc::new(RwLock::new(Engine::new())),
            ws_clients: Arc::new(WsRegistry::new(config::WS_CLIENT_MAX)),
        }
    }

    pub fn engine(&self, market: Market) -> &Arc<RwLock<Engine>> {
        match market {
            Market::Spot => &self.spot,
            Market::Futures => &self.futures,
        }
    }
}

/// One market's API surface. Order entry and account routes are loopback
/// only; market data is public.
fn market_routes(market: Market) -> Router<AppState> {
    let private = Router::new()
        .route(
            "/order",
            post(handlers::new_order).delete(handlers::cancel_orders),
        )
        .route("/batchOrders", post(handlers::new_batch_orders))
        .route("/openOrders", get(handlers::open_orders))
        .route("/mock", post(handlers::mock_trade))
        .route_layer(axum_middleware::from_fn(middleware::local_only));

    let public = Router::new()
        .route("/depth", get(handlers::depth))
        .route("/ticker/price", get(handlers::ticker_price))
        .route("/klines", get(handlers::klines))
        .route("/trades", get(handlers::trades));

    private.merge(public).layer(Extension(market))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let state = AppState::new();

    let app = Router::new()
        .nest("/api/v3", market_routes(Market::Spot))
        .nest("/fapi/v1", market_routes(Market::Futures))
        .route("/ws/spot", get(websocket::spot_stream))
        .route("/ws/future", get(websocket::futures_stream))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config::BIND_ADDR)
        .await
        .unwrap();

    info!("venue listening on http://{}", config::BIND_ADDR);
    info!("spot API under /api/v3, futures API under /fapi/v1");
    info!("market data streams at /ws/spot and /ws/future");
    info!("allowed symbols: {}", config::ALLOWED_SYMBOLS.join(", "));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
