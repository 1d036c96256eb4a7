//! Websocket market data fan-out.
//!
//! Clients send `{"method": "SUBSCRIBE", "params": ["BTCUSDT@depth"]}`
//! style frames. Depth snapshots push on a fixed cadence per subscribed
//! symbol; trade events are filtered by a per-connection high-watermark
//! timestamp so each trade is delivered once. At most `WS_CLIENT_MAX`
//! connections are served and a newcomer beyond that evicts the oldest.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::task::AbortHandle;
use tokio::time::interval;
use tracing::{info, warn};

use matchbook::now_ms;

use crate::types::{DepthUpdateEvent, SubscribeFrame, TradeEvent};
use crate::{config, AppState, Market};

/// Live connection tasks, oldest first.
pub struct WsRegistry {
    max_clients: usize,
    connections: Mutex<Vec<AbortHandle>>,
}

impl WsRegistry {
    pub fn new(max_clients: usize) -> Self {
        WsRegistry {
            max_clients,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Registers a connection task, aborting the oldest live one when the
    /// table is full.
    fn admit(&self, handle: AbortHandle) {
        let mut connections = self.connections.lock().unwrap();
        connections.retain(|h| !h.is_finished());
        while connections.len() >= self.max_clients {
            let oldest = connections.remove(0);
            warn!("websocket client limit reached, evicting oldest connection");
            oldest.abort();
        }
        connections.push(handle);
    }
}

pub async fn spot_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    stream(ws, state, Market::Spot)
}

pub async fn futures_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    stream(ws, state, Market::Futures)
}

fn stream(ws: WebSocketUpgrade, state: AppState, market: Market) -> Response {
    ws.on_upgrade(move |socket| async move {
        let task = tokio::spawn(run_connection(socket, state.clone(), market));
        state.ws_clients.admit(task.abort_handle());
        // JoinError on eviction is expected, the client was cut off
        let _ = task.await;
    })
}

async fn run_connection(socket: WebSocket, state: AppState, market: Market) {
    info!(?market, "new market data connection");

    let (mut sender, mut receiver) = socket.split();
    let mut depth_subs: HashSet<String> = HashSet::new();
    let mut trade_subs: HashSet<String> = HashSet::new();
    let mut trade_watermark: u64 = 0;
    let mut push = interval(Duration::from_millis(config::WS_PUSH_INTERVAL_MS));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        apply_subscribe(&text, &mut depth_subs, &mut trade_subs);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(?market, "websocket error: {e}");
                        break;
                    }
                }
            }

            _ = push.tick() => {
                let frames = collect_updates(
                    &state,
                    market,
                    &depth_subs,
                    &trade_subs,
                    &mut trade_watermark,
                )
                .await;

                let mut closed = false;
                for frame in frames {
                    if sender.send(Message::Text(frame)).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
        }
    }

    info!(?market, "market data connection closed");
}

fn apply_subscribe(text: &str, depth_subs: &mut HashSet<String>, trade_subs: &mut HashSet<String>) {
    let Ok(frame) = serde_json::from_str::<SubscribeFrame>(text) else {
        return;
    };
    if frame.method != "SUBSCRIBE" {
        return;
    }
    for param in frame.params {
        let Some((symbol, channel)) = param.split_once('@') else {
            continue;
        };
        if !config::ALLOWED_SYMBOLS.contains(&symbol) {
            continue;
        }
        if channel.contains("depth") {
            depth_subs.insert(symbol.to_string());
        } else if channel.contains("trade") {
            trade_subs.insert(symbol.to_string());
        }
    }
}

/// Builds the frames for one push tick. Snapshots are taken under the
/// engine read lock and serialized before anything touches the socket, so
/// the lock is never held across a send.
async fn collect_updates(
    state: &AppState,
    market: Market,
    depth_subs: &HashSet<String>,
    trade_subs: &HashSet<String>,
    trade_watermark: &mut u64,
) -> Vec<String> {
    let mut frames = Vec::new();
    let engine = state.engine(market).read().await;

    for symbol in depth_subs {
        let depth = engine.get_order_book_data(symbol, config::WS_DEPTH_LEVELS);
        let event = DepthUpdateEvent {
            e: "depthUpdate",
            event_time: now_ms(),
            s: symbol.clone(),
            b: depth.bids,
            a: depth.asks,
        };
        if let Ok(json) = serde_json::to_string(&event) {
            frames.push(json);
        }
    }

    let mut newest = *trade_watermark;
    for symbol in trade_subs {
        for trade in engine.get_trades(symbol, config::DEFAULT_LIST_LIMIT) {
            if trade.timestamp <= *trade_watermark {
                continue;
            }
            newest = newest.max(trade.timestamp);
            let event = TradeEvent {
                e: "trade",
                event_time: now_ms(),
                id: trade.trade_id.clone(),
                s: symbol.clone(),
                p: trade.price.to_string(),
                q: trade.quantity.to_string(),
                trade_time: trade.timestamp,
            };
            if let Ok(json) = serde_json::to_string(&event) {
                frames.push(json);
            }
        }
    }
    drop(engine);

    *trade_watermark = newest;
    frames
}
