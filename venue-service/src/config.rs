//! Service configuration.

/// Symbols the venue accepts orders and subscriptions for.
pub const ALLOWED_SYMBOLS: &[&str] = &["BTCUSDT", "ETHUSDT", "JPMUSDT"];

/// Symbol assumed by public market data queries that omit one.
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

pub const BIND_ADDR: &str = "0.0.0.0:8763";

pub const DEFAULT_DEPTH_LIMIT: usize = 30;
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Concurrent websocket clients served before the oldest is evicted.
pub const WS_CLIENT_MAX: usize = 4;
pub const WS_PUSH_INTERVAL_MS: u64 = 500;
pub const WS_DEPTH_LEVELS: usize = 30;
