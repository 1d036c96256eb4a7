use clap::{Parser, Subcommand};
use matchbook::Side;
use serde::Deserialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "venue-cli")]
#[command(about = "Command line client for the simulated trading venue")]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8763")]
    server: String,
    /// Target the futures book instead of spot
    #[arg(long)]
    futures: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a single order
    Order {
        #[arg(short, long)]
        symbol: String,
        #[arg(long, value_parser = parse_side)]
        side: Side,
        #[arg(short = 't', long, default_value = "LIMIT")]
        order_type: String,
        #[arg(short, long)]
        quantity: f64,
        #[arg(short, long)]
        price: Option<f64>,
    },
    /// Submit a JSON array of orders as one batch
    Batch {
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
    /// Cancel orders by id
    Cancel {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, value_delimiter = ',')]
        order_ids: Vec<String>,
    },
    /// List resting orders
    OpenOrders {
        #[arg(short, long)]
        symbol: String,
    },
    Depth {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    Trades {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    Klines {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value = "1m")]
        interval: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    Ticker {
        #[arg(short, long)]
        symbol: String,
    },
    /// Feed a synthetic trade into the candle data
    Mock {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        price: f64,
        #[arg(short, long)]
        quantity: f64,
    },
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: u16,
    data: Option<T>,
    msg: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload {
    symbol: String,
    order_id: String,
    client_order_id: String,
    transact_time: u64,
    price: Option<f64>,
    orig_qty: f64,
    executed_qty: f64,
    status: String,
    #[serde(rename = "type")]
    order_type: String,
    side: String,
}

#[derive(Deserialize)]
struct PriceLevel {
    price: f64,
    quantity: f64,
}

#[derive(Deserialize)]
struct DepthPayload {
    #[serde(rename = "lastUpdateId")]
    last_update_id: u64,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

#[derive(Deserialize)]
struct TradePayload {
    id: String,
    price: String,
    quantity: String,
    time: u64,
}

#[derive(Deserialize)]
struct KlinePayload {
    ot: u64,
    o: String,
    h: String,
    l: String,
    c: String,
    v: String,
}

#[derive(Deserialize)]
struct TickerPayload {
    symbol: String,
    price: String,
    quantity: String,
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_lowercase().as_str() {
        "buy" | "bid" => Ok(Side::Buy),
        "sell" | "ask" => Ok(Side::Sell),
        _ => Err(format!("Invalid side: {}. Use 'buy' or 'sell'", s)),
    }
}

fn print_order(order: &OrderPayload) {
    let price = order
        .price
        .map(|p| p.to_string())
        .unwrap_or_else(|| "MKT".to_string());
    println!(
        "{} {} {} {}@{} -> {} (filled {}) id={} client={} t={}",
        order.symbol,
        order.side,
        order.order_type,
        order.orig_qty,
        price,
        order.status,
        order.executed_qty,
        order.order_id,
        order.client_order_id,
        order.transact_time,
    );
}

fn print_failure<T>(envelope: &Envelope<T>) {
    println!(
        "Error {}: {}",
        envelope.code,
        envelope.msg.as_deref().unwrap_or("unknown")
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let prefix = if cli.futures { "/fapi/v1" } else { "/api/v3" };
    let base = format!("{}{}", cli.server, prefix);

    match cli.command {
        Commands::Order {
            symbol,
            side,
            order_type,
            quantity,
            price,
        } => {
            let body = json!({
                "symbol": symbol,
                "side": side.to_string(),
                "type": order_type,
                "quantity": quantity,
                "price": price,
            });
            let envelope: Envelope<OrderPayload> = client
                .post(format!("{base}/order"))
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(order) => print_order(order),
                None => print_failure(&envelope),
            }
        }

        Commands::Batch { file } => {
            let orders: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            let envelope: Envelope<Vec<OrderPayload>> = client
                .post(format!("{base}/batchOrders"))
                .json(&json!({ "batchOrders": orders }))
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(orders) => {
                    for order in orders {
                        print_order(order);
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Cancel { symbol, order_ids } => {
            let envelope: Envelope<Vec<OrderPayload>> = client
                .delete(format!("{base}/order"))
                .query(&[("symbol", symbol.as_str()), ("orderIds", &order_ids.join(","))])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(orders) => {
                    for order in orders {
                        print_order(order);
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::OpenOrders { symbol } => {
            let envelope: Envelope<Vec<OrderPayload>> = client
                .get(format!("{base}/openOrders"))
                .query(&[("symbol", symbol.as_str())])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(orders) => {
                    println!("{} open orders on {}", orders.len(), symbol);
                    for order in orders {
                        print_order(order);
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Depth { symbol, limit } => {
            let envelope: Envelope<DepthPayload> = client
                .get(format!("{base}/depth"))
                .query(&[("symbol", symbol.as_str()), ("limit", &limit.to_string())])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(depth) => {
                    println!("Depth for {} (update {})", symbol, depth.last_update_id);
                    println!("Asks:");
                    for level in depth.asks.iter().rev() {
                        println!("  {} @ {}", level.quantity, level.price);
                    }
                    println!("Bids:");
                    for level in &depth.bids {
                        println!("  {} @ {}", level.quantity, level.price);
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Trades { symbol, limit } => {
            let envelope: Envelope<Vec<TradePayload>> = client
                .get(format!("{base}/trades"))
                .query(&[("symbol", symbol.as_str()), ("limit", &limit.to_string())])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(trades) => {
                    for trade in trades {
                        println!(
                            "{} {} @ {} t={} id={}",
                            symbol, trade.quantity, trade.price, trade.time, trade.id
                        );
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Klines {
            symbol,
            interval,
            limit,
        } => {
            let envelope: Envelope<Vec<KlinePayload>> = client
                .get(format!("{base}/klines"))
                .query(&[
                    ("symbol", symbol.as_str()),
                    ("interval", interval.as_str()),
                    ("limit", &limit.to_string()),
                ])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(bars) => {
                    for bar in bars {
                        println!(
                            "{} o={} h={} l={} c={} v={}",
                            bar.ot, bar.o, bar.h, bar.l, bar.c, bar.v
                        );
                    }
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Ticker { symbol } => {
            let envelope: Envelope<TickerPayload> = client
                .get(format!("{base}/ticker/price"))
                .query(&[("symbol", symbol.as_str())])
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(ticker) => {
                    println!(
                        "{} last price {} (qty {})",
                        ticker.symbol, ticker.price, ticker.quantity
                    );
                }
                None => print_failure(&envelope),
            }
        }

        Commands::Mock {
            symbol,
            price,
            quantity,
        } => {
            let body = json!({
                "symbol": symbol,
                "side": "BUY",
                "price": price,
                "quantity": quantity,
            });
            let envelope: Envelope<serde_json::Value> = client
                .post(format!("{base}/mock"))
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            match &envelope.data {
                Some(data) => println!("{}", serde_json::to_string_pretty(data)?),
                None => print_failure(&envelope),
            }
        }
    }

    Ok(())
}
