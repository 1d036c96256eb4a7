//! Rolling candlestick aggregation.
//!
//! Every executed (or mocked) trade updates three interval series at once.
//! Bucket identity is the integer minute/hour/day of the trade's wall
//! clock; a bar's `open_time` is the clock value at which the bar opened,
//! not the bucket's epoch boundary, and `close_time` is `open_time` plus
//! the interval length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Bars retained per interval after truncation.
pub const MAX_KLINE_SIZE: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    OneHour,
    OneDay,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }

    pub fn length_ms(&self) -> u64 {
        match self {
            Interval::OneMinute => 60 * 1000,
            Interval::OneHour => 60 * 60 * 1000,
            Interval::OneDay => 24 * 60 * 60 * 1000,
        }
    }

    /// Series length that triggers truncation back to `MAX_KLINE_SIZE`.
    /// Longer intervals roll rarely, so they tolerate less slack.
    fn overflow_len(&self) -> usize {
        match self {
            Interval::OneMinute => MAX_KLINE_SIZE * 2,
            Interval::OneHour => MAX_KLINE_SIZE * 3 / 2,
            Interval::OneDay => MAX_KLINE_SIZE * 6 / 5,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::OneMinute),
            "1h" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            other => Err(EngineError::UnknownInterval(other.to_string())),
        }
    }
}

/// One OHLCV bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: u64,
    pub quote_volume: f64,
}

impl Kline {
    fn open_at(now_ms: u64, interval: Interval, price: f64, quantity: f64) -> Self {
        Kline {
            open_time: now_ms,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: quantity,
            close_time: now_ms + interval.length_ms(),
            quote_volume: quantity * price,
        }
    }

    fn merge(&mut self, price: f64, quantity: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += quantity;
        self.quote_volume += quantity * price;
    }
}

/// Per-symbol candle state across the three intervals.
///
/// The `prev_*` bucket ids start at zero, so a symbol's first trade opens a
/// fresh bar in every interval regardless of the clock.
#[derive(Default)]
pub struct KlineSeries {
    minute_bars: Vec<Kline>,
    hour_bars: Vec<Kline>,
    day_bars: Vec<Kline>,
    prev_minute: u64,
    prev_hour: u64,
    prev_day: u64,
}

impl KlineSeries {
    pub fn new() -> Self {
        KlineSeries::default()
    }

    /// Folds one execution into all three series at the given clock.
    pub fn record_at(&mut self, now_ms: u64, price: f64, quantity: f64) {
        let minute = now_ms / 60_000;
        let hour = minute / 60;
        let day = hour / 24;

        roll(
            &mut self.minute_bars,
            self.prev_minute != minute,
            now_ms,
            Interval::OneMinute,
            price,
            quantity,
        );
        roll(
            &mut self.hour_bars,
            self.prev_hour != hour,
            now_ms,
            Interval::OneHour,
            price,
            quantity,
        );
        roll(
            &mut self.day_bars,
            self.prev_day != day,
            now_ms,
            Interval::OneDay,
            price,
            quantity,
        );

        self.prev_minute = minute;
        self.prev_hour = hour;
        self.prev_day = day;
    }

    pub fn bars(&self, interval: Interval) -> &[Kline] {
        match interval {
            Interval::OneMinute => &self.minute_bars,
            Interval::OneHour => &self.hour_bars,
            Interval::OneDay => &self.day_bars,
        }
    }

    /// Last `limit` bars of one interval, oldest first.
    pub fn recent(&self, interval: Interval, limit: usize) -> Vec<Kline> {
        let bars = self.bars(interval);
        let skip = bars.len().saturating_sub(limit);
        bars[skip..].to_vec()
    }
}

fn roll(
    bars: &mut Vec<Kline>,
    new_bucket: bool,
    now_ms: u64,
    interval: Interval,
    price: f64,
    quantity: f64,
) {
    // An empty series always opens a bar, even when the bucket id happens
    // to match the initial zero state.
    if !new_bucket {
        if let Some(last) = bars.last_mut() {
            last.merge(price, quantity);
            return;
        }
    }
    bars.push(Kline::open_at(now_ms, interval, price, quantity));
    if bars.len() > interval.overflow_len() {
        let drop = bars.len() - MAX_KLINE_SIZE;
        bars.drain(..drop);
    }
}
