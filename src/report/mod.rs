// src/report/mod.rs - Trade Aggregation Reports
//! Volume and price statistics over retrieved trade sequences.
//!
//! Reports are pure aggregations: they never touch the engine, only trade
//! batches handed back by a [`TradeRepository`]. [`ReportService`] is the
//! convenience layer binding a repository to the aggregators.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::types::{Symbol, Timestamp, Trade};
use crate::storage::TradeRepository;

/// Aggregate traded volume for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    /// Symbol the trades belong to.
    pub symbol: Symbol,
    /// Sum of traded quantity.
    pub total_quantity: i64,
    /// Sum of `price * quantity` across trades.
    pub total_notional: f64,
}

/// Volume aggregation over a trade sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeReport {
    stats: VolumeStats,
}

impl VolumeReport {
    /// Aggregate a trade sequence. An empty input yields zeroed stats.
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut report = Self::default();
        let Some(first) = trades.first() else {
            return report;
        };
        report.stats.symbol = first.symbol.clone();
        for trade in trades {
            report.stats.total_quantity += trade.quantity;
            report.stats.total_notional += trade.notional();
        }
        report
    }

    /// The aggregated statistics.
    pub fn stats(&self) -> &VolumeStats {
        &self.stats
    }
}

/// Price distribution statistics for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    /// Symbol the trades belong to.
    pub symbol: Symbol,
    /// Lowest trade price seen.
    pub min_price: f64,
    /// Highest trade price seen.
    pub max_price: f64,
    /// Arithmetic mean of trade prices.
    pub avg_price: f64,
    /// Population standard deviation as a percentage of the mean.
    pub std_dev_pct: f64,
    /// Number of trades aggregated.
    pub trade_count: usize,
}

impl PriceStats {
    /// Whether the stats were computed from at least one trade.
    pub fn is_valid(&self) -> bool {
        self.trade_count > 0
    }
}

impl Default for PriceStats {
    fn default() -> Self {
        Self {
            symbol: Symbol::new(),
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
            avg_price: 0.0,
            std_dev_pct: 0.0,
            trade_count: 0,
        }
    }
}

/// Price statistics over a trade sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStatsReport {
    stats: PriceStats,
}

impl PriceStatsReport {
    /// Aggregate a trade sequence. An empty input yields an invalid report.
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut report = Self::default();
        let Some(first) = trades.first() else {
            return report;
        };
        report.stats.symbol = first.symbol.clone();

        let mut sum_price = 0.0;
        let mut sum_squares = 0.0;
        for trade in trades {
            report.stats.min_price = report.stats.min_price.min(trade.price);
            report.stats.max_price = report.stats.max_price.max(trade.price);
            sum_price += trade.price;
            sum_squares += trade.price * trade.price;
            report.stats.trade_count += 1;
        }

        let count = report.stats.trade_count as f64;
        report.stats.avg_price = sum_price / count;
        let variance =
            (sum_squares / count - report.stats.avg_price * report.stats.avg_price).max(0.0);
        let std_dev = variance.sqrt();
        report.stats.std_dev_pct = if report.stats.avg_price > 0.0 {
            std_dev / report.stats.avg_price * 100.0
        } else {
            0.0
        };
        report
    }

    /// The aggregated statistics.
    pub fn stats(&self) -> &PriceStats {
        &self.stats
    }
}

/// Report layer over a trade repository.
pub struct ReportService {
    repo: Arc<dyn TradeRepository>,
}

impl ReportService {
    /// Bind a report service to a repository.
    pub fn new(repo: Arc<dyn TradeRepository>) -> Self {
        Self { repo }
    }

    /// Volume aggregation over a time window (bounds inclusive).
    pub fn volume_between(&self, symbol: &str, start: Timestamp, end: Timestamp) -> VolumeReport {
        VolumeReport::from_trades(&self.repo.trades_between(symbol, start, end))
    }

    /// Volume aggregation over all recorded trades.
    pub fn volume_all(&self, symbol: &str) -> VolumeReport {
        VolumeReport::from_trades(&self.repo.trades_all(symbol))
    }

    /// Price statistics over a time window (bounds inclusive).
    pub fn price_between(&self, symbol: &str, start: Timestamp, end: Timestamp) -> PriceStatsReport {
        PriceStatsReport::from_trades(&self.repo.trades_between(symbol, start, end))
    }

    /// Price statistics over all recorded trades.
    pub fn price_all(&self, symbol: &str) -> PriceStatsReport {
        PriceStatsReport::from_trades(&self.repo.trades_all(symbol))
    }
}
