// src/storage/memory.rs - In-Memory Trade Storage
//! Concurrent in-memory trade storage, bucketed by symbol.

use dashmap::DashMap;
use tracing::debug;

use crate::core::types::{Symbol, Timestamp, Trade};

use super::TradeRepository;

/// In-memory [`TradeRepository`] keeping one append-only vector per symbol.
#[derive(Debug, Default)]
pub struct InMemoryTradeRepository {
    trades_by_symbol: DashMap<Symbol, Vec<Trade>>,
}

impl InMemoryTradeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            trades_by_symbol: DashMap::new(),
        }
    }

    /// Total number of trades recorded across all symbols.
    pub fn len(&self) -> usize {
        self.trades_by_symbol.iter().map(|e| e.value().len()).sum()
    }

    /// Whether no trade has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TradeRepository for InMemoryTradeRepository {
    fn add_trades(&self, trades: &[Trade]) {
        for trade in trades {
            self.trades_by_symbol
                .entry(trade.symbol.clone())
                .or_default()
                .push(trade.clone());
        }
        debug!(count = trades.len(), "trade batch recorded");
    }

    fn trades_between(&self, symbol: &str, start: Timestamp, end: Timestamp) -> Vec<Trade> {
        self.trades_by_symbol
            .get(symbol)
            .map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|t| t.timestamp >= start && t.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn trades_all(&self, symbol: &str) -> Vec<Trade> {
        self.trades_by_symbol
            .get(symbol)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
