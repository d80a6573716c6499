// src/lib.rs - Matchbook Library Root
//! # Matchbook - In-Memory Limit-Order Matching Engine
//!
//! A single-process matching engine core: per-symbol order books with
//! price-time priority, GTC/IOC/FOK time-in-force handling, live order
//! cancel/modify, and an in-process trade event stream.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌───────────────────────────┐
//!                  │      MatchingEngine       │
//!                  │ (registry, ids, fan-out)  │
//!                  └─────┬───────────────┬─────┘
//!                        │ per symbol    │ completed batches
//!              ┌─────────▼─────────┐   ┌─▼──────────────────┐
//!              │     OrderBook     │   │  TradeRepository   │
//!              │  (bids  |  asks)  │   │   + listeners      │
//!              └─────────┬─────────┘   └────────────────────┘
//!                        │
//!              ┌─────────▼─────────┐
//!              │   OrderBookSide   │
//!              │ price → PriceLevel│
//!              └───────────────────┘
//! ```
//!
//! The engine exclusively owns every live order through its registry; books
//! hold shared handles. All mutation for a symbol happens under that
//! symbol's exclusion, and external collaborators (trade repository,
//! listeners) are invoked only after it is released.
//!
//! ## Quick Start
//!
//! ```rust
//! use matchbook::prelude::*;
//! use std::sync::Arc;
//!
//! let repo = Arc::new(InMemoryTradeRepository::new());
//! let engine = MatchingEngine::new(Arc::new(SystemClock), repo.clone());
//!
//! let ask = engine.new_order(&NewOrderRequest::limit(
//!     "AAPL", Side::Sell, TimeInForce::GoodTilCanceled, 100.0, 10,
//! ));
//! let bid = engine.new_order(&NewOrderRequest::limit(
//!     "AAPL", Side::Buy, TimeInForce::GoodTilCanceled, 100.0, 10,
//! ));
//! assert_ne!(ask, INVALID_ORDER_ID);
//! assert_ne!(bid, INVALID_ORDER_ID);
//!
//! let trades = repo.trades_all("AAPL");
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].quantity, 10);
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::cast_precision_loss,
    clippy::float_cmp,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

// Core modules
pub mod core;
pub mod engine;
pub mod report;
pub mod storage;
pub mod util;

// Re-export the working surface for convenience
pub use self::core::order::{ModifyOrderRequest, NewOrderRequest, Order};
pub use self::core::types::{
    OrderId, OrderType, Price, Quantity, RejectReason, Side, Symbol, TimeInForce, Timestamp,
    Trade, TradeId, INVALID_ORDER_ID, INVALID_TRADE_ID,
};
pub use self::engine::{
    BookLevel, MatchingEngine, OrderBook, OrderBookSide, OrderRef, PriceLevel, TradeListener,
};
pub use self::report::{PriceStats, PriceStatsReport, ReportService, VolumeReport, VolumeStats};
pub use self::storage::{InMemoryTradeRepository, TradeRepository};
pub use self::util::{Clock, IdGenerator, SimulatedClock, SystemClock};

/// Prelude module for convenient imports
pub mod prelude {
    //! Re-exports of the most commonly used engine types.

    pub use crate::core::order::{ModifyOrderRequest, NewOrderRequest, Order};
    pub use crate::core::types::{
        OrderId, OrderType, RejectReason, Side, TimeInForce, Trade, TradeId, INVALID_ORDER_ID,
        INVALID_TRADE_ID,
    };
    pub use crate::engine::{BookLevel, MatchingEngine, OrderBook, TradeListener};
    pub use crate::report::{PriceStatsReport, ReportService, VolumeReport};
    pub use crate::storage::{InMemoryTradeRepository, TradeRepository};
    pub use crate::util::{Clock, SimulatedClock, SystemClock};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
