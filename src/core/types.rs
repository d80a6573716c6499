// src/core/types.rs - Core Type Definitions
//! Core identifier, price and time types shared across the engine.
//!
//! Prices are `f64` for simplicity; both sides of a match use the same
//! representation, and the book orders them through a total-order wrapper,
//! so comparisons stay consistent. An integer-ticks representation is the
//! recommended upgrade for production deployments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

/// Engine-assigned order identifier, unique for the engine lifetime.
pub type OrderId = u64;

/// Engine-assigned trade identifier.
pub type TradeId = u64;

/// Limit price.
pub type Price = f64;

/// Order quantity in whole units.
pub type Quantity = i64;

/// Trading symbol, treated as an opaque identifier.
pub type Symbol = String;

/// Timestamp type used for order arrival and trade stamping.
pub type Timestamp = DateTime<Utc>;

/// Reserved order id meaning "invalid/none".
pub const INVALID_ORDER_ID: OrderId = 0;

/// Reserved trade id meaning "invalid/none".
pub const INVALID_TRADE_ID: TradeId = 0;

/// Order side - Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Rests in the book as a bid.
    Buy,
    /// Rests in the book as an ask.
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

/// Order type - Limit or Market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Execute at the stated price or better; surplus may rest.
    Limit,
    /// Execute against whatever is on the book; never rests.
    Market,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "Limit"),
            Self::Market => write!(f, "Market"),
        }
    }
}

/// Time in force specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    /// Rest on the book until canceled or filled.
    GoodTilCanceled,
    /// Match immediately; discard any surplus.
    ImmediateOrCancel,
    /// Match the full quantity immediately or not at all.
    FillOrKill,
}

impl Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCanceled => write!(f, "GTC"),
            Self::ImmediateOrCancel => write!(f, "IOC"),
            Self::FillOrKill => write!(f, "FOK"),
        }
    }
}

/// Reason a new-order or modify request was rejected.
///
/// Rejections surface by value at the engine boundary (the invalid order id,
/// or `false`); this enum is the diagnostic taxonomy behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Limit price was zero or negative.
    #[error("price must be strictly positive")]
    InvalidPrice,
    /// Quantity was non-positive, or a modify went below the filled amount.
    #[error("quantity must be positive and not below the filled amount")]
    InvalidQuantity,
    /// The order type does not support the requested operation.
    #[error("order type not supported for this operation")]
    UnsupportedOrderType,
    /// Only resting GTC orders can be modified.
    #[error("time in force not supported for this operation")]
    UnsupportedTimeInForce,
}

/// Record of one match, immutable once emitted.
///
/// The trade id and timestamp are assigned by the engine after matching
/// completes, before the batch leaves the symbol's critical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Engine-assigned trade id ([`INVALID_TRADE_ID`] until stamped).
    pub trade_id: TradeId,
    /// Symbol the trade occurred on.
    pub symbol: Symbol,
    /// Id of the buy-side order.
    pub buy_order_id: OrderId,
    /// Id of the sell-side order.
    pub sell_order_id: OrderId,
    /// Execution price; always the resting order's price.
    pub price: Price,
    /// Matched quantity, always positive.
    pub quantity: Quantity,
    /// Engine clock reading taken after the match completed.
    pub timestamp: Timestamp,
}

impl Trade {
    /// Notional value of the trade (`price * quantity`).
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}
