// src/core/mod.rs - Core Module Declaration
//! Core domain model: identifiers, orders, trades and request types.

pub mod order;
pub mod types;

// Re-export commonly used types for convenience
pub use order::{ModifyOrderRequest, NewOrderRequest, Order};
pub use types::{
    OrderId, OrderType, Price, Quantity, RejectReason, Side, Symbol, TimeInForce, Timestamp,
    Trade, TradeId, INVALID_ORDER_ID, INVALID_TRADE_ID,
};
