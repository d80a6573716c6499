// src/core/order.rs - Order Record and Request Types
//! The mutable working-order record and the request types that create and
//! amend it.
//!
//! An [`Order`] is exclusively owned by the matching engine's registry for
//! its lifetime; price levels hold shared handles to it. The quantity
//! invariant `filled + remaining == qty` holds at every observable point.

use serde::{Deserialize, Serialize};

use crate::core::types::{OrderId, OrderType, Price, Quantity, Side, Symbol, TimeInForce, Timestamp};

/// A single working order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Engine-assigned id, nonzero and unique for the engine lifetime.
    pub order_id: OrderId,
    /// Symbol this order trades.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: Side,
    /// Limit or market. Market orders never rest on a book.
    pub order_type: OrderType,
    /// Time in force governing what happens to unmatched quantity.
    pub tif: TimeInForce,
    /// Limit price; ignored by matching for market orders.
    pub price: Price,
    /// Requested quantity; may be raised or lowered by a modify.
    pub qty: Quantity,
    /// Quantity still open, always `qty - filled`.
    pub remaining: Quantity,
    /// Cumulative matched quantity, monotonically non-decreasing.
    pub filled: Quantity,
    /// Arrival time from the engine clock; never changes.
    pub timestamp: Timestamp,
}

impl Order {
    /// Build a working order from an accepted request.
    pub fn from_request(order_id: OrderId, req: &NewOrderRequest, timestamp: Timestamp) -> Self {
        Self {
            order_id,
            symbol: req.symbol.clone(),
            side: req.side,
            order_type: req.order_type,
            tif: req.tif,
            price: req.price,
            qty: req.quantity,
            remaining: req.quantity,
            filled: 0,
            timestamp,
        }
    }

    /// Record a fill of up to `quantity` units.
    ///
    /// The fill is clamped to the open quantity; zero or negative quantities
    /// are a silent no-op.
    pub fn add_fill(&mut self, quantity: Quantity) {
        if quantity <= 0 {
            return;
        }
        let fill = quantity.min(self.remaining);
        self.filled += fill;
        self.remaining -= fill;
    }

    /// Whether the order has been completely filled.
    pub fn is_filled(&self) -> bool {
        self.qty > 0 && self.remaining == 0
    }
}

/// Parameters for submitting a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: Side,
    /// Limit or market.
    pub order_type: OrderType,
    /// Time in force.
    pub tif: TimeInForce,
    /// Limit price; ignored for market orders.
    pub price: Price,
    /// Requested quantity.
    pub quantity: Quantity,
}

impl NewOrderRequest {
    /// Convenience constructor for a limit order.
    pub fn limit(
        symbol: impl Into<Symbol>,
        side: Side,
        tif: TimeInForce,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            tif,
            price,
            quantity,
        }
    }

    /// Convenience constructor for a market order. The price field is unused
    /// by matching and left at zero.
    pub fn market(
        symbol: impl Into<Symbol>,
        side: Side,
        tif: TimeInForce,
        quantity: Quantity,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            tif,
            price: 0.0,
            quantity,
        }
    }
}

/// Parameters for amending a resting order.
///
/// A field left as `None` keeps the order's current value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyOrderRequest {
    /// Replacement total quantity; must not go below the filled amount.
    pub new_quantity: Option<Quantity>,
    /// Replacement limit price.
    pub new_price: Option<Price>,
}

impl ModifyOrderRequest {
    /// Amend only the quantity.
    pub fn quantity(new_quantity: Quantity) -> Self {
        Self {
            new_quantity: Some(new_quantity),
            new_price: None,
        }
    }

    /// Amend only the price.
    pub fn price(new_price: Price) -> Self {
        Self {
            new_quantity: None,
            new_price: Some(new_price),
        }
    }

    /// Amend both quantity and price.
    pub fn quantity_and_price(new_quantity: Quantity, new_price: Price) -> Self {
        Self {
            new_quantity: Some(new_quantity),
            new_price: Some(new_price),
        }
    }
}
