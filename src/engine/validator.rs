// src/engine/validator.rs - Order Request Validation
//! Validation rules for new-order and modify-order requests.
//!
//! Rules are checked in a fixed order and the first violation wins. Modify
//! requests are validated twice by the engine: once against a snapshot
//! taken outside the symbol's critical section, and again against the live
//! order inside it, which guards against concurrent fills raising the
//! filled quantity past a proposed new total.

use crate::core::order::{ModifyOrderRequest, NewOrderRequest, Order};
use crate::core::types::{OrderType, RejectReason, TimeInForce};

/// Check a new-order request before it is accepted.
pub fn validate_new_order(req: &NewOrderRequest) -> Result<(), RejectReason> {
    if req.quantity <= 0 {
        return Err(RejectReason::InvalidQuantity);
    }
    if req.order_type == OrderType::Limit && (req.price <= 0.0 || !req.price.is_finite()) {
        return Err(RejectReason::InvalidPrice);
    }
    Ok(())
}

/// Check a modify request against the current state of the order.
pub fn validate_modify_order(order: &Order, req: &ModifyOrderRequest) -> Result<(), RejectReason> {
    if order.tif != TimeInForce::GoodTilCanceled {
        return Err(RejectReason::UnsupportedTimeInForce);
    }
    if let Some(new_quantity) = req.new_quantity {
        if new_quantity < order.filled {
            return Err(RejectReason::InvalidQuantity);
        }
    }
    if req.new_price.is_some() && order.order_type == OrderType::Market {
        return Err(RejectReason::UnsupportedOrderType);
    }
    if let Some(new_price) = req.new_price {
        if new_price <= 0.0 || !new_price.is_finite() {
            return Err(RejectReason::InvalidPrice);
        }
    }
    Ok(())
}
