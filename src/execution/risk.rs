//! Position-size risk manager
//!
//! Caps the quantity of a BUY order so the resulting position value does
//! not exceed `equity * max_position_pct`. SELL orders pass through
//! unchanged: closing a position is always permitted.

use crate::error::{EngineError, Result};
use crate::execution::order::Order;
use crate::types::Side;

#[derive(Debug, Clone)]
pub struct RiskManager {
    max_position_pct: f64,
}

impl RiskManager {
    /// `max_position_pct` must satisfy `0 < pct <= 1`.
    pub fn new(max_position_pct: f64) -> Result<Self> {
        if !(max_position_pct > 0.0 && max_position_pct <= 1.0) {
            return Err(EngineError::invalid(
                "max_position_pct",
                format!("must be in (0, 1], got {max_position_pct}"),
            ));
        }
        Ok(RiskManager { max_position_pct })
    }

    pub fn max_position_pct(&self) -> f64 {
        self.max_position_pct
    }

    /// Return `order` unchanged (same id) when no cap applies, otherwise a
    /// new order with the capped quantity (same side, price, timestamp).
    pub fn adjust_order(&self, order: Order, equity: f64) -> Result<Order> {
        if equity < 0.0 {
            return Err(EngineError::invalid(
                "equity",
                format!("must be >= 0, got {equity}"),
            ));
        }

        if order.side() != Side::Buy {
            return Ok(order);
        }

        let max_value = equity * self.max_position_pct;
        let max_quantity = max_value / order.price();
        let adjusted = order.quantity().min(max_quantity);

        if adjusted >= order.quantity() {
            return Ok(order);
        }

        Order::new(order.side(), adjusted, order.price(), order.timestamp())
    }
}
