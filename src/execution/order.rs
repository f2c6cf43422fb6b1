//! Immutable order and fill records
//!
//! Both types are constructor-only: fields are private and exposed through
//! getters, so a record can never be rewritten after it is created. Order
//! ids come from a process-wide atomic counter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{EngineError, Result};
use crate::types::Side;

/// Order ID type - u64 for performance
pub type OrderId = u64;

/// Atomic counter for fast order ID generation
static ORDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate next order ID (thread-safe, lock-free)
pub fn next_order_id() -> OrderId {
    ORDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// An instruction to buy or sell `quantity` shares at `price`.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: OrderId,
    side: Side,
    quantity: f64,
    price: f64,
    timestamp: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new order with a fresh id.
    ///
    /// Quantity and price must both be finite and strictly positive.
    pub fn new(
        side: Side,
        quantity: f64,
        price: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(EngineError::invalid(
                "quantity",
                format!("must be > 0, got {quantity}"),
            ));
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(EngineError::invalid(
                "price",
                format!("must be > 0, got {price}"),
            ));
        }
        Ok(Order {
            id: next_order_id(),
            side,
            quantity,
            price,
            timestamp,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

/// The result of executing an [`Order`].
///
/// Sign convention: `cash_change` is negative for a BUY and positive for a
/// SELL; `position_change` is the opposite.
#[derive(Debug, Clone, Serialize)]
pub struct Fill {
    order_id: OrderId,
    side: Side,
    quantity: f64,
    price: f64,
    cash_change: f64,
    position_change: f64,
}

impl Fill {
    pub(crate) fn new(
        order_id: OrderId,
        side: Side,
        quantity: f64,
        price: f64,
        cash_change: f64,
        position_change: f64,
    ) -> Self {
        Fill {
            order_id,
            side,
            quantity,
            price,
            cash_change,
            position_change,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Execution price per share (may differ from the order price due to
    /// slippage).
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn cash_change(&self) -> f64 {
        self.cash_change
    }

    pub fn position_change(&self) -> f64 {
        self.position_change
    }
}
