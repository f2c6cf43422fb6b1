//! Candle-driven execution gateway and market loop
//!
//! The gateway processes one candle at a time, translating strategy
//! signals into broker orders while tracking `{FLAT, LONG}` state, the
//! mark-to-market equity curve, and the fill history. It is the forward
//! (paper/live) counterpart of the backtester.
//!
//! Broker failures are never caught here: a fill that cannot be executed
//! bubbles up so the trade history and broker state can never disagree.

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::execution::broker::PaperBroker;
use crate::execution::order::{Fill, Order};
use crate::execution::risk::RiskManager;
use crate::strategies::{Strategy, StrategyFactory};
use crate::types::{Candle, PositionState, Side, Signal};

/// Forward execution gateway for a single strategy.
pub struct ExecutionGateway {
    strategy: Box<dyn Strategy>,
    broker: PaperBroker,
    risk_manager: Option<RiskManager>,
    state: PositionState,
    last_price: f64,
    equity_curve: Vec<f64>,
    trade_history: Vec<Fill>,
}

/// Snapshot of gateway state, returned by [`MarketLoop::run`].
#[derive(Debug, Clone, Serialize)]
pub struct GatewayState {
    pub cash: f64,
    pub position_size: f64,
    pub equity: f64,
    pub equity_curve: Vec<f64>,
    pub trade_history: Vec<Fill>,
    pub state: PositionState,
}

impl ExecutionGateway {
    pub fn new(
        factory: &dyn StrategyFactory,
        broker: PaperBroker,
        risk_manager: Option<RiskManager>,
    ) -> Self {
        ExecutionGateway {
            strategy: factory.build(),
            broker,
            risk_manager,
            state: PositionState::Flat,
            last_price: 0.0,
            equity_curve: Vec::new(),
            trade_history: Vec::new(),
        }
    }

    /// Process a single candle.
    ///
    /// BUY while flat converts all cash into shares at the close; SELL
    /// while long liquidates the entire position. HOLD and redundant
    /// signals execute nothing. The mark-to-market equity is appended for
    /// every candle regardless of activity.
    pub fn on_candle(&mut self, candle: &Candle) -> Result<()> {
        let close = candle.close;
        if !close.is_finite() {
            return Err(EngineError::MissingField("close"));
        }
        self.last_price = close;

        let signal = self.strategy.generate_signal(candle);

        match signal {
            Signal::Buy if self.state == PositionState::Flat => {
                if self.broker.cash() > 0.0 {
                    let exec_price = close * (1.0 + self.broker.slippage_pct());
                    let quantity = self.broker.cash() / exec_price;
                    let mut order =
                        Order::new(Side::Buy, quantity, close, Some(candle.datetime))?;
                    if let Some(rm) = &self.risk_manager {
                        order = rm.adjust_order(order, self.equity())?;
                    }
                    let fill = self.broker.execute_order(&order)?;
                    tracing::debug!(
                        price = fill.price(),
                        quantity = fill.quantity(),
                        "buy executed"
                    );
                    self.trade_history.push(fill);
                    self.state = PositionState::Long;
                }
            }
            Signal::Sell if self.state == PositionState::Long => {
                let quantity = self.broker.position_size();
                if quantity > 0.0 {
                    let order = Order::new(Side::Sell, quantity, close, Some(candle.datetime))?;
                    let fill = self.broker.execute_order(&order)?;
                    tracing::debug!(
                        price = fill.price(),
                        quantity = fill.quantity(),
                        "sell executed"
                    );
                    self.trade_history.push(fill);
                }
                self.state = PositionState::Flat;
            }
            // HOLD, or redundant BUY while long / SELL while flat
            _ => {}
        }

        self.equity_curve.push(self.equity());
        Ok(())
    }

    /// Current mark-to-market equity.
    pub fn equity(&self) -> f64 {
        self.broker.equity(self.last_price)
    }

    pub fn broker(&self) -> &PaperBroker {
        &self.broker
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn trade_history(&self) -> &[Fill] {
        &self.trade_history
    }

    pub fn snapshot(&self) -> GatewayState {
        GatewayState {
            cash: self.broker.cash(),
            position_size: self.broker.position_size(),
            equity: self.equity(),
            equity_curve: self.equity_curve.clone(),
            trade_history: self.trade_history.clone(),
            state: self.state,
        }
    }
}

/// Stateless driver that feeds every candle to a gateway in order.
pub struct MarketLoop;

impl MarketLoop {
    /// Sequential and deterministic: identical to calling
    /// [`ExecutionGateway::on_candle`] once per candle by hand.
    pub fn run(gateway: &mut ExecutionGateway, candles: &[Candle]) -> Result<GatewayState> {
        for candle in candles {
            gateway.on_candle(candle)?;
        }
        Ok(gateway.snapshot())
    }
}
