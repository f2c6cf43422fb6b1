//! Multi-strategy portfolio engine
//!
//! Runs N strategies in parallel over one candle stream. Each strategy
//! gets its own broker and gateway with `initial_capital / N`; no state
//! is shared between strategies. The portfolio equity curve is the
//! element-wise sum of the per-strategy curves.
//!
//! Only equal allocation is supported here; weighted allocation is
//! realized externally by instantiating one single-strategy portfolio per
//! weight (see the lifecycle manager).

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::execution::broker::PaperBroker;
use crate::execution::gateway::ExecutionGateway;
use crate::execution::order::Fill;
use crate::execution::risk::RiskManager;
use crate::strategies::{StrategyFactory, StrategyHandle};
use crate::types::Candle;

pub struct PortfolioEngine {
    strategies: Vec<StrategyHandle>,
    initial_capital: f64,
    risk_manager: Option<RiskManager>,
}

/// Per-strategy sub-report.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub cash: f64,
    pub position_size: f64,
    pub equity: f64,
    pub equity_curve: Vec<f64>,
    pub trade_history: Vec<Fill>,
}

/// Aggregated portfolio report.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub portfolio_equity: f64,
    pub portfolio_equity_curve: Vec<f64>,
    pub strategies: Vec<StrategyReport>,
}

impl PortfolioEngine {
    pub fn new(strategies: Vec<StrategyHandle>, initial_capital: f64) -> Result<Self> {
        Self::with_risk_manager(strategies, initial_capital, None)
    }

    /// When a risk manager is supplied, the same cap applies to every
    /// gateway.
    pub fn with_risk_manager(
        strategies: Vec<StrategyHandle>,
        initial_capital: f64,
        risk_manager: Option<RiskManager>,
    ) -> Result<Self> {
        if strategies.is_empty() {
            return Err(EngineError::invalid("strategies", "must not be empty"));
        }
        if initial_capital <= 0.0 {
            return Err(EngineError::invalid(
                "initial_capital",
                format!("must be > 0, got {initial_capital}"),
            ));
        }
        Ok(PortfolioEngine {
            strategies,
            initial_capital,
            risk_manager,
        })
    }

    /// Dispatch every candle to every gateway, then record the summed
    /// mark-to-market equity. Gateways are built fresh on each call, so
    /// re-running is idempotent.
    pub fn run(&self, candles: &[Candle]) -> Result<PortfolioReport> {
        let capital_per = self.initial_capital / self.strategies.len() as f64;

        let mut gateways: Vec<ExecutionGateway> = self
            .strategies
            .iter()
            .map(|factory| {
                Ok(ExecutionGateway::new(
                    factory.as_ref(),
                    PaperBroker::new(capital_per, 0.0)?,
                    self.risk_manager.clone(),
                ))
            })
            .collect::<Result<_>>()?;

        let mut portfolio_equity_curve = Vec::with_capacity(candles.len());
        for candle in candles {
            for gateway in gateways.iter_mut() {
                gateway.on_candle(candle)?;
            }
            let step_equity: f64 = gateways.iter().map(|g| g.equity()).sum();
            portfolio_equity_curve.push(step_equity);
        }

        let portfolio_equity: f64 = gateways.iter().map(|g| g.equity()).sum();

        let strategies = self
            .strategies
            .iter()
            .zip(gateways.iter())
            .map(|(factory, gateway)| StrategyReport {
                name: factory.name(),
                cash: gateway.broker().cash(),
                position_size: gateway.broker().position_size(),
                equity: gateway.equity(),
                equity_curve: gateway.equity_curve().to_vec(),
                trade_history: gateway.trade_history().to_vec(),
            })
            .collect();

        Ok(PortfolioReport {
            portfolio_equity,
            portfolio_equity_curve,
            strategies,
        })
    }
}
