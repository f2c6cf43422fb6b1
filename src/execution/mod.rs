//! Execution layer
//!
//! The stateful per-candle forward executor and its policy primitives:
//! immutable order/fill records, a paper broker with slippage, a
//! position-size risk manager, the candle-driven gateway and market loop,
//! the multi-strategy portfolio engine, capital allocation, decay
//! detection, rebalancing, and the segmented portfolio lifecycle manager.

pub mod allocator;
pub mod broker;
pub mod decay;
pub mod gateway;
pub mod lifecycle;
pub mod order;
pub mod portfolio;
pub mod rebalance;
pub mod registry;
pub mod risk;

pub use allocator::{AllocationMode, CapitalAllocator};
pub use broker::PaperBroker;
pub use decay::{DecayMetric, PerformanceDecayDetector};
pub use gateway::{ExecutionGateway, GatewayState, MarketLoop};
pub use lifecycle::{LifecycleReport, PortfolioLifecycleManager};
pub use order::{next_order_id, Fill, Order, OrderId};
pub use portfolio::{PortfolioEngine, PortfolioReport, StrategyReport};
pub use rebalance::RebalancePolicy;
pub use registry::StrategyRegistry;
pub use risk::RiskManager;
