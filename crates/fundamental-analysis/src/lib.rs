pub mod aggregator;
pub mod pacing;
pub mod sector;
pub mod valuation;

pub use aggregator::{BatchMode, BatchReport, SectorAggregator, TickerFailure};
pub use pacing::{FixedDelay, NoPacing, SlidingWindowLimiter};
pub use sector::SectorAverages;
pub use valuation::{compute_fair_value, cost_of_debt, weighted_cost_of_capital, DividendDiscountModel};
