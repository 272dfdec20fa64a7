pub mod assignments;
pub mod consolidation;
pub mod exit_planner;
pub mod ledger;
pub mod numbering;
pub mod settlement;
pub mod stock_pools;
