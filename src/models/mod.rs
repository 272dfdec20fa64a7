pub mod product_key;
pub mod stock;

pub use product_key::ProductKey;
pub use stock::{
    ConsolidatedProduct, ExitPlan, ExitStep, NewStockRecord, PoolTag, StockRecord, StockState,
};
