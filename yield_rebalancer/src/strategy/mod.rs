//! Strategy selection and the rebalance tick

pub mod engine;
pub mod lock;
pub mod optimizer;
pub mod registry;
pub mod run;
