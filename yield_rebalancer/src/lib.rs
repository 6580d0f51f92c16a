mod apy;
mod canister;
mod chain;
mod config;
mod constants;
mod journal;
mod state;
mod strategy;
mod timers;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

pub use canister::YieldRebalancer;
