//! Picks the highest yielding supported strategy.

use alloy_primitives::U256;

use crate::{
    apy::ApySource,
    config::WorkflowConfig,
    types::{Strategy, StrategyWithApy},
    utils::error::{ManagerError, ManagerResult},
};

use super::registry::supported_strategies;

#[allow(async_fn_in_trait)]
pub trait StrategyOptimizer {
    fn init_supported_strategies(&mut self, config: &WorkflowConfig) -> ManagerResult<()>;

    /// Returns `(optimal, current)`.
    ///
    /// The current strategy is priced as it stands (no liquidity added), every
    /// other candidate as if `tvl` moved into it.
    async fn optimal_and_current(
        &self,
        current: Strategy,
        tvl: U256,
    ) -> ManagerResult<(StrategyWithApy, StrategyWithApy)>;
}

pub struct YieldOptimizer<S> {
    source: S,
    supported: Vec<Strategy>,
}

impl<S: ApySource> YieldOptimizer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            supported: vec![],
        }
    }

    async fn evaluate(&self, strategy: &Strategy, liquidity_added: U256) -> ManagerResult<f64> {
        let apy = self.source.apy(strategy, liquidity_added).await?;
        if !apy.is_finite() {
            return Err(ManagerError::InvalidApy(format!("{} for {}", apy, strategy)));
        }
        if apy == 0.0 {
            return Err(ManagerError::ZeroApy(strategy.to_string()));
        }
        Ok(apy)
    }
}

impl<S: ApySource> StrategyOptimizer for YieldOptimizer<S> {
    fn init_supported_strategies(&mut self, config: &WorkflowConfig) -> ManagerResult<()> {
        self.supported = supported_strategies(config)?;
        Ok(())
    }

    async fn optimal_and_current(
        &self,
        current: Strategy,
        tvl: U256,
    ) -> ManagerResult<(StrategyWithApy, StrategyWithApy)> {
        if self.supported.is_empty() {
            return Err(ManagerError::NoSupportedStrategies);
        }

        let current = StrategyWithApy {
            strategy: current,
            apy: self.evaluate(&current, U256::ZERO).await?,
        };

        let mut optimal: Option<StrategyWithApy> = None;
        for strategy in &self.supported {
            let apy = if *strategy == current.strategy {
                current.apy
            } else {
                self.evaluate(strategy, tvl).await?
            };

            // ties keep the earlier candidate
            if optimal.map_or(true, |best| apy > best.apy) {
                optimal = Some(StrategyWithApy {
                    strategy: *strategy,
                    apy,
                });
            }
        }

        let optimal = optimal.ok_or(ManagerError::NoSupportedStrategies)?;
        Ok((optimal, current))
    }
}
