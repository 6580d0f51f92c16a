pub(crate) mod aave;
pub(crate) mod compound;
pub(crate) mod converter;
pub(crate) mod params;

use alloy_primitives::U256;

use crate::{
    chain::LendingFactory,
    config::WorkflowConfig,
    constants::{AAVE_V3_PROTOCOL_ID, COMPOUND_V3_PROTOCOL_ID},
    types::Strategy,
    utils::error::{ManagerError, ManagerResult},
};

use self::{aave::AaveV3Apy, compound::CompoundV3Apy};

/// Anything that can price a strategy.
#[allow(async_fn_in_trait)]
pub trait ApySource {
    async fn apy(&self, strategy: &Strategy, liquidity_added: U256) -> ManagerResult<f64>;
}

/// Routes a strategy to the pipeline of its protocol.
pub struct ProtocolApy<'a, L> {
    config: &'a WorkflowConfig,
    lending: &'a L,
}

impl<'a, L: LendingFactory> ProtocolApy<'a, L> {
    pub fn new(config: &'a WorkflowConfig, lending: &'a L) -> Self {
        Self { config, lending }
    }
}

impl<'a, L: LendingFactory> ApySource for ProtocolApy<'a, L> {
    async fn apy(&self, strategy: &Strategy, liquidity_added: U256) -> ManagerResult<f64> {
        match strategy.protocol_id {
            id if id == AAVE_V3_PROTOCOL_ID => {
                AaveV3Apy::new(self.config, self.lending)
                    .apy(strategy.chain_selector, Some(liquidity_added))
                    .await
            }
            id if id == COMPOUND_V3_PROTOCOL_ID => {
                CompoundV3Apy::new(self.config, self.lending)
                    .apy(strategy.chain_selector, Some(liquidity_added))
                    .await
            }
            id => Err(ManagerError::UnsupportedProtocol(id.to_string())),
        }
    }
}
