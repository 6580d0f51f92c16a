//! Compound V3 (Comet) supply APY of the configured USDC market.

use alloy_primitives::U256;

use crate::{
    chain::{Comet, LendingFactory},
    config::WorkflowConfig,
    constants::WAD,
    utils::error::{arithmetic_err, ManagerError, ManagerResult, Stage},
};

use super::converter::{apr_to_apy, wad_per_second_to_ratio};

pub struct CompoundV3Apy<'a, L> {
    config: &'a WorkflowConfig,
    lending: &'a L,
}

impl<'a, L: LendingFactory> CompoundV3Apy<'a, L> {
    pub fn new(config: &'a WorkflowConfig, lending: &'a L) -> Self {
        Self { config, lending }
    }

    /// Supply APY after adding `liquidity_added` to the market.
    /// Utilization is `totalBorrow * 1e18 / (totalSupply + liquidity_added)`.
    pub async fn apy(&self, chain_selector: u64, liquidity_added: Option<U256>) -> ManagerResult<f64> {
        let chain = self.config.find_chain(chain_selector)?;
        let comet_address = chain.require_address(
            &chain.compound_v3_comet_usdc_address,
            "compoundV3CometUSDCAddress",
        )?;
        let liquidity_added = liquidity_added.ok_or(ManagerError::MissingLiquidityDelta)?;

        let name = chain.chain_name.as_str();
        let comet = self
            .lending
            .comet(chain, comet_address)
            .map_err(|err| err.at(name, Stage::Binding))?;

        let total_supply = comet
            .total_supply()
            .await
            .and_then(|supply| {
                supply
                    .checked_add(liquidity_added)
                    .ok_or_else(|| arithmetic_err("Total supply overflowed."))
            })
            .and_then(|supply| {
                if supply.is_zero() {
                    return Err(arithmetic_err(
                        "Total supply is zero, cannot compute utilization.",
                    ));
                }
                Ok(supply)
            })
            .map_err(|err| err.at(name, Stage::TotalSupply))?;

        let total_borrow = comet
            .total_borrow()
            .await
            .map_err(|err| err.at(name, Stage::TotalBorrow))?;

        let utilization = total_borrow
            .checked_mul(U256::from(WAD))
            .ok_or_else(|| arithmetic_err("Utilization overflowed.").at(name, Stage::TotalBorrow))?
            / total_supply;

        let supply_rate = comet
            .get_supply_rate(utilization)
            .await
            .map_err(|err| err.at(name, Stage::SupplyRate))?;

        apr_to_apy(Some(&wad_per_second_to_ratio(supply_rate)))
            .map_err(|err| err.at(name, Stage::Conversion))
    }
}
