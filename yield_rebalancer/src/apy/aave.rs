//! Aave V3 supply APY of the configured USDC reserve.

use alloy_primitives::{Address, U256};

use crate::{
    chain::{InterestRateStrategy, LendingFactory, PoolAddressesProvider, ProtocolDataProvider},
    config::WorkflowConfig,
    utils::{
        common::string_to_address,
        error::{ManagerError, ManagerResult, Stage},
    },
};

use super::{
    converter::{apr_to_apy, ray_to_ratio},
    params::fetch_interest_rate_params,
};

pub struct AaveV3Apy<'a, L> {
    config: &'a WorkflowConfig,
    lending: &'a L,
}

impl<'a, L: LendingFactory> AaveV3Apy<'a, L> {
    pub fn new(config: &'a WorkflowConfig, lending: &'a L) -> Self {
        Self { config, lending }
    }

    /// APY of the reserve on `chain_selector` after adding `liquidity_added`
    /// (zero for the current APY).
    ///
    /// Configuration errors are returned before any contract is bound.
    pub async fn apy(&self, chain_selector: u64, liquidity_added: Option<U256>) -> ManagerResult<f64> {
        let chain = self.config.find_chain(chain_selector)?;
        let provider_address = chain.require_address(
            &chain.aave_v3_pool_addresses_provider_address,
            "aaveV3PoolAddressesProviderAddress",
        )?;
        let asset = chain.require_address(&chain.usdc_address, "usdcAddress")?;
        let liquidity_added = liquidity_added.ok_or(ManagerError::MissingLiquidityDelta)?;

        let name = chain.chain_name.as_str();
        let asset = string_to_address(asset.to_string()).map_err(|err| err.at(name, Stage::Binding))?;

        let provider = self
            .lending
            .pool_addresses_provider(chain, provider_address)
            .map_err(|err| err.at(name, Stage::Binding))?;

        let data_provider_address = provider
            .get_pool_data_provider()
            .await
            .and_then(|address| non_zero(address, "PoolAddressesProvider.getPoolDataProvider"))
            .map_err(|err| err.at(name, Stage::PoolDataProvider))?;

        let data_provider = self
            .lending
            .protocol_data_provider(chain, data_provider_address)
            .map_err(|err| err.at(name, Stage::Binding))?;

        let rate_strategy_address = data_provider
            .get_interest_rate_strategy_address(asset)
            .await
            .and_then(|address| {
                non_zero(address, "ProtocolDataProvider.getInterestRateStrategyAddress")
            })
            .map_err(|err| err.at(name, Stage::RateStrategy))?;

        let rate_strategy = self
            .lending
            .interest_rate_strategy(chain, rate_strategy_address)
            .map_err(|err| err.at(name, Stage::Binding))?;

        let params = fetch_interest_rate_params(&data_provider, name, asset, liquidity_added).await?;

        let rates = rate_strategy
            .calculate_interest_rates(&params)
            .await
            .map_err(|err| err.at(name, Stage::InterestRates))?;

        apr_to_apy(Some(&ray_to_ratio(rates.liquidity_rate)))
            .map_err(|err| err.at(name, Stage::Conversion))
    }
}

fn non_zero(address: Address, contract: &str) -> ManagerResult<Address> {
    if address.is_zero() {
        return Err(ManagerError::InvalidProviderAddress {
            contract: contract.to_string(),
        });
    }
    Ok(address)
}
