use alloy_primitives::{Address, U256};

use crate::{
    chain::ProtocolDataProvider,
    types::InterestRateParams,
    utils::error::{arithmetic_err, ManagerResult, Stage},
};

/// Assembles the `calculateInterestRates` inputs of a reserve.
///
/// Reads reserve data, then the virtual underlying balance, then the reserve
/// configuration, one after another. The first failing read aborts the fetch.
/// `liquidity_taken` is always zero and the virtual balance is always used.
pub async fn fetch_interest_rate_params<D: ProtocolDataProvider>(
    data_provider: &D,
    chain_name: &str,
    asset: Address,
    liquidity_added: U256,
) -> ManagerResult<InterestRateParams> {
    let reserve = data_provider
        .get_reserve_data(asset)
        .await
        .map_err(|err| err.at(chain_name, Stage::ReserveData))?;

    let total_debt = reserve
        .total_stable_debt
        .checked_add(reserve.total_variable_debt)
        .ok_or_else(|| arithmetic_err("Total debt overflowed.").at(chain_name, Stage::ReserveData))?;

    let virtual_underlying_balance = data_provider
        .get_virtual_underlying_balance(asset)
        .await
        .map_err(|err| err.at(chain_name, Stage::VirtualBalance))?;

    let reserve_factor = data_provider
        .get_reserve_factor(asset)
        .await
        .map_err(|err| err.at(chain_name, Stage::ReserveConfiguration))?;

    Ok(InterestRateParams {
        unbacked: reserve.unbacked,
        liquidity_added,
        liquidity_taken: U256::ZERO,
        total_debt,
        reserve_factor,
        reserve: asset,
        using_virtual_balance: true,
        virtual_underlying_balance,
    })
}
