//! Fee estimation for the transactions submitted through the TransactionBuilder

use candid::Nat;
use evm_rpc_types::RpcServices;

use super::common::{extract_call_result, extract_multi_rpc_result, get_rpc_config, provider_count};
use super::error::{ManagerError, ManagerResult};
use super::evm_rpc::{BlockTag, FeeHistory, FeeHistoryArgs, Service};

/// The minimum suggested maximum priority fee per gas.
const MIN_SUGGEST_MAX_PRIORITY_FEE_PER_GAS: u64 = 1_500_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeEstimates {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

pub async fn fee_history(
    block_count: Nat,
    newest_block: BlockTag,
    reward_percentiles: Option<Vec<u8>>,
    rpc_services: RpcServices,
    evm_rpc: &Service,
) -> ManagerResult<FeeHistory> {
    let fee_history_args = FeeHistoryArgs {
        block_count,
        newest_block,
        reward_percentiles,
    };

    let config = get_rpc_config(None, provider_count(&rpc_services));
    let call_result = evm_rpc
        .eth_fee_history(rpc_services, Some(config), fee_history_args)
        .await;

    let canister_response = extract_call_result(call_result)?;

    extract_multi_rpc_result(canister_response)
}

fn median_index(length: usize) -> ManagerResult<usize> {
    if length == 0 {
        return Err(ManagerError::Custom(
            "Cannot find a median index for an array of length zero.".to_string(),
        ));
    }
    Ok((length - 1) / 2)
}

/// Derives EIP-1559 fees from a fee history: the median of the 95th percentile
/// tips, plus the latest base fee.
pub fn fees_from_history(fee_history: FeeHistory, block_count: u8) -> ManagerResult<FeeEstimates> {
    let median_index = median_index(block_count.into())?;

    let base_fee_per_gas = fee_history
        .base_fee_per_gas
        .last()
        .ok_or(ManagerError::NonExistentValue)?;
    let base_fee_per_gas_u128 = u128::try_from(base_fee_per_gas.0.clone())
        .map_err(|err| ManagerError::DecodingError(format!("{:#?}", err)))?;

    // obtain the 95th percentile of the tips for the past blocks
    let mut percentiles: Vec<Nat> = fee_history
        .reward
        .into_iter()
        .flat_map(|rewards| rewards.into_iter())
        .collect();

    // sort and retrieve the median reward
    percentiles.sort_unstable();
    let zero_nat = Nat::from(0_u32);
    let median_reward = percentiles.get(median_index).unwrap_or(&zero_nat);
    let median_reward_u128 = u128::try_from(median_reward.0.clone())
        .map_err(|err| ManagerError::DecodingError(format!("{:#?}", err)))?;

    let max_fee_per_gas = median_reward_u128
        .saturating_add(base_fee_per_gas_u128)
        .max(MIN_SUGGEST_MAX_PRIORITY_FEE_PER_GAS as u128);

    Ok(FeeEstimates {
        max_fee_per_gas,
        max_priority_fee_per_gas: median_reward_u128,
    })
}

pub async fn estimate_transaction_fees(
    block_count: u8,
    rpc_services: RpcServices,
    evm_rpc: &Service,
    block_tag: BlockTag,
) -> ManagerResult<FeeEstimates> {
    let fee_history = fee_history(
        Nat::from(block_count),
        block_tag,
        Some(vec![95]),
        rpc_services,
        evm_rpc,
    )
    .await?;

    fees_from_history(fee_history, block_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(base_fees: &[u64], rewards: &[u64]) -> FeeHistory {
        FeeHistory {
            oldest_block: Nat::from(1_u32),
            base_fee_per_gas: base_fees.iter().map(|fee| Nat::from(*fee)).collect(),
            gas_used_ratio: vec![],
            reward: rewards.iter().map(|reward| vec![Nat::from(*reward)]).collect(),
        }
    }

    #[test]
    fn median_tip_plus_latest_base_fee() {
        let fees = fees_from_history(
            history(&[10, 3_000_000_000], &[5, 1, 9, 7, 3, 2_000_000_000, 8, 6, 4]),
            9,
        )
        .unwrap();

        assert_eq!(fees.max_priority_fee_per_gas, 6);
        assert_eq!(fees.max_fee_per_gas, 3_000_000_006);
    }

    #[test]
    fn max_fee_has_a_floor() {
        let fees = fees_from_history(history(&[1], &[1, 2, 3]), 3).unwrap();
        assert_eq!(fees.max_priority_fee_per_gas, 2);
        assert_eq!(fees.max_fee_per_gas, MIN_SUGGEST_MAX_PRIORITY_FEE_PER_GAS as u128);
    }

    #[test]
    fn missing_base_fee_is_an_error() {
        assert_eq!(
            fees_from_history(history(&[], &[1]), 1),
            Err(ManagerError::NonExistentValue)
        );
    }

    #[test]
    fn zero_blocks_is_an_error() {
        assert!(median_index(0).is_err());
        assert_eq!(median_index(9), Ok(4));
    }
}
