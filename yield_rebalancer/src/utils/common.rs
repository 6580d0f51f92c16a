//! Common utility and helper functions that are used across the project

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use candid::Nat;
use evm_rpc_types::{ConsensusStrategy, HttpOutcallError, MultiRpcResult, RpcConfig, RpcError, RpcServices};
use ic_exports::ic_cdk::{self, api::call::CallResult, print};

use super::{error::*, evm_rpc::*};

use crate::constants::{
    DEFAULT_MAX_RESPONSE_BYTES, MAX_RESPONSE_BYTES_CEILING, PROVIDER_THRESHOLD,
};

/// Converts String to Address and returns ManagerError on failure
pub fn string_to_address(input: String) -> ManagerResult<Address> {
    Address::from_str(&input).map_err(|err| ManagerError::DecodingError(format!("{:#?}", err)))
}

/// Converts values of type `Nat` to `U256`
pub fn nat_to_u256(n: &Nat) -> ManagerResult<U256> {
    let be_bytes = n.0.to_bytes_be();
    if be_bytes.len() > 32 {
        return Err(ManagerError::DecodingError("The `Nat` input length exceedes 32 bytes when converted to big-endian bytes representation.".to_string()));
    }
    // Ensure the byte array is exactly 32 bytes long
    let mut padded_bytes = [0u8; 32];
    let start_pos = 32 - be_bytes.len();
    padded_bytes[start_pos..].copy_from_slice(&be_bytes);

    Ok(U256::from_be_bytes(padded_bytes))
}

/// Returns `T` from Solidity struct.
pub fn decode_abi_response<T, F: SolCall<Return = T>>(hex_data: String) -> ManagerResult<T> {
    let stripped_hex = match hex_data.strip_prefix("0x") {
        Some(stripped) => stripped.to_string(),
        None => hex_data,
    };
    let hex_bytes =
        hex::decode(stripped_hex).map_err(|err| ManagerError::DecodingError(err.to_string()))?;
    F::abi_decode_returns(&hex_bytes, false)
        .map_err(|err| ManagerError::DecodingError(err.to_string()))
}

pub(crate) fn is_response_size_error(err: &RpcError) -> bool {
    if let RpcError::HttpOutcallError(HttpOutcallError::IcError { code, message }) = err {
        *code == ic_cdk::api::call::RejectionCode::SysFatal
            && (message.contains("size limit") || message.contains("length limit"))
    } else {
        false
    }
}

/// Number of providers in a provider set
pub fn provider_count(services: &RpcServices) -> u8 {
    let count = match services {
        RpcServices::Custom { services, .. } => services.len(),
        RpcServices::EthMainnet(Some(services)) => services.len(),
        RpcServices::EthSepolia(Some(services)) => services.len(),
        _ => 1,
    };
    u8::try_from(count).unwrap_or(u8::MAX)
}

/// Consensus among all configured providers, at least `PROVIDER_THRESHOLD` of
/// them agreeing (or all of them if fewer are configured).
pub fn get_rpc_config(max_response_bytes: Option<u64>, provider_count: u8) -> RpcConfig {
    RpcConfig {
        response_size_estimate: max_response_bytes,
        response_consensus: Some(ConsensusStrategy::Threshold {
            total: Some(provider_count),
            min: PROVIDER_THRESHOLD.min(provider_count),
        }),
    }
}

/// Performs `eth_call` calls to the EVM RPC canister and doubles the max response bytes argument, if insufficient
/// Exits the loop if either of the following are satisfied:
/// A) The EVM RPC canister responds with Ok() or an error that is not related to the response size
/// B) The limit of 2MB is reached.
pub async fn call_with_dynamic_retries(
    rpc_canister: &Service,
    provider_set: &RpcServices,
    block: BlockTag,
    to: Address,
    data: Vec<u8>,
) -> ManagerResult<String> {
    let mut max_response_bytes = DEFAULT_MAX_RESPONSE_BYTES;
    let data_string = format!("0x{}", hex::encode(data));
    let providers = provider_count(provider_set);

    // There is a 2 MB limit on the response size, an ICP limitation.
    while max_response_bytes < MAX_RESPONSE_BYTES_CEILING {
        let transaction = TransactionRequest {
            to: Some(to.to_string()),
            input: Some(data_string.clone()),
            ..Default::default()
        };

        let args = CallArgs {
            transaction,
            block: Some(block.clone()),
        };

        let config = get_rpc_config(Some(max_response_bytes), providers);
        let response = rpc_canister
            .eth_call(provider_set.clone(), Some(config), args)
            .await;

        let extracted_response = extract_call_result(response)?;
        let extracted_rpc_result = extract_multi_rpc_result(extracted_response);

        if let Err(ManagerError::RpcResponseError(err)) = &extracted_rpc_result {
            if is_response_size_error(err) {
                print(format!(
                    "[RPC] eth_call to {} exceeded {} response bytes, doubling.",
                    to, max_response_bytes
                ));
                max_response_bytes *= 2;
                continue;
            }
        }

        // note: if the code has reached this line, it means that a response unrelated to the size was received.
        return extracted_rpc_result;
    }

    Err(ManagerError::Custom(
        "Request with dynamic retries reached its ceiling of 2 Megabytes.".to_string(),
    ))
}

/// On success, returns the nonce associated with the given address
pub async fn get_nonce(
    rpc_canister: &Service,
    provider_set: &RpcServices,
    address: Address,
) -> ManagerResult<U256> {
    let args = GetTransactionCountArgs {
        address: address.to_string(),
        block: BlockTag::Latest,
    };

    let config = get_rpc_config(Some(10_000), provider_count(provider_set));

    let result = rpc_canister
        .eth_get_transaction_count(provider_set.clone(), Some(config), args)
        .await;

    let wrapped_number = extract_call_result::<MultiRpcResult<Nat>>(result)?;
    let number = extract_multi_rpc_result(wrapped_number)?;
    nat_to_u256(&number)
}

/// Extracts result from `MultiRpcResult`. Providers that disagree are reported as `NoConsensus`.
pub fn extract_multi_rpc_result<T>(result: MultiRpcResult<T>) -> ManagerResult<T> {
    match result {
        MultiRpcResult::Consistent(response) => response.map_err(ManagerError::RpcResponseError),
        MultiRpcResult::Inconsistent(_) => Err(ManagerError::NoConsensus),
    }
}

/// Extracts the Ok or Err values of a canister call and returns them.
pub fn extract_call_result<T>(result: CallResult<(T,)>) -> ManagerResult<T> {
    result
        .map(|(success_value,)| success_value)
        .map_err(|(rejection_code, error_message)| {
            ManagerError::CallResult(rejection_code, error_message)
        })
}
