//! Transaction builder (and sender) that interacts with the EVM RPC canister

use alloy::consensus::TxEip1559;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use evm_rpc_types::RpcServices;
use ic_exports::ic_cdk::print;

use crate::constants::FEE_HISTORY_BLOCK_COUNT;

use super::{
    common::{extract_call_result, extract_multi_rpc_result, get_rpc_config, provider_count},
    error::{ManagerError, ManagerResult},
    evm_rpc::{BlockTag, SendRawTransactionStatus, Service},
    gas::{estimate_transaction_fees, FeeEstimates},
    signer::EcdsaSigner,
};

/// Transaction builder struct
#[derive(Default)]
pub struct TransactionBuilder {
    to: Address,
    data: Vec<u8>,
    nonce: u64,
    chain_id: u64,
    gas_limit: u64,
}

impl TransactionBuilder {
    /// Sets the `to` field
    pub fn to(mut self, to: Address) -> Self {
        self.to = to;
        self
    }

    /// Sets the `data` field
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Sets the `nonce` field
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the `chain_id` field
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the `gas_limit` field
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    fn into_request(self, fees: FeeEstimates) -> TxEip1559 {
        TxEip1559 {
            chain_id: self.chain_id,
            to: TxKind::Call(self.to),
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            value: U256::ZERO,
            nonce: self.nonce,
            gas_limit: self.gas_limit.into(),
            access_list: Default::default(),
            input: Bytes::from(self.data),
        }
    }

    /// Builds the TransactionBuilder into a signed transaction and submits it once.
    /// Any status other than `Ok` is an error.
    pub async fn send(
        self,
        rpc_canister: &Service,
        rpc: RpcServices,
        signer: &EcdsaSigner,
    ) -> ManagerResult<SendRawTransactionStatus> {
        let fees = estimate_transaction_fees(
            FEE_HISTORY_BLOCK_COUNT,
            rpc.clone(),
            rpc_canister,
            BlockTag::Latest,
        )
        .await?;

        let request = self.into_request(fees);
        let signed_transaction = signer.sign_eip1559_transaction(request).await?;

        let config = get_rpc_config(None, provider_count(&rpc));
        let call_result = rpc_canister
            .eth_send_raw_transaction(rpc, Some(config), signed_transaction)
            .await;
        let status = extract_multi_rpc_result(extract_call_result(call_result)?)?;

        match status {
            SendRawTransactionStatus::Ok(ref hash) => {
                print(format!("[TRANSACTION] Submitted {:?}.", hash));
                Ok(status)
            }
            other => Err(ManagerError::TransactionRejected(format!("{:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_the_eip1559_request() {
        let request = TransactionBuilder::default()
            .to(Address::repeat_byte(0x22))
            .data(vec![0xab, 0xcd])
            .nonce(4)
            .chain_id(84532)
            .gas_limit(777_000)
            .into_request(FeeEstimates {
                max_fee_per_gas: 10,
                max_priority_fee_per_gas: 2,
            });

        assert_eq!(request.chain_id, 84532);
        assert_eq!(request.nonce, 4);
        assert_eq!(request.gas_limit, 777_000);
        assert_eq!(request.to, TxKind::Call(Address::repeat_byte(0x22)));
        assert_eq!(request.input, Bytes::from(vec![0xab, 0xcd]));
        assert_eq!(request.max_fee_per_gas, 10);
        assert_eq!(request.max_priority_fee_per_gas, 2);
        assert_eq!(request.value, U256::ZERO);
    }
}
