//! Contract bindings backed by the EVM RPC canister.
//!
//! Reads are `eth_call`s against the configured providers of the contract's
//! chain. The rebalance report is signed with the canister's threshold ECDSA
//! key and submitted as a single EIP-1559 transaction.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use evm_rpc_types::RpcServices;
use ic_exports::ic_cdk::print;

use crate::{
    config::ChainConfig,
    types::*,
    utils::{
        common::{call_with_dynamic_retries, decode_abi_response, get_nonce, string_to_address},
        error::{ManagerError, ManagerResult},
        evm_rpc::{BlockTag, Service},
        signer::EcdsaSigner,
        transaction_builder::TransactionBuilder,
    },
};

use super::{
    Comet, InterestRateStrategy, LendingFactory, ParentPeer, PeerFactory, PoolAddressesProvider,
    ProtocolDataProvider, Rebalancer, YieldPeer,
};

/// A read-only contract on one chain
#[derive(Clone, Debug)]
pub struct EvmContract {
    rpc_canister: Service,
    services: RpcServices,
    address: Address,
    block: BlockTag,
}

impl EvmContract {
    async fn call<C: SolCall>(&self, call: C) -> ManagerResult<C::Return> {
        let response = call_with_dynamic_retries(
            &self.rpc_canister,
            &self.services,
            self.block.clone(),
            self.address,
            call.abi_encode(),
        )
        .await?;
        decode_abi_response::<C::Return, C>(response)
    }
}

impl PoolAddressesProvider for EvmContract {
    async fn get_pool_data_provider(&self) -> ManagerResult<Address> {
        Ok(self.call(getPoolDataProviderCall {}).await?._0)
    }
}

impl ProtocolDataProvider for EvmContract {
    async fn get_interest_rate_strategy_address(&self, asset: Address) -> ManagerResult<Address> {
        Ok(self
            .call(getInterestRateStrategyAddressCall { asset })
            .await?
            .irStrategyAddress)
    }

    async fn get_reserve_data(&self, asset: Address) -> ManagerResult<ReserveData> {
        let data = self.call(getReserveDataCall { asset }).await?;
        Ok(ReserveData {
            unbacked: data.unbacked,
            total_stable_debt: data.totalStableDebt,
            total_variable_debt: data.totalVariableDebt,
        })
    }

    async fn get_virtual_underlying_balance(&self, asset: Address) -> ManagerResult<U256> {
        Ok(self.call(getVirtualUnderlyingBalanceCall { asset }).await?._0)
    }

    async fn get_reserve_factor(&self, asset: Address) -> ManagerResult<U256> {
        Ok(self
            .call(getReserveConfigurationDataCall { asset })
            .await?
            .reserveFactor)
    }
}

impl InterestRateStrategy for EvmContract {
    async fn calculate_interest_rates(
        &self,
        params: &InterestRateParams,
    ) -> ManagerResult<InterestRates> {
        let rates = self
            .call(calculateInterestRatesCall {
                params: params.into(),
            })
            .await?;
        Ok(InterestRates {
            liquidity_rate: rates._0,
            variable_borrow_rate: rates._1,
        })
    }
}

impl Comet for EvmContract {
    async fn total_supply(&self) -> ManagerResult<U256> {
        Ok(self.call(totalSupplyCall {}).await?._0)
    }

    async fn total_borrow(&self) -> ManagerResult<U256> {
        Ok(self.call(totalBorrowCall {}).await?._0)
    }

    async fn get_supply_rate(&self, utilization: U256) -> ManagerResult<u64> {
        Ok(self.call(getSupplyRateCall { utilization }).await?._0)
    }
}

impl YieldPeer for EvmContract {
    async fn get_total_value(&self) -> ManagerResult<U256> {
        Ok(self.call(getTotalValueCall {}).await?._0)
    }
}

impl ParentPeer for EvmContract {
    async fn get_strategy(&self) -> ManagerResult<Strategy> {
        Ok(self.call(getStrategyCall {}).await?._0.into())
    }
}

/// `onReport(metadata, abi.encode(strategy))` calldata
pub fn rebalance_calldata(strategy: &Strategy) -> Vec<u8> {
    onReportCall {
        metadata: Bytes::new(),
        report: PeerStrategy::from(strategy).abi_encode().into(),
    }
    .abi_encode()
}

/// The rebalancer contract on the parent chain
pub struct EvmRebalancer {
    rpc_canister: Service,
    services: RpcServices,
    address: Address,
    chain_id: u64,
    signer: EcdsaSigner,
}

impl Rebalancer for EvmRebalancer {
    async fn write_rebalance(&self, strategy: &Strategy, gas_limit: u64) -> ManagerResult<()> {
        let signer = match self.signer.address {
            Some(_) => self.signer.clone(),
            None => EcdsaSigner {
                address: Some(self.signer.fetch_address().await?),
                ..self.signer.clone()
            },
        };
        let from = signer.address.ok_or(ManagerError::NonExistentValue)?;

        let nonce = get_nonce(&self.rpc_canister, &self.services, from).await?;
        let nonce = u64::try_from(nonce)
            .map_err(|err| ManagerError::DecodingError(format!("{:#?}", err)))?;

        print(format!(
            "[REBALANCE] Submitting {} to {} with nonce {} and gas limit {}.",
            strategy, self.address, nonce, gas_limit
        ));

        TransactionBuilder::default()
            .to(self.address)
            .data(rebalance_calldata(strategy))
            .nonce(nonce)
            .chain_id(self.chain_id)
            .gas_limit(gas_limit)
            .send(&self.rpc_canister, self.services.clone(), &signer)
            .await?;
        Ok(())
    }
}

/// Binds contracts through the EVM RPC canister
#[derive(Clone, Debug)]
pub struct EvmChains {
    pub rpc_canister: Service,
    pub signer: EcdsaSigner,
    /// Block every read is made at
    pub block: BlockTag,
}

impl EvmChains {
    fn contract(&self, chain: &ChainConfig, address: Address) -> EvmContract {
        EvmContract {
            rpc_canister: self.rpc_canister,
            services: chain.rpc_services(),
            address,
            block: self.block.clone(),
        }
    }

    fn bind(&self, chain: &ChainConfig, address: &str, field: &str) -> ManagerResult<EvmContract> {
        let address = string_to_address(chain.require_address(address, field)?.to_string())?;
        Ok(self.contract(chain, address))
    }
}

impl PeerFactory for EvmChains {
    type Parent = EvmContract;
    type Child = EvmContract;
    type Rebalancer = EvmRebalancer;

    fn parent_peer(&self, chain: &ChainConfig) -> ManagerResult<EvmContract> {
        self.bind(chain, &chain.yield_peer_address, "yieldPeerAddress")
    }

    fn child_peer(&self, chain: &ChainConfig) -> ManagerResult<EvmContract> {
        self.bind(chain, &chain.yield_peer_address, "yieldPeerAddress")
    }

    fn rebalancer(&self, chain: &ChainConfig) -> ManagerResult<EvmRebalancer> {
        let address = string_to_address(
            chain
                .require_address(&chain.rebalancer_address, "rebalancerAddress")?
                .to_string(),
        )?;
        Ok(EvmRebalancer {
            rpc_canister: self.rpc_canister,
            services: chain.rpc_services(),
            address,
            chain_id: chain.chain_id,
            signer: self.signer.clone(),
        })
    }
}

impl LendingFactory for EvmChains {
    type AddressesProvider = EvmContract;
    type DataProvider = EvmContract;
    type RateStrategy = EvmContract;
    type Comet = EvmContract;

    fn pool_addresses_provider(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> ManagerResult<EvmContract> {
        self.bind(chain, address, "aaveV3PoolAddressesProviderAddress")
    }

    fn protocol_data_provider(
        &self,
        chain: &ChainConfig,
        address: Address,
    ) -> ManagerResult<EvmContract> {
        Ok(self.contract(chain, address))
    }

    fn interest_rate_strategy(
        &self,
        chain: &ChainConfig,
        address: Address,
    ) -> ManagerResult<EvmContract> {
        Ok(self.contract(chain, address))
    }

    fn comet(&self, chain: &ChainConfig, address: &str) -> ManagerResult<EvmContract> {
        self.bind(chain, address, "compoundV3CometUSDCAddress")
    }
}
