//! Contract boundary.
//!
//! Each trait mirrors the read (or write) surface of one on-chain contract.
//! Factories bind a contract at a configured address on a configured chain.
//! Binding never touches the network; an address that fails to parse is
//! rejected at bind time.

pub(crate) mod contracts;

use alloy_primitives::{Address, U256};

use crate::{
    config::ChainConfig,
    types::{InterestRateParams, InterestRates, ReserveData, Strategy},
    utils::error::ManagerResult,
};

#[allow(async_fn_in_trait)]
pub trait PoolAddressesProvider {
    async fn get_pool_data_provider(&self) -> ManagerResult<Address>;
}

#[allow(async_fn_in_trait)]
pub trait ProtocolDataProvider {
    async fn get_interest_rate_strategy_address(&self, asset: Address) -> ManagerResult<Address>;
    async fn get_reserve_data(&self, asset: Address) -> ManagerResult<ReserveData>;
    async fn get_virtual_underlying_balance(&self, asset: Address) -> ManagerResult<U256>;
    /// Returns the reserve factor of the asset (basis points)
    async fn get_reserve_factor(&self, asset: Address) -> ManagerResult<U256>;
}

#[allow(async_fn_in_trait)]
pub trait InterestRateStrategy {
    async fn calculate_interest_rates(
        &self,
        params: &InterestRateParams,
    ) -> ManagerResult<InterestRates>;
}

#[allow(async_fn_in_trait)]
pub trait Comet {
    async fn total_supply(&self) -> ManagerResult<U256>;
    async fn total_borrow(&self) -> ManagerResult<U256>;
    /// Per-second supply rate for the given utilization (both WAD)
    async fn get_supply_rate(&self, utilization: U256) -> ManagerResult<u64>;
}

#[allow(async_fn_in_trait)]
pub trait YieldPeer {
    async fn get_total_value(&self) -> ManagerResult<U256>;
}

#[allow(async_fn_in_trait)]
pub trait ParentPeer: YieldPeer {
    async fn get_strategy(&self) -> ManagerResult<Strategy>;
}

#[allow(async_fn_in_trait)]
pub trait Rebalancer {
    /// Submits the new strategy. Exactly one transaction per call, never retried.
    async fn write_rebalance(&self, strategy: &Strategy, gas_limit: u64) -> ManagerResult<()>;
}

/// Binds the yield peers and the rebalancer of a chain.
pub trait PeerFactory {
    type Parent: ParentPeer;
    type Child: YieldPeer;
    type Rebalancer: Rebalancer;

    fn parent_peer(&self, chain: &ChainConfig) -> ManagerResult<Self::Parent>;
    fn child_peer(&self, chain: &ChainConfig) -> ManagerResult<Self::Child>;
    fn rebalancer(&self, chain: &ChainConfig) -> ManagerResult<Self::Rebalancer>;
}

/// Binds the lending protocol contracts of a chain.
pub trait LendingFactory {
    type AddressesProvider: PoolAddressesProvider;
    type DataProvider: ProtocolDataProvider;
    type RateStrategy: InterestRateStrategy;
    type Comet: Comet;

    fn pool_addresses_provider(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> ManagerResult<Self::AddressesProvider>;
    fn protocol_data_provider(
        &self,
        chain: &ChainConfig,
        address: Address,
    ) -> ManagerResult<Self::DataProvider>;
    fn interest_rate_strategy(
        &self,
        chain: &ChainConfig,
        address: Address,
    ) -> ManagerResult<Self::RateStrategy>;
    fn comet(&self, chain: &ChainConfig, address: &str) -> ManagerResult<Self::Comet>;
}
