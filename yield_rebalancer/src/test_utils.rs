//! In-memory contracts and fixtures for the unit tests.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use alloy_primitives::{Address, U256};

use crate::{
    apy::ApySource,
    chain::{
        Comet, InterestRateStrategy, LendingFactory, ParentPeer, PeerFactory,
        PoolAddressesProvider, ProtocolDataProvider, Rebalancer, YieldPeer,
    },
    config::{ChainConfig, WorkflowConfig},
    strategy::optimizer::StrategyOptimizer,
    types::{InterestRateParams, InterestRates, ReserveData, Strategy, StrategyWithApy},
    utils::{
        common::string_to_address,
        error::{ManagerError, ManagerResult, Stage},
    },
};

pub const PARENT: u64 = 16015286601757825753;
pub const CHILD: u64 = 10344971235874465080;

pub fn parent_chain() -> ChainConfig {
    ChainConfig {
        chain_name: "parent".to_string(),
        chain_selector: PARENT,
        chain_id: 11155111,
        rpc_urls: vec!["https://parent.example.org".to_string()],
        yield_peer_address: "0x1111111111111111111111111111111111111111".to_string(),
        rebalancer_address: "0x2222222222222222222222222222222222222222".to_string(),
        gas_limit: 500_000,
        usdc_address: "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238".to_string(),
        aave_v3_pool_addresses_provider_address: "0x012bAC54348C0E635dCAc9D5FB99f06F24136C9A"
            .to_string(),
        compound_v3_comet_usdc_address: "0xAec1F48e02Cfb822Be958B68C7957156EB3F0b6e".to_string(),
    }
}

pub fn child_chain() -> ChainConfig {
    ChainConfig {
        chain_name: "child".to_string(),
        chain_selector: CHILD,
        chain_id: 84532,
        rpc_urls: vec!["https://child.example.org".to_string()],
        yield_peer_address: "0x3333333333333333333333333333333333333333".to_string(),
        rebalancer_address: String::new(),
        gas_limit: 777_000,
        usdc_address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
        aave_v3_pool_addresses_provider_address: "0xE4C23309117Aa30342BFaae6c95c6478e0A4Ad00"
            .to_string(),
        compound_v3_comet_usdc_address: "0x571621Ce60Cebb0c1D442B5afb38B1663C6Bf017".to_string(),
    }
}

pub fn two_chain_config() -> WorkflowConfig {
    WorkflowConfig {
        schedule: "0 */1 * * * *".to_string(),
        block_number: None,
        evms: vec![parent_chain(), child_chain()],
    }
}

fn failure(stage: Stage) -> ManagerError {
    ManagerError::Custom(format!("{} failed", stage))
}

/// Ordered record of contract interactions
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn push<S: Into<String>>(&self, call: S) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// State served by the lending protocol fakes
pub struct LendingState {
    pub data_provider: Address,
    pub rate_strategy: Address,
    pub reserve: ReserveData,
    pub virtual_balance: U256,
    pub reserve_factor: U256,
    pub liquidity_rate: U256,
    pub total_supply: U256,
    pub total_borrow: U256,
    pub supply_rate: u64,
    pub fail: Option<Stage>,
}

impl LendingState {
    /// A reserve paying roughly 3% on both protocols
    pub fn healthy() -> Self {
        Self {
            data_provider: Address::repeat_byte(0x0d),
            rate_strategy: Address::repeat_byte(0x0e),
            reserve: ReserveData {
                unbacked: U256::ZERO,
                total_stable_debt: U256::from(1_000_u64),
                total_variable_debt: U256::from(50_000_u64),
            },
            virtual_balance: U256::from(100_000_u64),
            reserve_factor: U256::from(1_000_u64),
            liquidity_rate: U256::from(30_000_000_000_000_000_000_000_000_u128),
            total_supply: U256::from(100_000_u64),
            total_borrow: U256::from(80_000_u64),
            supply_rate: 951_293_759,
            fail: None,
        }
    }
}

struct LendingShared {
    state: LendingState,
    log: CallLog,
    params: RefCell<Option<InterestRateParams>>,
    utilization: RefCell<Option<U256>>,
}

#[derive(Clone)]
pub struct FakeLending(Rc<LendingShared>);

impl FakeLending {
    pub fn new(state: LendingState) -> Self {
        Self(Rc::new(LendingShared {
            state,
            log: CallLog::default(),
            params: RefCell::new(None),
            utilization: RefCell::new(None),
        }))
    }

    pub fn log(&self) -> CallLog {
        self.0.log.clone()
    }

    pub fn last_params(&self) -> Option<InterestRateParams> {
        self.0.params.borrow().clone()
    }

    pub fn last_utilization(&self) -> Option<U256> {
        *self.0.utilization.borrow()
    }

    fn bind(&self, kind: &str, chain: &ChainConfig) -> FakeLendingContract {
        self.0.log.push(format!("bind:{}:{}", kind, chain.chain_name));
        FakeLendingContract(self.0.clone())
    }
}

pub struct FakeLendingContract(Rc<LendingShared>);

impl FakeLendingContract {
    fn call(&self, name: &str, stage: Stage) -> ManagerResult<&LendingState> {
        self.0.log.push(name);
        if self.0.state.fail == Some(stage) {
            return Err(failure(stage));
        }
        Ok(&self.0.state)
    }
}

impl LendingFactory for FakeLending {
    type AddressesProvider = FakeLendingContract;
    type DataProvider = FakeLendingContract;
    type RateStrategy = FakeLendingContract;
    type Comet = FakeLendingContract;

    fn pool_addresses_provider(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> ManagerResult<FakeLendingContract> {
        string_to_address(address.to_string())?;
        Ok(self.bind("addressesProvider", chain))
    }

    fn protocol_data_provider(
        &self,
        chain: &ChainConfig,
        _address: Address,
    ) -> ManagerResult<FakeLendingContract> {
        Ok(self.bind("dataProvider", chain))
    }

    fn interest_rate_strategy(
        &self,
        chain: &ChainConfig,
        _address: Address,
    ) -> ManagerResult<FakeLendingContract> {
        Ok(self.bind("rateStrategy", chain))
    }

    fn comet(&self, chain: &ChainConfig, address: &str) -> ManagerResult<FakeLendingContract> {
        string_to_address(address.to_string())?;
        Ok(self.bind("comet", chain))
    }
}

impl PoolAddressesProvider for FakeLendingContract {
    async fn get_pool_data_provider(&self) -> ManagerResult<Address> {
        Ok(self.call("getPoolDataProvider", Stage::PoolDataProvider)?.data_provider)
    }
}

impl ProtocolDataProvider for FakeLendingContract {
    async fn get_interest_rate_strategy_address(&self, _asset: Address) -> ManagerResult<Address> {
        Ok(self.call("getInterestRateStrategyAddress", Stage::RateStrategy)?.rate_strategy)
    }

    async fn get_reserve_data(&self, _asset: Address) -> ManagerResult<ReserveData> {
        Ok(self.call("getReserveData", Stage::ReserveData)?.reserve)
    }

    async fn get_virtual_underlying_balance(&self, _asset: Address) -> ManagerResult<U256> {
        Ok(self.call("getVirtualUnderlyingBalance", Stage::VirtualBalance)?.virtual_balance)
    }

    async fn get_reserve_factor(&self, _asset: Address) -> ManagerResult<U256> {
        Ok(self
            .call("getReserveConfigurationData", Stage::ReserveConfiguration)?
            .reserve_factor)
    }
}

impl InterestRateStrategy for FakeLendingContract {
    async fn calculate_interest_rates(
        &self,
        params: &InterestRateParams,
    ) -> ManagerResult<InterestRates> {
        let state = self.call("calculateInterestRates", Stage::InterestRates)?;
        *self.0.params.borrow_mut() = Some(params.clone());
        Ok(InterestRates {
            liquidity_rate: state.liquidity_rate,
            variable_borrow_rate: state.liquidity_rate,
        })
    }
}

impl Comet for FakeLendingContract {
    async fn total_supply(&self) -> ManagerResult<U256> {
        Ok(self.call("totalSupply", Stage::TotalSupply)?.total_supply)
    }

    async fn total_borrow(&self) -> ManagerResult<U256> {
        Ok(self.call("totalBorrow", Stage::TotalBorrow)?.total_borrow)
    }

    async fn get_supply_rate(&self, utilization: U256) -> ManagerResult<u64> {
        let state = self.call("getSupplyRate", Stage::SupplyRate)?;
        *self.0.utilization.borrow_mut() = Some(utilization);
        Ok(state.supply_rate)
    }
}

/// State served by the yield peer and rebalancer fakes
pub struct PeerState {
    pub current: Strategy,
    pub tvl: U256,
    pub fail: Option<Stage>,
}

struct PeerShared {
    state: PeerState,
    log: CallLog,
    writes: RefCell<Vec<(Strategy, u64)>>,
}

#[derive(Clone)]
pub struct FakePeers(Rc<PeerShared>);

impl FakePeers {
    pub fn new(state: PeerState) -> Self {
        Self(Rc::new(PeerShared {
            state,
            log: CallLog::default(),
            writes: RefCell::new(vec![]),
        }))
    }

    pub fn log(&self) -> CallLog {
        self.0.log.clone()
    }

    /// Submitted (strategy, gas limit) pairs
    pub fn writes(&self) -> Vec<(Strategy, u64)> {
        self.0.writes.borrow().clone()
    }

    fn bind(&self, kind: &str, chain: &ChainConfig) -> ManagerResult<FakePeer> {
        if self.0.state.fail == Some(Stage::Binding) {
            return Err(failure(Stage::Binding));
        }
        self.0.log.push(format!("bind:{}:{}", kind, chain.chain_name));
        Ok(FakePeer {
            shared: self.0.clone(),
            chain: chain.chain_name.clone(),
        })
    }
}

pub struct FakePeer {
    shared: Rc<PeerShared>,
    chain: String,
}

impl FakePeer {
    fn check(&self, call: &str, stage: Stage) -> ManagerResult<&PeerState> {
        self.shared.log.push(format!("{}:{}", call, self.chain));
        if self.shared.state.fail == Some(stage) {
            return Err(failure(stage));
        }
        Ok(&self.shared.state)
    }
}

impl PeerFactory for FakePeers {
    type Parent = FakePeer;
    type Child = FakePeer;
    type Rebalancer = FakePeer;

    fn parent_peer(&self, chain: &ChainConfig) -> ManagerResult<FakePeer> {
        self.bind("parent", chain)
    }

    fn child_peer(&self, chain: &ChainConfig) -> ManagerResult<FakePeer> {
        self.bind("child", chain)
    }

    fn rebalancer(&self, chain: &ChainConfig) -> ManagerResult<FakePeer> {
        self.bind("rebalancer", chain)
    }
}

impl YieldPeer for FakePeer {
    async fn get_total_value(&self) -> ManagerResult<U256> {
        Ok(self.check("getTotalValue", Stage::TotalValue)?.tvl)
    }
}

impl ParentPeer for FakePeer {
    async fn get_strategy(&self) -> ManagerResult<Strategy> {
        Ok(self.check("getStrategy", Stage::CurrentStrategy)?.current)
    }
}

impl Rebalancer for FakePeer {
    async fn write_rebalance(&self, strategy: &Strategy, gas_limit: u64) -> ManagerResult<()> {
        self.check("writeRebalance", Stage::Rebalance)?;
        self.shared.writes.borrow_mut().push((*strategy, gas_limit));
        Ok(())
    }
}

/// Optimizer returning a fixed outcome
pub struct FakeOptimizer {
    pub optimal: StrategyWithApy,
    pub current_apy: f64,
    pub init_error: Option<ManagerError>,
    pub error: Option<ManagerError>,
    pub calls: RefCell<Vec<(Strategy, U256)>>,
}

impl FakeOptimizer {
    pub fn new(optimal: Strategy, optimal_apy: f64, current_apy: f64) -> Self {
        Self {
            optimal: StrategyWithApy {
                strategy: optimal,
                apy: optimal_apy,
            },
            current_apy,
            init_error: None,
            error: None,
            calls: RefCell::new(vec![]),
        }
    }
}

impl StrategyOptimizer for FakeOptimizer {
    fn init_supported_strategies(&mut self, _config: &WorkflowConfig) -> ManagerResult<()> {
        match self.init_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn optimal_and_current(
        &self,
        current: Strategy,
        tvl: U256,
    ) -> ManagerResult<(StrategyWithApy, StrategyWithApy)> {
        self.calls.borrow_mut().push((current, tvl));
        if let Some(err) = self.error.clone() {
            return Err(err);
        }
        Ok((
            self.optimal,
            StrategyWithApy {
                strategy: current,
                apy: self.current_apy,
            },
        ))
    }
}

/// APY source backed by a lookup table
#[derive(Default)]
pub struct FakeApySource {
    pub apys: HashMap<Strategy, f64>,
    pub calls: RefCell<Vec<(Strategy, U256)>>,
}

impl FakeApySource {
    pub fn with(apys: &[(Strategy, f64)]) -> Self {
        Self {
            apys: apys.iter().copied().collect(),
            calls: RefCell::new(vec![]),
        }
    }
}

impl ApySource for FakeApySource {
    async fn apy(&self, strategy: &Strategy, liquidity_added: U256) -> ManagerResult<f64> {
        self.calls.borrow_mut().push((*strategy, liquidity_added));
        self.apys
            .get(strategy)
            .copied()
            .ok_or_else(|| ManagerError::UnsupportedProtocol(strategy.protocol_id.to_string()))
    }
}
