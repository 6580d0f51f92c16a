use std::fmt;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::sol;
use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::constants::{AAVE_V3_PROTOCOL_ID, COMPOUND_V3_PROTOCOL_ID};

/// A lending protocol on a specific chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub protocol_id: B256,
    pub chain_selector: u64,
}

impl Strategy {
    pub fn new(protocol_id: B256, chain_selector: u64) -> Self {
        Self {
            protocol_id,
            chain_selector,
        }
    }

    /// Human readable name of the protocol, if it is a supported one.
    pub fn protocol_name(&self) -> Option<&'static str> {
        match self.protocol_id {
            id if id == AAVE_V3_PROTOCOL_ID => Some("aave-v3"),
            id if id == COMPOUND_V3_PROTOCOL_ID => Some("compound-v3"),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol_name() {
            Some(name) => write!(f, "{}@{}", name, self.chain_selector),
            None => write!(f, "{}@{}", self.protocol_id, self.chain_selector),
        }
    }
}

impl From<PeerStrategy> for Strategy {
    fn from(value: PeerStrategy) -> Self {
        Self {
            protocol_id: value.protocolId,
            chain_selector: value.chainSelector,
        }
    }
}

impl From<&Strategy> for PeerStrategy {
    fn from(value: &Strategy) -> Self {
        Self {
            protocolId: value.protocol_id,
            chainSelector: value.chain_selector,
        }
    }
}

/// A strategy together with its evaluated APY
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrategyWithApy {
    pub strategy: Strategy,
    pub apy: f64,
}

/// Outcome of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub current: Strategy,
    pub optimal: Strategy,
    pub updated: bool,
}

/// Candid view of a strategy
#[derive(Clone, Debug, PartialEq, CandidType, Deserialize)]
pub struct StrategyRecord {
    pub protocol_id: String,
    pub chain_selector: u64,
}

impl From<&Strategy> for StrategyRecord {
    fn from(value: &Strategy) -> Self {
        Self {
            protocol_id: value.protocol_id.to_string(),
            chain_selector: value.chain_selector,
        }
    }
}

/// Candid view of a tick outcome
#[derive(Clone, Debug, PartialEq, CandidType, Deserialize)]
pub struct StrategyResultRecord {
    pub current: StrategyRecord,
    pub optimal: StrategyRecord,
    pub updated: bool,
}

impl From<&StrategyResult> for StrategyResultRecord {
    fn from(value: &StrategyResult) -> Self {
        Self {
            current: (&value.current).into(),
            optimal: (&value.optimal).into(),
            updated: value.updated,
        }
    }
}

/// Inputs of `calculateInterestRates` on an Aave rate strategy contract
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterestRateParams {
    pub unbacked: U256,
    pub liquidity_added: U256,
    pub liquidity_taken: U256,
    pub total_debt: U256,
    pub reserve_factor: U256,
    pub reserve: Address,
    pub using_virtual_balance: bool,
    pub virtual_underlying_balance: U256,
}

impl From<&InterestRateParams> for CalculateInterestRatesParams {
    fn from(value: &InterestRateParams) -> Self {
        Self {
            unbacked: value.unbacked,
            liquidityAdded: value.liquidity_added,
            liquidityTaken: value.liquidity_taken,
            totalDebt: value.total_debt,
            reserveFactor: value.reserve_factor,
            reserve: value.reserve,
            usingVirtualBalance: value.using_virtual_balance,
            virtualUnderlyingBalance: value.virtual_underlying_balance,
        }
    }
}

/// The reserve data fields the rate computation needs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReserveData {
    pub unbacked: U256,
    pub total_stable_debt: U256,
    pub total_variable_debt: U256,
}

/// Rates returned by a rate strategy contract (RAY)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterestRates {
    pub liquidity_rate: U256,
    pub variable_borrow_rate: U256,
}

sol!(
    struct PeerStrategy {
        bytes32 protocolId;
        uint64 chainSelector;
    }

    struct CalculateInterestRatesParams {
        uint256 unbacked;
        uint256 liquidityAdded;
        uint256 liquidityTaken;
        uint256 totalDebt;
        uint256 reserveFactor;
        address reserve;
        bool usingVirtualBalance;
        uint256 virtualUnderlyingBalance;
    }

    // Aave V3 pool addresses provider
    function getPoolDataProvider() external view returns (address);

    // Aave V3 protocol data provider
    function getInterestRateStrategyAddress(address asset) external view returns (address irStrategyAddress);
    function getReserveData(address asset) external view returns (
        uint256 unbacked,
        uint256 accruedToTreasuryScaled,
        uint256 totalAToken,
        uint256 totalStableDebt,
        uint256 totalVariableDebt,
        uint256 liquidityRate,
        uint256 variableBorrowRate,
        uint256 stableBorrowRate,
        uint256 averageStableBorrowRate,
        uint256 liquidityIndex,
        uint256 variableBorrowIndex,
        uint40 lastUpdateTimestamp
    );
    function getVirtualUnderlyingBalance(address asset) external view returns (uint256);
    function getReserveConfigurationData(address asset) external view returns (
        uint256 decimals,
        uint256 ltv,
        uint256 liquidationThreshold,
        uint256 liquidationBonus,
        uint256 reserveFactor,
        bool usageAsCollateralEnabled,
        bool borrowingEnabled,
        bool stableBorrowRateEnabled,
        bool isActive,
        bool isFrozen
    );

    // Aave V3 default interest rate strategy
    function calculateInterestRates(CalculateInterestRatesParams memory params) external view returns (uint256, uint256);

    // Compound V3 comet
    function totalSupply() external view returns (uint256);
    function totalBorrow() external view returns (uint256);
    function getSupplyRate(uint256 utilization) external view returns (uint64);

    // Yield peers
    function getTotalValue() external view returns (uint256);
    function getStrategy() external view returns (PeerStrategy memory);

    // Rebalancer
    function onReport(bytes calldata metadata, bytes calldata report) external;
);
