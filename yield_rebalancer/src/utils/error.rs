use std::fmt;

use candid::CandidType;
use evm_rpc_types::RpcError;
use ic_exports::ic_cdk::api::call::RejectionCode;
use serde::Deserialize;

/// Yield Rebalancer Canister Result
pub type ManagerResult<T> = Result<T, ManagerError>;

/// The step of a tick or APY computation that produced an error.
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum Stage {
    /// Binding a contract client
    Binding,
    /// `ParentPeer.getStrategy`
    CurrentStrategy,
    /// `YieldPeer.getTotalValue`
    TotalValue,
    /// Evaluating the strategy APYs
    Optimizer,
    /// `PoolAddressesProvider.getPoolDataProvider`
    PoolDataProvider,
    /// `ProtocolDataProvider.getInterestRateStrategyAddress`
    RateStrategy,
    /// `ProtocolDataProvider.getReserveData`
    ReserveData,
    /// `ProtocolDataProvider.getVirtualUnderlyingBalance`
    VirtualBalance,
    /// `ProtocolDataProvider.getReserveConfigurationData`
    ReserveConfiguration,
    /// `InterestRateStrategy.calculateInterestRates`
    InterestRates,
    /// `Comet.totalSupply`
    TotalSupply,
    /// `Comet.totalBorrow`
    TotalBorrow,
    /// `Comet.getSupplyRate`
    SupplyRate,
    /// Rate to APY conversion
    Conversion,
    /// Rebalancer report submission
    Rebalance,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Binding => "contract binding",
            Stage::CurrentStrategy => "read current strategy",
            Stage::TotalValue => "read total value",
            Stage::Optimizer => "optimal strategy",
            Stage::PoolDataProvider => "get pool data provider",
            Stage::RateStrategy => "get interest rate strategy address",
            Stage::ReserveData => "get reserve data",
            Stage::VirtualBalance => "get virtual underlying balance",
            Stage::ReserveConfiguration => "get reserve configuration data",
            Stage::InterestRates => "calculate interest rates",
            Stage::TotalSupply => "get total supply",
            Stage::TotalBorrow => "get total borrow",
            Stage::SupplyRate => "get supply rate",
            Stage::Conversion => "apr to apy conversion",
            Stage::Rebalance => "write rebalance",
        };
        f.write_str(name)
    }
}

/// Yield Rebalancer Canister Errors
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub enum ManagerError {
    /// `CallResult` error
    CallResult(RejectionCode, String),
    /// A requested value does not exist
    NonExistentValue,
    /// Wrapper for the RPC errors returned by the EVM RPC canister
    RpcResponseError(RpcError),
    /// Decoding issue
    DecodingError(String),
    /// A tick is already running
    Locked,
    /// Unknown/Custom error
    Custom(String),
    /// No consensus was reached among RPC providers
    NoConsensus,
    /// Arithmetic error
    Arithmetic(String),
    /// The workflow configuration has no chains
    NoChainConfigured,
    /// No chain configuration matches the selector
    MissingChainConfig(u64),
    /// A required address is not configured for the chain
    EmptyAddress { chain: String, field: String },
    /// The liquidity delta of an APY query was not provided
    MissingLiquidityDelta,
    /// The cron schedule could not be parsed
    InvalidSchedule(String),
    /// A contract returned the zero address
    InvalidProviderAddress { contract: String },
    /// The APR input of the converter was missing
    InvalidInput,
    /// The APR is above the sanity ceiling
    AprOutOfRange(String),
    /// The APY is NaN or infinite
    InvalidApy(String),
    /// A strategy evaluated to a zero APY
    ZeroApy(String),
    /// The protocol id has no APY source
    UnsupportedProtocol(String),
    /// The supported strategy set is empty
    NoSupportedStrategies,
    /// The EVM RPC canister did not accept the transaction
    TransactionRejected(String),
    /// An error raised while running a stage on a chain
    Stage {
        chain: String,
        stage: Stage,
        reason: Box<ManagerError>,
    },
}

impl ManagerError {
    /// Wraps the error with the chain name and stage it happened in.
    pub fn at<S: Into<String>>(self, chain: S, stage: Stage) -> Self {
        ManagerError::Stage {
            chain: chain.into(),
            stage,
            reason: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping the stage wrappers.
    pub fn root_cause(&self) -> &ManagerError {
        match self {
            ManagerError::Stage { reason, .. } => reason.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::CallResult(code, message) => {
                write!(f, "canister call rejected ({:?}): {}", code, message)
            }
            ManagerError::NonExistentValue => f.write_str("value does not exist"),
            ManagerError::RpcResponseError(err) => write!(f, "rpc error: {:?}", err),
            ManagerError::DecodingError(message) => write!(f, "decoding error: {}", message),
            ManagerError::Locked => f.write_str("a tick is already in progress"),
            ManagerError::Custom(message) => f.write_str(message),
            ManagerError::NoConsensus => f.write_str("no consensus among rpc providers"),
            ManagerError::Arithmetic(message) => write!(f, "arithmetic error: {}", message),
            ManagerError::NoChainConfigured => f.write_str("no evm chains configured"),
            ManagerError::MissingChainConfig(selector) => {
                write!(f, "no evm config found for chainSelector {}", selector)
            }
            ManagerError::EmptyAddress { chain, field } => {
                write!(f, "{} not configured for chain {}", field, chain)
            }
            ManagerError::MissingLiquidityDelta => {
                f.write_str("liquidity delta is missing (use zero for the current apy)")
            }
            ManagerError::InvalidSchedule(message) => {
                write!(f, "invalid cron schedule: {}", message)
            }
            ManagerError::InvalidProviderAddress { contract } => {
                write!(f, "{} returned the zero address", contract)
            }
            ManagerError::InvalidInput => f.write_str("apr is missing"),
            ManagerError::AprOutOfRange(apr) => write!(f, "APR exceeds 1000%: {}", apr),
            ManagerError::InvalidApy(apy) => write!(f, "apy is not finite: {}", apy),
            ManagerError::ZeroApy(strategy) => write!(f, "apy is zero for {}", strategy),
            ManagerError::UnsupportedProtocol(id) => write!(f, "unsupported protocol id {}", id),
            ManagerError::NoSupportedStrategies => f.write_str("no supported strategies"),
            ManagerError::TransactionRejected(status) => {
                write!(f, "transaction was not accepted: {}", status)
            }
            ManagerError::Stage {
                chain,
                stage,
                reason,
            } => write!(f, "chain '{}' / {}: {}", chain, stage, reason),
        }
    }
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> ManagerError {
    ManagerError::Arithmetic(format!("{:#?}", s.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapping_renders_chain_and_stage() {
        let err = ManagerError::MissingChainConfig(42)
            .at("ethereum-testnet-sepolia", Stage::ReserveData)
            .at("ethereum-testnet-sepolia", Stage::Optimizer);

        assert_eq!(
            err.to_string(),
            "chain 'ethereum-testnet-sepolia' / optimal strategy: chain 'ethereum-testnet-sepolia' / get reserve data: no evm config found for chainSelector 42"
        );
        assert_eq!(err.root_cause(), &ManagerError::MissingChainConfig(42));
    }

    #[test]
    fn root_cause_of_plain_error_is_itself() {
        let err = ManagerError::InvalidInput;
        assert_eq!(err.root_cause(), &ManagerError::InvalidInput);
    }
}
