//! Yield Rebalancer's Constants

use alloy_primitives::{b256, B256};

/// Seconds in a 365-day year. Rates compound once per second.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Decimals of the RAY fixed point format used for Aave rates
pub const RAY_DECIMALS: u32 = 27;

/// Decimals of the WAD fixed point format used by Comet
pub const WAD_DECIMALS: u32 = 18;

/// WAD scale (e18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Highest accepted APR, as a ratio (10 => 1000%).
/// Anything above is treated as corrupted on-chain rate data.
pub const MAX_APR: u64 = 10;

/// Minimum APY gain required to rebalance.
/// Compared against the plain difference of the two APY floats.
pub const REBALANCE_THRESHOLD: f64 = 0.01;

/// keccak256("aave-v3")
pub const AAVE_V3_PROTOCOL_ID: B256 =
    b256!("bbbf88eb3aaea499bd8961e51ce38087d4dda7879001b87ead64f8a7a3d0b2da");

/// keccak256("compound-v3")
pub const COMPOUND_V3_PROTOCOL_ID: B256 =
    b256!("3af167fff8b2aadd8bc497987eee3c5c291f8d6741dda2249d1df61732ddfda1");

/// Default max response bytes
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 8_000;

/// Response size ceiling of an HTTPS outcall
pub const MAX_RESPONSE_BYTES_CEILING: u64 = 2_000_000;

/// Number of providers needed to reach consensus
pub const PROVIDER_THRESHOLD: u8 = 2;

/// Cycles attached to an `eth_call` request
pub const ETH_CALL_CYCLES: u128 = 10_000_000_000;

/// Cycles attached to an `eth_feeHistory` request
pub const FEE_HISTORY_CYCLES: u128 = 25_000_000_000;

/// Cycles attached to an `eth_getTransactionCount` request
pub const TRANSACTION_COUNT_CYCLES: u128 = 10_000_000_000;

/// Cycles attached to an `eth_sendRawTransaction` request
pub const SEND_TRANSACTION_CYCLES: u128 = 25_000_000_000;

/// Cycles attached to a `sign_with_ecdsa` request
pub const SIGN_WITH_ECDSA_CYCLES: u64 = 26_153_846_153;

/// Number of blocks used for fee estimation
pub const FEE_HISTORY_BLOCK_COUNT: u8 = 9;

/// Max number of journal entries kept in stable memory
pub const JOURNAL_CAPACITY: u64 = 500;

/// Time after which a held tick lock is considered abandoned (seconds)
pub const TICK_LOCK_TIMEOUT: u64 = 3600;
