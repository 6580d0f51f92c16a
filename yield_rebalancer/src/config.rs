//! Workflow configuration: the cron schedule and the ordered chain list.
//!
//! The first chain of `evms` is the parent chain. It hosts the parent yield
//! peer (which records the active strategy) and the rebalancer contract.

use std::str::FromStr;

use candid::CandidType;
use chrono::{DateTime, Utc};
use cron::Schedule;
use evm_rpc_types::{RpcApi, RpcServices};
use serde::{Deserialize, Serialize};

use crate::utils::error::{ManagerError, ManagerResult};

/// Per-chain configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, CandidType, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(rename = "chainName")]
    pub chain_name: String,
    #[serde(rename = "chainSelector")]
    pub chain_selector: u64,
    /// EVM chain id, used for RPC routing and transaction signing
    #[serde(rename = "chainId", default)]
    pub chain_id: u64,
    /// JSON-RPC endpoints handed to the EVM RPC canister
    #[serde(rename = "rpcUrls", default)]
    pub rpc_urls: Vec<String>,
    #[serde(rename = "yieldPeerAddress")]
    pub yield_peer_address: String,
    #[serde(rename = "rebalancerAddress")]
    pub rebalancer_address: String,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
    #[serde(rename = "usdcAddress", default)]
    pub usdc_address: String,
    #[serde(rename = "aaveV3PoolAddressesProviderAddress", default)]
    pub aave_v3_pool_addresses_provider_address: String,
    #[serde(rename = "compoundV3CometUSDCAddress", default)]
    pub compound_v3_comet_usdc_address: String,
}

impl ChainConfig {
    /// Providers for this chain in the EVM RPC canister format.
    pub fn rpc_services(&self) -> RpcServices {
        RpcServices::Custom {
            chain_id: self.chain_id,
            services: self
                .rpc_urls
                .iter()
                .map(|url| RpcApi {
                    url: url.clone(),
                    headers: None,
                })
                .collect(),
        }
    }

    /// Returns the configured address or an `EmptyAddress` error naming the field.
    pub fn require_address<'a>(&self, address: &'a str, field: &str) -> ManagerResult<&'a str> {
        if address.is_empty() {
            return Err(ManagerError::EmptyAddress {
                chain: self.chain_name.clone(),
                field: field.to_string(),
            });
        }
        Ok(address)
    }
}

/// Workflow configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, CandidType, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Six-field cron expression (seconds first)
    pub schedule: String,
    /// Block to read at. Reads use the latest block when unset.
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<u64>,
    /// Parent chain first
    pub evms: Vec<ChainConfig>,
}

impl WorkflowConfig {
    /// Parses the `config.json` layout
    pub fn from_json(json: &str) -> ManagerResult<Self> {
        serde_json::from_str(json).map_err(|err| {
            ManagerError::DecodingError(format!("Could not decode the workflow config: {}", err))
        })
    }

    /// Checks the parts of the configuration every tick relies on.
    /// Per-chain addresses are checked by the stage that uses them.
    pub fn validate(&self) -> ManagerResult<()> {
        self.cron_schedule()?;
        self.parent()?;
        for chain in &self.evms {
            if chain.rpc_urls.is_empty() {
                return Err(ManagerError::EmptyAddress {
                    chain: chain.chain_name.clone(),
                    field: "rpcUrls".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The parent chain, `evms[0]`
    pub fn parent(&self) -> ManagerResult<&ChainConfig> {
        self.evms.first().ok_or(ManagerError::NoChainConfigured)
    }

    pub fn find_chain(&self, chain_selector: u64) -> ManagerResult<&ChainConfig> {
        self.evms
            .iter()
            .find(|chain| chain.chain_selector == chain_selector)
            .ok_or(ManagerError::MissingChainConfig(chain_selector))
    }

    pub fn cron_schedule(&self) -> ManagerResult<Schedule> {
        Schedule::from_str(&self.schedule)
            .map_err(|err| ManagerError::InvalidSchedule(format!("{}: {}", self.schedule, err)))
    }

    /// Seconds from `now` (unix seconds) until the next scheduled tick.
    pub fn seconds_until_next_tick(&self, now: u64) -> ManagerResult<u64> {
        let schedule = self.cron_schedule()?;
        let now_secs = i64::try_from(now)
            .map_err(|_| ManagerError::Custom("Current time does not fit in i64.".to_string()))?;
        let now_time: DateTime<Utc> = DateTime::from_timestamp(now_secs, 0)
            .ok_or_else(|| ManagerError::Custom(format!("Invalid timestamp {}", now)))?;
        let next = schedule
            .after(&now_time)
            .next()
            .ok_or_else(|| ManagerError::InvalidSchedule("no upcoming occurrence".to_string()))?;
        let delay = next.timestamp() - now_secs;
        Ok(delay.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "schedule": "0 */1 * * * *",
        "evms": [
            {
                "chainName": "ethereum-testnet-sepolia",
                "chainSelector": 16015286601757825753,
                "chainId": 11155111,
                "rpcUrls": ["https://sepolia.example.org"],
                "yieldPeerAddress": "0x1111111111111111111111111111111111111111",
                "rebalancerAddress": "0x2222222222222222222222222222222222222222",
                "gasLimit": 500000,
                "usdcAddress": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238",
                "aaveV3PoolAddressesProviderAddress": "0x012bAC54348C0E635dCAc9D5FB99f06F24136C9A",
                "compoundV3CometUSDCAddress": "0xAec1F48e02Cfb822Be958B68C7957156EB3F0b6e"
            },
            {
                "chainName": "ethereum-testnet-sepolia-base-1",
                "chainSelector": 10344971235874465080,
                "chainId": 84532,
                "rpcUrls": ["https://base-sepolia.example.org"],
                "yieldPeerAddress": "0x3333333333333333333333333333333333333333",
                "rebalancerAddress": "",
                "gasLimit": 777000
            }
        ]
    }"#;

    #[test]
    fn parses_the_json_layout() {
        let config = WorkflowConfig::from_json(CONFIG).unwrap();

        assert_eq!(config.schedule, "0 */1 * * * *");
        assert_eq!(config.block_number, None);
        assert_eq!(config.evms.len(), 2);

        let parent = config.parent().unwrap();
        assert_eq!(parent.chain_name, "ethereum-testnet-sepolia");
        assert_eq!(parent.gas_limit, 500000);
        assert_eq!(parent.chain_id, 11155111);

        let child = config.find_chain(10344971235874465080).unwrap();
        assert_eq!(child.gas_limit, 777000);
        assert!(child.usdc_address.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_selector_is_missing_config() {
        let config = WorkflowConfig::from_json(CONFIG).unwrap();
        assert_eq!(
            config.find_chain(1).unwrap_err(),
            ManagerError::MissingChainConfig(1)
        );
    }

    #[test]
    fn empty_evms_fail_validation() {
        let config = WorkflowConfig {
            schedule: "0 */1 * * * *".to_string(),
            block_number: None,
            evms: vec![],
        };
        assert_eq!(config.validate().unwrap_err(), ManagerError::NoChainConfigured);
    }

    #[test]
    fn bad_schedule_fails_validation() {
        let mut config = WorkflowConfig::from_json(CONFIG).unwrap();
        config.schedule = "every minute".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ManagerError::InvalidSchedule(_)
        ));
    }

    #[test]
    fn chain_without_rpc_urls_fails_validation() {
        let mut config = WorkflowConfig::from_json(CONFIG).unwrap();
        config.evms[1].rpc_urls.clear();
        assert!(matches!(
            config.validate().unwrap_err(),
            ManagerError::EmptyAddress { field, .. } if field == "rpcUrls"
        ));
    }

    #[test]
    fn next_tick_is_on_the_minute() {
        let config = WorkflowConfig::from_json(CONFIG).unwrap();
        // 2024-01-01T00:00:30Z
        assert_eq!(config.seconds_until_next_tick(1_704_067_230).unwrap(), 30);
        // exactly on a minute boundary, the next occurrence is a minute later
        assert_eq!(config.seconds_until_next_tick(1_704_067_200).unwrap(), 60);
    }

    #[test]
    fn rpc_services_are_custom_per_chain() {
        let config = WorkflowConfig::from_json(CONFIG).unwrap();
        match config.parent().unwrap().rpc_services() {
            RpcServices::Custom { chain_id, services } => {
                assert_eq!(chain_id, 11155111);
                assert_eq!(services.len(), 1);
                assert_eq!(services[0].url, "https://sepolia.example.org");
            }
            other => panic!("unexpected services {:?}", other),
        }
    }
}
