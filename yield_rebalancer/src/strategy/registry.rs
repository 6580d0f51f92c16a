use crate::{
    config::WorkflowConfig,
    constants::{AAVE_V3_PROTOCOL_ID, COMPOUND_V3_PROTOCOL_ID},
    types::Strategy,
    utils::error::{ManagerError, ManagerResult},
};

/// Every configured chain crossed with every protocol deployed on it, in
/// configuration order (Aave V3 before Compound V3 on each chain).
/// A protocol whose address is empty on a chain is not offered there.
pub fn supported_strategies(config: &WorkflowConfig) -> ManagerResult<Vec<Strategy>> {
    let mut strategies = Vec::with_capacity(config.evms.len() * 2);

    for chain in &config.evms {
        if !chain.aave_v3_pool_addresses_provider_address.is_empty() {
            strategies.push(Strategy::new(AAVE_V3_PROTOCOL_ID, chain.chain_selector));
        }
        if !chain.compound_v3_comet_usdc_address.is_empty() {
            strategies.push(Strategy::new(COMPOUND_V3_PROTOCOL_ID, chain.chain_selector));
        }
    }

    if strategies.is_empty() {
        return Err(ManagerError::NoSupportedStrategies);
    }
    Ok(strategies)
}
