use crate::{
    config::WorkflowConfig,
    journal::JournalCollection,
    state::*,
    timers::start_timers,
    types::StrategyResultRecord,
    utils::{evm_rpc::Service, signer::EcdsaSigner},
};
use ic_canister::{generate_idl, init, query, Canister, Idl, PreUpdate};
use ic_exports::{candid::Principal, ic_cdk::trap};

#[derive(Canister)]
pub struct YieldRebalancer {
    #[id]
    id: Principal,
}

impl PreUpdate for YieldRebalancer {}

impl YieldRebalancer {
    // INITIALIZATION
    #[init]
    pub fn init(&mut self, config: WorkflowConfig, rpc_principal: Principal, key_name: String) {
        if let Err(err) = config.validate() {
            trap(&format!("Invalid workflow configuration: {}", err));
        }

        RPC_CANISTER.with(|rpc_canister| *rpc_canister.borrow_mut() = Service(rpc_principal));
        SIGNER.with(|signer| *signer.borrow_mut() = EcdsaSigner::new(key_name));
        CONFIG.with(|stored| *stored.borrow_mut() = config);

        start_timers();
    }

    /// Latest journal collections, newest first
    #[query]
    pub fn get_journal(&self, limit: u64) -> Vec<JournalCollection> {
        latest_journal_collections(usize::try_from(limit).unwrap_or(usize::MAX))
    }

    /// Outcome of the last successful tick
    #[query]
    pub fn get_last_result(&self) -> Option<StrategyResultRecord> {
        LAST_RESULT.with(|last| last.borrow().as_ref().map(StrategyResultRecord::from))
    }

    #[query]
    pub fn get_signer_address(&self) -> Option<String> {
        SIGNER.with(|signer| signer.borrow().address.map(|address| address.to_string()))
    }

    #[query]
    pub fn get_config(&self) -> WorkflowConfig {
        CONFIG.with(|config| config.borrow().clone())
    }

    pub fn idl() -> Idl {
        generate_idl!()
    }
}
