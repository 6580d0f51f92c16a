use std::cell::RefCell;

use ic_exports::candid::Principal;
use ic_stable_structures::{
    memory_manager::{MemoryId, MemoryManager, VirtualMemory},
    DefaultMemoryImpl, StableBTreeMap,
};

use crate::{
    config::WorkflowConfig,
    constants::JOURNAL_CAPACITY,
    journal::JournalCollection,
    strategy::lock::Lock,
    types::StrategyResult,
    utils::{evm_rpc::Service, signer::EcdsaSigner},
};

type Memory = VirtualMemory<DefaultMemoryImpl>;

const JOURNAL_MEMORY_ID: MemoryId = MemoryId::new(0);

thread_local! {
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));

    pub static JOURNAL: RefCell<StableBTreeMap<u64, JournalCollection, Memory>> = RefCell::new(
        StableBTreeMap::init(MEMORY_MANAGER.with(|manager| manager.borrow().get(JOURNAL_MEMORY_ID))),
    );

    pub static RPC_CANISTER: RefCell<Service> = RefCell::new(Service(Principal::anonymous()));
    pub static CONFIG: RefCell<WorkflowConfig> = RefCell::new(WorkflowConfig::default());
    pub static SIGNER: RefCell<EcdsaSigner> = RefCell::new(EcdsaSigner::default());
    pub static LAST_RESULT: RefCell<Option<StrategyResult>> = const { RefCell::new(None) };
    pub static TICK_LOCK: RefCell<Lock> = RefCell::new(Lock::default());
}

/// Appends a collection to the journal, dropping the oldest ones beyond capacity.
pub fn insert_journal_collection(collection: JournalCollection) {
    JOURNAL.with(|journal| {
        let mut journal = journal.borrow_mut();
        let key = journal.last_key_value().map_or(0, |(key, _)| key + 1);
        journal.insert(key, collection);

        while journal.len() > JOURNAL_CAPACITY {
            match journal.first_key_value() {
                Some((oldest, _)) => {
                    journal.remove(&oldest);
                }
                None => break,
            }
        }
    });
}

/// Returns up to `limit` journal collections, newest first.
pub fn latest_journal_collections(limit: usize) -> Vec<JournalCollection> {
    JOURNAL.with(|journal| {
        let mut collections: Vec<JournalCollection> = journal
            .borrow()
            .iter()
            .map(|(_, collection)| collection)
            .collect();
        collections.reverse();
        collections.truncate(limit);
        collections
    })
}
