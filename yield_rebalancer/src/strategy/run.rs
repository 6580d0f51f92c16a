use ic_exports::ic_cdk::{api::time, print};

use crate::{
    apy::ProtocolApy,
    chain::contracts::EvmChains,
    journal::{JournalCollection, LogType},
    state::{CONFIG, LAST_RESULT, RPC_CANISTER, SIGNER},
    types::StrategyResult,
    utils::{error::ManagerResult, evm_rpc::BlockTag},
};

use super::{engine::RebalanceEngine, lock::TickGuard, optimizer::YieldOptimizer};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Runs one rebalance tick. A failed tick is journaled and left for the next
/// scheduled one.
pub async fn run_tick() {
    let mut journal = JournalCollection::open(time());

    let guard = match TickGuard::acquire(time() / NANOS_PER_SECOND) {
        Ok(guard) => guard,
        Err(err) => {
            journal.append_note(
                Err(err),
                LogType::Info,
                "The previous tick is still running. This tick is skipped.",
            );
            journal.commit(time());
            return;
        }
    };

    let result = execute(&mut journal).await;

    match &result {
        Ok(result) => {
            LAST_RESULT.with(|last| *last.borrow_mut() = Some(*result));
            journal.append_note(
                Ok(()),
                LogType::ExecutionResult,
                format!(
                    "Tick finished. current: {}, optimal: {}, updated: {}.",
                    result.current, result.optimal, result.updated
                ),
            );
        }
        Err(err) => {
            print(format!("[TICK] Failed: {}", err));
            journal.append_note(
                Err(err.clone()),
                LogType::ExecutionResult,
                format!("Tick failed: {}", err),
            );
        }
    }

    drop(guard);
    journal.commit(time());
}

async fn execute(journal: &mut JournalCollection) -> ManagerResult<StrategyResult> {
    let config = CONFIG.with(|config| config.borrow().clone());
    let chains = EvmChains {
        rpc_canister: RPC_CANISTER.with(|rpc| *rpc.borrow()),
        signer: SIGNER.with(|signer| signer.borrow().clone()),
        block: BlockTag::at(config.block_number),
    };

    let optimizer = YieldOptimizer::new(ProtocolApy::new(&config, &chains));
    let mut engine = RebalanceEngine::new(&config, &chains, optimizer);
    engine.run(journal).await
}
