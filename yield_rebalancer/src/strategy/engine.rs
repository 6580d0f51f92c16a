//! The per-tick rebalance decision.
//!
//! Reads the active strategy from the parent peer, reads the TVL from the peer
//! on the chain holding that strategy, prices the alternatives and submits at
//! most one rebalance report. Every read completes before the write.

use alloy_primitives::U256;

use crate::{
    chain::{ParentPeer, PeerFactory, Rebalancer, YieldPeer},
    config::WorkflowConfig,
    constants::REBALANCE_THRESHOLD,
    journal::{JournalCollection, LogType},
    types::{StrategyResult, StrategyWithApy},
    utils::error::{ManagerResult, Stage},
};

use super::optimizer::StrategyOptimizer;

/// Outcome of comparing the current strategy with the optimal one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The optimal strategy is the current one
    Unchanged,
    /// The APY gain does not reach the threshold
    BelowThreshold,
    Rebalance,
}

/// Rebalances iff the strategies differ and `optimal.apy - current.apy >= 0.01`.
pub fn decide(current: &StrategyWithApy, optimal: &StrategyWithApy) -> Decision {
    if optimal.strategy == current.strategy {
        return Decision::Unchanged;
    }

    let delta = optimal.apy - current.apy;
    // NaN never rebalances
    if !(delta >= REBALANCE_THRESHOLD) {
        return Decision::BelowThreshold;
    }
    Decision::Rebalance
}

/// The peer on the chain that holds the active strategy.
/// On the parent chain this is the parent binding itself.
enum StrategyPeer<'p, P, C> {
    Parent(&'p P),
    Child(C),
}

impl<P: YieldPeer, C: YieldPeer> StrategyPeer<'_, P, C> {
    async fn get_total_value(&self) -> ManagerResult<U256> {
        match self {
            StrategyPeer::Parent(peer) => peer.get_total_value().await,
            StrategyPeer::Child(peer) => peer.get_total_value().await,
        }
    }
}

pub struct RebalanceEngine<'a, P, O> {
    config: &'a WorkflowConfig,
    peers: &'a P,
    optimizer: O,
}

impl<'a, P: PeerFactory, O: StrategyOptimizer> RebalanceEngine<'a, P, O> {
    pub fn new(config: &'a WorkflowConfig, peers: &'a P, optimizer: O) -> Self {
        Self {
            config,
            peers,
            optimizer,
        }
    }

    /// Runs one tick. Returns the compared strategies and whether a report was submitted.
    pub async fn run(&mut self, journal: &mut JournalCollection) -> ManagerResult<StrategyResult> {
        self.optimizer.init_supported_strategies(self.config)?;

        let parent = self.config.parent()?;
        let parent_name = parent.chain_name.as_str();

        let parent_peer = self
            .peers
            .parent_peer(parent)
            .map_err(|err| err.at(parent_name, Stage::Binding))?;

        let current = parent_peer
            .get_strategy()
            .await
            .map_err(|err| err.at(parent_name, Stage::CurrentStrategy))?;

        journal.append_note(
            Ok(()),
            LogType::Info,
            format!("Read current strategy {} from the parent peer.", current),
        );

        let (strategy_peer, strategy_chain) = if current.chain_selector == parent.chain_selector {
            (StrategyPeer::Parent(&parent_peer), parent)
        } else {
            let chain = self.config.find_chain(current.chain_selector)?;
            let peer = self
                .peers
                .child_peer(chain)
                .map_err(|err| err.at(chain.chain_name.as_str(), Stage::Binding))?;
            (StrategyPeer::Child(peer), chain)
        };
        let gas_limit = strategy_chain.gas_limit;

        let tvl = strategy_peer
            .get_total_value()
            .await
            .map_err(|err| err.at(strategy_chain.chain_name.as_str(), Stage::TotalValue))?;

        journal.append_note(
            Ok(()),
            LogType::Info,
            format!("TVL on {} is {}.", strategy_chain.chain_name, tvl),
        );

        let (optimal, current) = self
            .optimizer
            .optimal_and_current(current, tvl)
            .await
            .map_err(|err| err.at(parent_name, Stage::Optimizer))?;

        let decision = decide(&current, &optimal);
        journal.append_note(
            Ok(()),
            LogType::Decision,
            format!(
                "{:?}: current {} apy {}, optimal {} apy {}, delta {}, threshold {}.",
                decision,
                current.strategy,
                current.apy,
                optimal.strategy,
                optimal.apy,
                optimal.apy - current.apy,
                REBALANCE_THRESHOLD
            ),
        );

        let updated = decision == Decision::Rebalance;
        if updated {
            let rebalancer = self
                .peers
                .rebalancer(parent)
                .map_err(|err| err.at(parent_name, Stage::Binding))?;

            rebalancer
                .write_rebalance(&optimal.strategy, gas_limit)
                .await
                .map_err(|err| err.at(parent_name, Stage::Rebalance))?;

            journal.append_note(
                Ok(()),
                LogType::Rebalance,
                format!(
                    "Submitted rebalance to {} with gas limit {}.",
                    optimal.strategy, gas_limit
                ),
            );
        }

        Ok(StrategyResult {
            current: current.strategy,
            optimal: optimal.strategy,
            updated,
        })
    }
}
