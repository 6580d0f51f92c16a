use std::time::Duration;

use ic_exports::{
    ic_cdk::{api::time, print, spawn},
    ic_cdk_timers::set_timer,
};

use crate::{
    journal::{JournalCollection, LogType},
    state::{CONFIG, SIGNER},
    strategy::run::run_tick,
};

pub fn start_timers() {
    // derive the EVM address of the canister key
    set_timer(Duration::ZERO, || spawn(set_signer_address()));

    schedule_next_tick();
}

/// Arms a one-shot timer for the next cron occurrence. Each firing re-arms it.
fn schedule_next_tick() {
    let now = time() / 1_000_000_000;
    let delay = CONFIG.with(|config| config.borrow().seconds_until_next_tick(now));

    match delay {
        Ok(delay) => {
            set_timer(Duration::from_secs(delay), || {
                schedule_next_tick();
                spawn(run_tick());
            });
        }
        Err(err) => {
            print(format!("[TIMER] Could not schedule the next tick: {}", err));
            let mut journal = JournalCollection::open(time());
            journal.append_note(Err(err), LogType::Info, "No further ticks are scheduled.");
            journal.commit(time());
        }
    }
}

async fn set_signer_address() {
    let signer = SIGNER.with(|signer| signer.borrow().clone());
    let result = signer.fetch_address().await;

    let mut journal = JournalCollection::open(time());
    match result {
        Ok(address) => {
            SIGNER.with(|signer| signer.borrow_mut().address = Some(address));
            journal.append_note(
                Ok(()),
                LogType::Info,
                format!("Signer address is {}.", address),
            );
        }
        Err(err) => {
            journal.append_note(
                Err(err),
                LogType::Info,
                "Could not fetch the signer public key.",
            );
        }
    }
    journal.commit(time());
}
