//! Generates the candid file automatically

use yield_rebalancer::YieldRebalancer;

fn main() {
    let canister_idl = YieldRebalancer::idl();
    let idl = candid::pretty::candid::compile(&canister_idl.env.env, &Some(canister_idl.actor));

    println!("{}", idl);
}
