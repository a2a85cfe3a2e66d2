//! Events published by the CREDIT token.
//!
//! Balance movements keep the standard token event shape (action and
//! addresses in the topics, amount as data) so wallets and indexers read
//! CREDIT like any other Soroban token.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MinterEvent {
    pub minter: Address,
    pub enabled: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApproveEvent {
    pub amount: i128,
    pub expiration_ledger: u32,
}

pub fn publish_minter(env: &Env, event: MinterEvent) {
    env.events()
        .publish((symbol_short!("credit"), symbol_short!("minter")), event);
}

pub fn publish_mint(env: &Env, minter: Address, to: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("mint"), minter, to), amount);
}

pub fn publish_approve(env: &Env, from: Address, spender: Address, event: ApproveEvent) {
    env.events()
        .publish((symbol_short!("approve"), from, spender), event);
}

pub fn publish_transfer(env: &Env, from: Address, to: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("transfer"), from, to), amount);
}

pub fn publish_burn(env: &Env, from: Address, amount: i128) {
    env.events().publish((symbol_short!("burn"), from), amount);
}
