//! Event types published by the accounting ledger.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use credit_shared::Role;

/// A registered loan book reported a loss.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LossEvent {
    pub term: Address,
    pub amount: i128,
    /// Portion absorbed by the surplus buffer.
    pub absorbed: i128,
    /// Portion spread over every credit holder through the multiplier.
    pub marked_down: i128,
    pub credit_multiplier: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfitEvent {
    pub term: Address,
    pub amount: i128,
    pub to_surplus_buffer: i128,
    pub to_credit_holders: i128,
    pub to_guild: i128,
    pub to_other: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiplierEvent {
    pub previous: i128,
    pub current: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SurplusEvent {
    pub account: Address,
    /// Positive for donations, negative for withdrawals.
    pub delta: i128,
    pub surplus_buffer: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleEvent {
    pub account: Address,
    pub role: Role,
    pub granted: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TermEvent {
    pub term: Address,
    pub registered: bool,
}

pub fn publish_loss(env: &Env, event: LossEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("loss")), event);
}

pub fn publish_profit(env: &Env, event: ProfitEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("profit")), event);
}

pub fn publish_multiplier(env: &Env, event: MultiplierEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("mult")), event);
}

pub fn publish_surplus(env: &Env, event: SurplusEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("surplus")), event);
}

pub fn publish_role(env: &Env, event: RoleEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("role")), event);
}

pub fn publish_term(env: &Env, event: TermEvent) {
    env.events()
        .publish((symbol_short!("ledger"), symbol_short!("term")), event);
}
