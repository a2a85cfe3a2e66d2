//! Event types and publishers for the loan book.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, Symbol};

/// Event emitted when a loan is opened.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowEvent {
    pub loan_id: BytesN<32>,
    pub borrower: Address,
    pub borrow_amount: i128,
    pub collateral_amount: i128,
    pub opening_fee: i128,
    pub credit_multiplier: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollateralAddedEvent {
    pub loan_id: BytesN<32>,
    pub from: Address,
    pub amount: i128,
    pub collateral_amount: i128,
}

/// Event emitted when part of a loan is paid back.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartialRepayEvent {
    pub loan_id: BytesN<32>,
    pub payer: Address,
    pub amount: i128,
    /// Credit burned against principal.
    pub principal_repaid: i128,
    /// Credit routed to the ledger as profit.
    pub interest_repaid: i128,
    pub remaining_borrow_amount: i128,
    pub timestamp: u64,
}

/// Event emitted when a loan is paid back in full.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepayEvent {
    pub loan_id: BytesN<32>,
    pub payer: Address,
    pub debt: i128,
    pub principal: i128,
    pub interest: i128,
    pub call_fee_refund: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallEvent {
    pub loan_id: BytesN<32>,
    pub caller: Address,
    pub call_debt: i128,
    pub call_fee: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeizeEvent {
    pub loan_id: BytesN<32>,
    pub auction_engine: Address,
    pub collateral_amount: i128,
    pub timestamp: u64,
}

/// Event emitted when the auction engine closes a loan. `bidder` is `None`
/// for auctions that expired without a bid.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettleEvent {
    pub loan_id: BytesN<32>,
    pub bidder: Option<Address>,
    pub credit_received: i128,
    pub collateral_given: i128,
    pub profit: i128,
    pub loss: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForgiveEvent {
    pub loan_id: BytesN<32>,
    pub forgiver: Address,
    pub loss: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HardCapEvent {
    pub set_by: Address,
    pub previous: i128,
    pub hard_cap: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeprecatedEvent {
    pub governor: Address,
    pub timestamp: u64,
}

fn topics(action: Symbol) -> (Symbol, Symbol) {
    (symbol_short!("loan"), action)
}

pub fn publish_borrow(env: &Env, event: BorrowEvent) {
    env.events().publish(topics(symbol_short!("borrow")), event);
}

pub fn publish_collateral_added(env: &Env, event: CollateralAddedEvent) {
    env.events().publish(topics(symbol_short!("addcoll")), event);
}

pub fn publish_partial_repay(env: &Env, event: PartialRepayEvent) {
    env.events().publish(topics(symbol_short!("partial")), event);
}

pub fn publish_repay(env: &Env, event: RepayEvent) {
    env.events().publish(topics(symbol_short!("repay")), event);
}

pub fn publish_call(env: &Env, event: CallEvent) {
    env.events().publish(topics(symbol_short!("call")), event);
}

pub fn publish_seize(env: &Env, event: SeizeEvent) {
    env.events().publish(topics(symbol_short!("seize")), event);
}

pub fn publish_settle(env: &Env, event: SettleEvent) {
    env.events().publish(topics(symbol_short!("settle")), event);
}

pub fn publish_forgive(env: &Env, event: ForgiveEvent) {
    env.events().publish(topics(symbol_short!("forgive")), event);
}

pub fn publish_hard_cap(env: &Env, event: HardCapEvent) {
    env.events()
        .publish((symbol_short!("term"), symbol_short!("hardcap")), event);
}

pub fn publish_deprecated(env: &Env, event: DeprecatedEvent) {
    env.events()
        .publish((symbol_short!("term"), symbol_short!("deprec")), event);
}
