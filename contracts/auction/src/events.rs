//! Event types and publishers for the auction engine.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuctionStartEvent {
    pub term: Address,
    pub loan_id: BytesN<32>,
    pub collateral_amount: i128,
    pub call_debt: i128,
    pub start_time: u64,
}

/// Event emitted when a bid settles an auction.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuctionBidEvent {
    pub term: Address,
    pub loan_id: BytesN<32>,
    pub bidder: Address,
    pub elapsed: u64,
    pub credit_paid: i128,
    pub collateral_to_bidder: i128,
    pub collateral_to_borrower: i128,
    pub timestamp: u64,
}

/// Event emitted when an expired auction is written off.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuctionForgiveEvent {
    pub term: Address,
    pub loan_id: BytesN<32>,
    pub loss: i128,
    pub timestamp: u64,
}

pub fn publish_start(env: &Env, event: AuctionStartEvent) {
    env.events()
        .publish((symbol_short!("auction"), symbol_short!("start")), event);
}

pub fn publish_bid(env: &Env, event: AuctionBidEvent) {
    env.events()
        .publish((symbol_short!("auction"), symbol_short!("bid")), event);
}

pub fn publish_forgive(env: &Env, event: AuctionForgiveEvent) {
    env.events()
        .publish((symbol_short!("auction"), symbol_short!("forgive")), event);
}
