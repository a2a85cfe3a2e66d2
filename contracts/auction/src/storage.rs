use credit_shared::{AuctionParams, Error};
use soroban_sdk::{contracttype, Address, BytesN, Env};

const INSTANCE_LIFETIME_THRESHOLD: u32 = 100_800;
const INSTANCE_BUMP_AMOUNT: u32 = 518_400;
const AUCTION_LIFETIME_THRESHOLD: u32 = 518_400;
const AUCTION_BUMP_AMOUNT: u32 = 3_110_400;

/// Liquidation of one called loan. Written when the collateral is seized,
/// closed by a bid or by forgiveness.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Auction {
    pub term: Address,
    pub loan_id: BytesN<32>,
    pub borrower: Address,
    pub collateral_token: Address,
    pub collateral_amount: i128,
    pub call_debt: i128,
    /// Call time plus the loan book's call period.
    pub start_time: u64,
    pub closed_at: Option<u64>,
}

#[contracttype]
#[derive(Clone)]
pub struct AuctionKey {
    pub term: Address,
    pub loan_id: BytesN<32>,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Ledger,
    CreditToken,
    Params,
    Auction(AuctionKey),
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn read_address(env: &Env, key: &DataKey) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(key)
        .ok_or(Error::NotInitialized)
}

pub fn read_params(env: &Env) -> Result<AuctionParams, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Params)
        .ok_or(Error::NotInitialized)
}

fn auction_key(term: &Address, loan_id: &BytesN<32>) -> DataKey {
    DataKey::Auction(AuctionKey {
        term: term.clone(),
        loan_id: loan_id.clone(),
    })
}

pub fn read_auction(env: &Env, term: &Address, loan_id: &BytesN<32>) -> Option<Auction> {
    let key = auction_key(term, loan_id);
    let auction = env.storage().persistent().get(&key);
    if auction.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, AUCTION_LIFETIME_THRESHOLD, AUCTION_BUMP_AMOUNT);
    }
    auction
}

pub fn write_auction(env: &Env, auction: &Auction) {
    let key = auction_key(&auction.term, &auction.loan_id);
    env.storage().persistent().set(&key, auction);
    env.storage()
        .persistent()
        .extend_ttl(&key, AUCTION_LIFETIME_THRESHOLD, AUCTION_BUMP_AMOUNT);
    extend_instance(env);
}
