//! Storage layout of a loan book.

use credit_shared::{Error, Loan, LoanTermConfig};
use soroban_sdk::{contracttype, xdr::ToXdr, Address, Bytes, BytesN, Env, Vec};

const INSTANCE_LIFETIME_THRESHOLD: u32 = 100_800;
const INSTANCE_BUMP_AMOUNT: u32 = 518_400;
const LOAN_LIFETIME_THRESHOLD: u32 = 518_400;
const LOAN_BUMP_AMOUNT: u32 = 3_110_400;

/// Contracts this loan book talks to, fixed at init.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refs {
    pub ledger: Address,
    pub credit_token: Address,
    pub auction_engine: Address,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Refs,
    Config,
    Deprecated,
    Reentrancy,
    Loan(BytesN<32>),
    Nonce(Address),
    BorrowerLoans(Address),
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn read_refs(env: &Env) -> Result<Refs, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Refs)
        .ok_or(Error::NotInitialized)
}

pub fn read_config(env: &Env) -> Result<LoanTermConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn write_config(env: &Env, config: &LoanTermConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance(env);
}

pub fn is_deprecated(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Deprecated)
        .unwrap_or(false)
}

pub fn read_loan(env: &Env, loan_id: &BytesN<32>) -> Result<Loan, Error> {
    let key = DataKey::Loan(loan_id.clone());
    let loan = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::LoanNotFound)?;
    env.storage()
        .persistent()
        .extend_ttl(&key, LOAN_LIFETIME_THRESHOLD, LOAN_BUMP_AMOUNT);
    Ok(loan)
}

pub fn write_loan(env: &Env, loan: &Loan) {
    let key = DataKey::Loan(loan.id.clone());
    env.storage().persistent().set(&key, loan);
    env.storage()
        .persistent()
        .extend_ttl(&key, LOAN_LIFETIME_THRESHOLD, LOAN_BUMP_AMOUNT);
    extend_instance(env);
}

pub fn read_borrower_loans(env: &Env, borrower: &Address) -> Vec<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&DataKey::BorrowerLoans(borrower.clone()))
        .unwrap_or(Vec::new(env))
}

/// Derives the next loan id as `sha256(loan book ‖ borrower ‖ nonce)` and
/// records it against the borrower.
pub fn next_loan_id(env: &Env, borrower: &Address) -> BytesN<32> {
    let nonce_key = DataKey::Nonce(borrower.clone());
    let nonce: u64 = env.storage().persistent().get(&nonce_key).unwrap_or(0);
    env.storage().persistent().set(&nonce_key, &(nonce + 1));

    let mut preimage = Bytes::new(env);
    preimage.append(&env.current_contract_address().to_xdr(env));
    preimage.append(&borrower.clone().to_xdr(env));
    preimage.extend_from_array(&nonce.to_be_bytes());
    let loan_id: BytesN<32> = env.crypto().sha256(&preimage).into();

    let loans_key = DataKey::BorrowerLoans(borrower.clone());
    let mut loans = read_borrower_loans(env, borrower);
    loans.push_back(loan_id.clone());
    env.storage().persistent().set(&loans_key, &loans);
    for key in [nonce_key, loans_key] {
        env.storage()
            .persistent()
            .extend_ttl(&key, LOAN_LIFETIME_THRESHOLD, LOAN_BUMP_AMOUNT);
    }
    loan_id
}
