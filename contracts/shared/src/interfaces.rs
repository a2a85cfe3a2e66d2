//! Narrow client interfaces each contract uses to reach its collaborators.
//!
//! Every contract only sees the handful of entry points it is allowed to
//! call; the full contract clients stay private to their own crates.

use soroban_sdk::{contractclient, Address, BytesN, Env};

use crate::{Error, Loan, LoanTermConfig, Role};

/// Accounting ledger as seen by loan books and the auction engine.
#[contractclient(name = "LedgerClient")]
pub trait LedgerInterface {
    fn credit_multiplier(env: Env) -> i128;
    fn min_borrow(env: Env) -> Result<i128, Error>;
    fn gauge(env: Env) -> Option<Address>;
    fn is_term(env: Env, term: Address) -> bool;
    fn has_role(env: Env, account: Address, role: Role) -> bool;
    fn issuance(env: Env, term: Address) -> i128;
    fn increase_issuance(env: Env, term: Address, amount: i128) -> Result<i128, Error>;
    fn decrease_issuance(env: Env, term: Address, amount: i128) -> Result<i128, Error>;
    fn notify_profit(env: Env, term: Address, amount: i128) -> Result<(), Error>;
    fn notify_loss(env: Env, term: Address, amount: i128) -> Result<(), Error>;
}

/// Loan book entry points reserved for its registered auction engine.
#[contractclient(name = "TermClient")]
pub trait TermInterface {
    fn get_loan(env: Env, loan_id: BytesN<32>) -> Result<Loan, Error>;
    fn config(env: Env) -> Result<LoanTermConfig, Error>;
    fn seize(env: Env, loan_id: BytesN<32>) -> Result<i128, Error>;
    fn settle_from_auction(
        env: Env,
        loan_id: BytesN<32>,
        credit_received: i128,
        collateral_given: i128,
        bidder: Option<Address>,
    ) -> Result<(), Error>;
}

/// Stake-weighted gauge deciding each loan book's debt ceiling.
#[contractclient(name = "GaugeClient")]
pub trait GaugeInterface {
    fn debt_ceiling(env: Env, term: Address) -> i128;
    fn notify_gauge_loss(env: Env, term: Address);
}

/// Minting and supply surface of the debt token. Transfers and burns go
/// through the standard token client.
#[contractclient(name = "MintableClient")]
pub trait MintableInterface {
    fn mint(env: Env, minter: Address, to: Address, amount: i128) -> Result<(), Error>;
    fn total_supply(env: Env) -> i128;
}
