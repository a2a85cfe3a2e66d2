//! Core data types shared across the loan book, auction engine and ledger.

use soroban_sdk::{contracttype, Address, BytesN};

/// Immutable parameters of one loan book. Ratios are scaled by
/// [`crate::math::SCALAR`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanTermConfig {
    pub collateral_token: Address,
    /// Credit that may be borrowed per collateral unit at multiplier 1.0.
    pub max_debt_per_collateral_token: i128,
    /// Annualized simple interest rate.
    pub interest_rate: i128,
    /// Seconds allowed between partial repayments. Zero disables the check.
    pub max_partial_repay_delay: u64,
    /// Smallest partial repayment, as a fraction of the current debt.
    pub min_partial_repay_percent: i128,
    /// Fee charged at origination, as a fraction of the principal.
    pub opening_fee: i128,
    /// Absolute issuance ceiling. The only field governance may change.
    pub hard_cap: i128,
    /// Fee burned from whoever calls a loan, as a fraction of the call debt.
    pub call_fee: i128,
    /// Seconds after a call during which the collateral cannot be auctioned.
    pub call_period: u64,
}

/// Snapshot taken when a loan is called.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallInfo {
    pub caller: Address,
    pub call_time: u64,
    pub call_debt: i128,
    /// Fee actually burned; zero when waived.
    pub call_fee: i128,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseReason {
    Repaid = 0,
    Auctioned = 1,
    Forgiven = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Closure {
    pub close_time: u64,
    pub reason: CloseReason,
}

/// Lifecycle of a loan. `Closed` entries are kept as immutable history.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoanStatus {
    Open,
    Called(CallInfo),
    /// Collateral has been handed to the auction engine.
    Liquidating(CallInfo),
    Closed(Closure),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    pub id: BytesN<32>,
    pub borrower: Address,
    pub borrow_time: u64,
    /// Nominal principal still outstanding, excluding interest.
    pub borrow_amount: i128,
    /// Opening fee still outstanding, carried as nominal debt.
    pub opening_fee: i128,
    pub borrow_credit_multiplier: i128,
    pub collateral_amount: i128,
    pub last_partial_repay: u64,
    pub status: LoanStatus,
}

impl Loan {
    pub fn call_info(&self) -> Option<&CallInfo> {
        match &self.status {
            LoanStatus::Called(info) | LoanStatus::Liquidating(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.status, LoanStatus::Closed(_))
    }
}

/// Dutch auction schedule, in seconds from the auction start.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AuctionParams {
    pub mid_point: u64,
    pub auction_duration: u64,
}

/// What a bid placed now would exchange.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AuctionQuote {
    pub collateral_to_bidder: i128,
    pub collateral_to_borrower: i128,
    pub credit_asked: i128,
}

/// Profit split weights; they must add up to `SCALAR`. A share without a
/// recipient stays in the surplus buffer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfitSharingConfig {
    pub surplus_buffer_split: i128,
    pub credit_split: i128,
    pub guild_split: i128,
    pub other_split: i128,
    pub credit_recipient: Option<Address>,
    pub guild_recipient: Option<Address>,
    pub other_recipient: Option<Address>,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Governor = 0,
    Guardian = 1,
    Forgiver = 2,
}

/// Per-loan result of a batched call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallOutcome {
    /// The loan was called with this debt snapshot.
    Called(i128),
    /// The call was rejected with this error code.
    Failed(u32),
}
