#![no_std]

//! Shared building blocks for the callable credit contracts: the loan and
//! auction data model, the protocol-wide error enum, fixed-point math and the
//! client interfaces each contract uses to reach the others.

#[cfg(test)]
#[macro_use]
extern crate std;

mod access;
mod errors;
mod interfaces;
pub mod math;
mod types;

pub use access::require_capability;
pub use errors::{Error, ErrorKind};
pub use interfaces::{
    GaugeClient, GaugeInterface, LedgerClient, LedgerInterface, MintableClient,
    MintableInterface, TermClient, TermInterface,
};
pub use types::{
    AuctionParams, AuctionQuote, CallInfo, CallOutcome, CloseReason, Closure, Loan,
    LoanStatus, LoanTermConfig, ProfitSharingConfig, Role,
};
