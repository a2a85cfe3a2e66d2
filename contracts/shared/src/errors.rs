//! Error taxonomy shared by every contract.
//!
//! All contracts return this enum so that a failure raised inside a
//! sub-invocation surfaces to the outermost caller with the same code.

use soroban_sdk::contracterror;

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidConfig = 3,

    Unauthorized = 10,
    UnknownTerm = 11,
    Reentrancy = 12,

    InvalidAmount = 20,
    LoanNotFound = 21,
    LoanClosed = 22,
    InvalidLoanState = 23,
    InsufficientCollateral = 24,
    BorrowAmountTooLow = 25,
    PartialRepayTooSmall = 26,
    InsufficientCreditBalance = 27,
    InsufficientAllowance = 28,

    DebtCeilingExceeded = 40,
    HardCapExceeded = 41,
    TermDeprecated = 42,
    CallPeriodActive = 43,
    AuctionNotActive = 44,
    AuctionExpired = 45,
    AuctionNotExpired = 46,
    AuctionAlreadyStarted = 47,

    Overflow = 60,
    DivisionByZero = 61,
}

/// Coarse classification used by indexers and liquidation bots to decide
/// whether resubmitting with different parameters can succeed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Configuration,
    Authorization,
    Validation,
    Policy,
    Arithmetic,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotInitialized | Error::AlreadyInitialized | Error::InvalidConfig => {
                ErrorKind::Configuration
            }
            Error::Unauthorized | Error::UnknownTerm | Error::Reentrancy => {
                ErrorKind::Authorization
            }
            Error::InvalidAmount
            | Error::LoanNotFound
            | Error::LoanClosed
            | Error::InvalidLoanState
            | Error::InsufficientCollateral
            | Error::BorrowAmountTooLow
            | Error::PartialRepayTooSmall
            | Error::InsufficientCreditBalance
            | Error::InsufficientAllowance => ErrorKind::Validation,
            Error::DebtCeilingExceeded
            | Error::HardCapExceeded
            | Error::TermDeprecated
            | Error::CallPeriodActive
            | Error::AuctionNotActive
            | Error::AuctionExpired
            | Error::AuctionNotExpired
            | Error::AuctionAlreadyStarted => ErrorKind::Policy,
            Error::Overflow | Error::DivisionByZero => ErrorKind::Arithmetic,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timing_errors_are_policy() {
        assert_eq!(Error::CallPeriodActive.kind(), ErrorKind::Policy);
        assert_eq!(Error::AuctionExpired.kind(), ErrorKind::Policy);
        assert_eq!(Error::DebtCeilingExceeded.kind(), ErrorKind::Policy);
    }

    #[test]
    fn parameter_errors_are_validation() {
        assert_eq!(Error::InsufficientCollateral.kind(), ErrorKind::Validation);
        assert_eq!(Error::PartialRepayTooSmall.kind(), ErrorKind::Validation);
        assert_eq!(Error::InsufficientCreditBalance.kind(), ErrorKind::Validation);
    }
}
