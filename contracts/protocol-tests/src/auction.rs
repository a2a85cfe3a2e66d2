use auction_engine::{events::AuctionBidEvent, AuctionEngine, AuctionEngineClient};
use credit_shared::{
    math::{SCALAR, YEAR},
    AuctionParams, AuctionQuote, CloseReason, Error, LoanStatus,
};
use soroban_sdk::testutils::{Address as _, Events as _};
use soroban_sdk::{Address, BytesN, Env, TryIntoVal};

use crate::setup::{setup, setup_with, Protocol, AUCTION_DURATION, MID_POINT};

/// Opens a 1,000 credit loan against 10 collateral, lets a year of interest
/// accrue and calls it. Returns the borrower and loan id.
fn called_loan(p: &Protocol) -> (Address, BytesN<32>) {
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    p.book.call(&Address::generate(p.env), &loan_id);
    (borrower, loan_id)
}

#[test]
fn test_init_rejects_inverted_schedule() {
    let env = Env::default();
    let engine = AuctionEngineClient::new(&env, &env.register(AuctionEngine, ()));
    let params = AuctionParams {
        mid_point: 600,
        auction_duration: 600,
    };
    assert_eq!(
        engine.try_init(
            &Address::generate(&env),
            &Address::generate(&env),
            &params
        ),
        Err(Ok(Error::InvalidConfig))
    );
}

#[test]
fn test_open_loan_cannot_be_auctioned() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    assert_eq!(
        p.auction.try_start_auction(&p.book.address, &loan_id),
        Err(Ok(Error::AuctionNotActive))
    );
}

#[test]
fn test_unregistered_term_is_rejected() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = called_loan(&p);
    let rogue = Address::generate(&env);
    assert_eq!(
        p.auction.try_start_auction(&rogue, &loan_id),
        Err(Ok(Error::UnknownTerm))
    );
}

#[test]
fn test_start_seizes_collateral() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = called_loan(&p);

    let auction = p.auction.start_auction(&p.book.address, &loan_id);
    assert_eq!(auction.collateral_amount, 10);
    assert_eq!(auction.call_debt, 1_050);
    assert_eq!(auction.closed_at, None);
    assert_eq!(p.collateral.balance(&p.auction.address), 10);
    assert_eq!(p.collateral.balance(&p.book.address), 0);
    assert!(matches!(
        p.book.get_loan(&loan_id).status,
        LoanStatus::Liquidating(_)
    ));
    assert_eq!(p.book.current_debt(&loan_id), 1_050);
    assert_eq!(
        p.auction.try_start_auction(&p.book.address, &loan_id),
        Err(Ok(Error::AuctionAlreadyStarted))
    );
}

#[test]
fn test_liquidating_loan_is_frozen() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = called_loan(&p);
    p.auction.start_auction(&p.book.address, &loan_id);
    p.fund(&borrower, 50);
    assert_eq!(
        p.book.try_repay(&borrower, &loan_id),
        Err(Ok(Error::InvalidLoanState))
    );
    assert_eq!(
        p.book.try_forgive(&p.governor, &loan_id),
        Err(Ok(Error::InvalidLoanState))
    );
}

#[test]
fn test_call_period_delays_auction() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.call_period = 3_600);
    let (borrower, loan_id) = called_loan(&p);
    p.advance(3_599);
    assert_eq!(
        p.auction.try_start_auction(&p.book.address, &loan_id),
        Err(Ok(Error::CallPeriodActive))
    );
    assert_eq!(
        p.auction.try_quote(&p.book.address, &loan_id),
        Err(Ok(Error::CallPeriodActive))
    );

    // the borrower can still repay during the call period
    p.fund(&borrower, 50);
    p.book.repay(&borrower, &loan_id);
    assert_eq!(p.collateral.balance(&borrower), 10);
}

#[test]
fn test_quote_follows_schedule() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = called_loan(&p);
    let term = &p.book.address;

    assert_eq!(
        p.auction.quote(term, &loan_id),
        AuctionQuote {
            collateral_to_bidder: 0,
            collateral_to_borrower: 10,
            credit_asked: 1_050,
        }
    );
    p.advance(MID_POINT);
    assert_eq!(
        p.auction.quote(term, &loan_id),
        AuctionQuote {
            collateral_to_bidder: 10,
            collateral_to_borrower: 0,
            credit_asked: 1_050,
        }
    );
    p.advance(AUCTION_DURATION - MID_POINT);
    assert_eq!(p.auction.quote(term, &loan_id).credit_asked, 0);
    p.advance(1);
    assert_eq!(
        p.auction.try_quote(term, &loan_id),
        Err(Ok(Error::AuctionExpired))
    );
}

#[test]
fn test_phase_one_bid_returns_rest_to_borrower() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = called_loan(&p);
    let bidder = p.funded(1_050);
    p.advance(300);

    let quote = p.auction.bid(&bidder, &p.book.address, &loan_id);
    let events = env.events().all();
    assert_eq!(quote.collateral_to_bidder, 5);
    assert_eq!(quote.credit_asked, 1_050);

    assert_eq!(p.collateral.balance(&bidder), 5);
    assert_eq!(p.collateral.balance(&borrower), 5);
    assert_eq!(p.credit.balance(&bidder), 0);
    // full recovery: principal burned, interest booked as profit
    assert_eq!(p.ledger.surplus_buffer(), 50);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR);
    assert_eq!(p.book.issuance(), 0);

    let loan = p.book.get_loan(&loan_id);
    assert!(matches!(
        loan.status,
        LoanStatus::Closed(ref closure) if closure.reason == CloseReason::Auctioned
    ));

    let (_contract, _topics, data) = events.last().unwrap();
    let event: AuctionBidEvent = data.try_into_val(&env).unwrap();
    assert_eq!(event.bidder, bidder);
    assert_eq!(event.elapsed, 300);
    assert_eq!(event.credit_paid, 1_050);
    assert_eq!(event.collateral_to_borrower, 5);
}

#[test]
fn test_borrower_may_bid_on_own_loan() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = called_loan(&p);
    p.fund(&borrower, 50);
    p.advance(MID_POINT);
    p.auction.bid(&borrower, &p.book.address, &loan_id);
    assert_eq!(p.collateral.balance(&borrower), 10);
    assert_eq!(p.credit.balance(&borrower), 0);
}

#[test]
fn test_bid_without_funds_fails() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = called_loan(&p);
    let bidder = p.funded(1_049);
    assert_eq!(
        p.auction.try_bid(&bidder, &p.book.address, &loan_id),
        Err(Ok(Error::InsufficientCreditBalance))
    );
    // nothing was seized
    assert_eq!(p.collateral.balance(&p.book.address), 10);
}

#[test]
fn test_forgive_waits_for_expiry() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = called_loan(&p);
    p.advance(AUCTION_DURATION);
    assert_eq!(
        p.auction.try_forgive(&p.book.address, &loan_id),
        Err(Ok(Error::AuctionNotExpired))
    );
}
