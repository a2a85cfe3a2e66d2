//! End-to-end lending scenarios and protocol-wide properties.

use credit_shared::{
    math::{SCALAR, YEAR},
    CloseReason, Error, LoanStatus,
};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, Env};

use crate::setup::{setup, setup_with, AUCTION_DURATION};

fn assert_closed(status: LoanStatus, reason: CloseReason) {
    match status {
        LoanStatus::Closed(closure) => assert_eq!(closure.reason, reason),
        other => panic!("loan not closed: {:?}", other),
    }
}

#[test]
fn test_borrow_limited_by_collateral_value() {
    let env = Env::default();
    let p = setup(&env);
    let borrower = p.borrower(10);
    assert_eq!(p.book.max_debt_for_collateral(&10), 10_000);
    assert_eq!(
        p.book.try_borrow(&borrower, &10_001, &10),
        Err(Ok(Error::InsufficientCollateral))
    );
    p.book.borrow(&borrower, &10_000, &10);
}

#[test]
fn test_year_of_interest_before_call() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    let info = p.book.call(&Address::generate(&env), &loan_id);
    assert_eq!(info.call_debt, 1_050);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR);
}

#[test]
fn test_auction_prices_at_both_phases() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);

    p.advance(300);
    let quote = p.auction.quote(&p.book.address, &loan_id);
    assert_eq!(quote.collateral_to_bidder, 5);
    assert_eq!(quote.credit_asked, 1_050);

    p.advance(900);
    let quote = p.auction.quote(&p.book.address, &loan_id);
    assert_eq!(quote.collateral_to_bidder, 10);
    assert_eq!(quote.credit_asked, 525);
}

#[test]
fn test_auction_shortfall_absorbed_by_surplus_buffer() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    let donor = p.funded(600);
    p.ledger.donate_to_surplus_buffer(&donor, &600);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);

    let bidder = p.funded(525);
    p.advance(1_200);
    p.auction.bid(&bidder, &p.book.address, &loan_id);

    assert_eq!(p.collateral.balance(&bidder), 10);
    assert_eq!(p.ledger.surplus_buffer(), 75);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR);
    assert_eq!(p.book.issuance(), 0);
    assert_closed(p.book.get_loan(&loan_id).status, CloseReason::Auctioned);
}

#[test]
fn test_auction_shortfall_marks_down_multiplier() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);

    let bidder = p.funded(525);
    p.advance(1_200);
    p.auction.bid(&bidder, &p.book.address, &loan_id);

    // 525 received and burned, leaving 1,000 supply to absorb 525
    assert_eq!(p.credit.total_supply(), 1_000);
    assert_eq!(p.ledger.surplus_buffer(), 0);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR * 475 / 1_000);
}

#[test]
fn test_partial_shortfall_burns_only_principal() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.open_loan(1_000, 10);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);

    let bidder = p.funded(1_039);
    p.advance(612);
    assert_eq!(
        p.auction.bid(&bidder, &p.book.address, &loan_id).credit_asked,
        1_039
    );

    // 1,000 principal burned, 39 interest booked, then 11 of it absorbed
    assert_eq!(p.ledger.surplus_buffer(), 28);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR);
    assert_eq!(p.ledger.total_issuance(), 1_000);
    assert_eq!(p.credit.total_supply(), 3_039 - 1_000 - 11);
    assert!(p.ledger.total_issuance() <= p.credit.total_supply());
}

#[test]
fn test_expired_auction_is_forgiven() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.funded(9_000);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);
    p.advance(AUCTION_DURATION + 1);

    let bidder = p.funded(1_050);
    assert_eq!(
        p.auction.try_bid(&bidder, &p.book.address, &loan_id),
        Err(Ok(Error::AuctionExpired))
    );

    // anyone may close it out
    assert_eq!(p.auction.forgive(&p.book.address, &loan_id), 1_050);
    assert_closed(p.book.get_loan(&loan_id).status, CloseReason::Forgiven);
    assert_eq!(p.book.issuance(), 0);
    assert_eq!(p.collateral.balance(&p.auction.address), 10);
    // 11,050 supply marked down by the whole 1,050 call debt
    assert_eq!(
        p.ledger.credit_multiplier(),
        SCALAR * (11_050 - 1_050) / 11_050
    );
}

#[test]
fn test_issuance_stays_under_ceilings() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.hard_cap = 8_000);
    let gauge = p.gauge(5_000);
    assert_eq!(p.book.debt_ceiling(), 5_000);

    p.open_loan(4_000, 10);
    let borrower = p.borrower(10);
    assert_eq!(
        p.book.try_borrow(&borrower, &1_001, &10),
        Err(Ok(Error::DebtCeilingExceeded))
    );

    gauge.set_ceiling(&p.book.address, &20_000);
    assert_eq!(p.book.debt_ceiling(), 8_000);
    assert_eq!(
        p.book.try_borrow(&borrower, &4_001, &10),
        Err(Ok(Error::HardCapExceeded))
    );
    p.book.borrow(&borrower, &4_000, &10);
    assert!(p.book.issuance() <= p.book.debt_ceiling());
}

#[test]
fn test_loss_notifies_gauge() {
    let env = Env::default();
    let p = setup(&env);
    let gauge = p.gauge(i128::MAX);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.funded(1_000);
    p.book.forgive(&p.governor, &loan_id);
    assert_eq!(gauge.losses(&p.book.address), 1);
}

#[test]
fn test_multiplier_only_decreases_across_losses() {
    let env = Env::default();
    let p = setup(&env);
    p.funded(50_000);
    let mut previous = p.ledger.credit_multiplier();
    for borrow in [1_000_i128, 2_500, 700, 4_000] {
        let (_borrower, loan_id) = p.open_loan(borrow, 10);
        p.advance(86_400);
        p.book.forgive(&p.governor, &loan_id);
        let current = p.ledger.credit_multiplier();
        assert!(current < previous);
        previous = current;
    }
}

#[test]
fn test_markdown_marks_up_open_debt() {
    let env = Env::default();
    let p = setup(&env);
    let (_a, written_off) = p.open_loan(1_000, 10);
    let (_b, survivor) = p.open_loan(1_000, 10);
    assert_eq!(p.book.current_debt(&survivor), 1_000);

    p.book.forgive(&p.governor, &written_off);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR / 2);
    assert_eq!(p.book.current_debt(&survivor), 2_000);
    // new loans need twice the credit for the same principal
    assert_eq!(p.ledger.min_borrow(), 200);
}

#[test]
fn test_repay_after_markdown_burns_marked_up_principal() {
    let env = Env::default();
    let p = setup(&env);
    let (_a, written_off) = p.open_loan(1_000, 10);
    let (b, survivor) = p.open_loan(1_000, 10);
    p.book.forgive(&p.governor, &written_off);

    p.fund(&b, 1_000);
    assert_eq!(p.book.repay(&b, &survivor), 2_000);
    assert_eq!(p.ledger.surplus_buffer(), 0);
    assert_eq!(p.book.issuance(), 0);
    assert_eq!(p.collateral.balance(&b), 10);
}

#[test]
fn test_closed_loans_are_terminal() {
    let env = Env::default();
    let p = setup(&env);

    let (borrower, repaid) = p.open_loan(1_000, 10);
    p.book.repay(&borrower, &repaid);
    let payer = p.funded(2_000);
    assert_eq!(
        p.book.try_repay(&payer, &repaid),
        Err(Ok(Error::LoanClosed))
    );
    assert_eq!(
        p.book.try_call(&payer, &repaid),
        Err(Ok(Error::LoanClosed))
    );
    assert_eq!(
        p.auction.try_bid(&payer, &p.book.address, &repaid),
        Err(Ok(Error::AuctionNotActive))
    );

    let (_borrower, auctioned) = p.open_loan(1_000, 10);
    p.book.call(&payer, &auctioned);
    p.auction.bid(&payer, &p.book.address, &auctioned);
    assert_eq!(
        p.auction.try_bid(&payer, &p.book.address, &auctioned),
        Err(Ok(Error::AuctionNotActive))
    );
    assert_eq!(
        p.book.try_repay(&payer, &auctioned),
        Err(Ok(Error::LoanClosed))
    );
    assert_eq!(
        p.auction.try_forgive(&p.book.address, &auctioned),
        Err(Ok(Error::AuctionNotActive))
    );
}
