use credit_shared::{
    math::{SCALAR, YEAR},
    CallOutcome, CloseReason, Error, LoanStatus, Role,
};
use loan_book::events::{BorrowEvent, RepayEvent};
use soroban_sdk::testutils::{Address as _, Events as _};
use soroban_sdk::{symbol_short, vec, Address, BytesN, Env, Symbol, TryFromVal, TryIntoVal};

use crate::setup::{setup, setup_with, MIN_BORROW, START};

fn closed_reason(status: &LoanStatus) -> Option<CloseReason> {
    match status {
        LoanStatus::Closed(closure) => Some(closure.reason),
        _ => None,
    }
}

// ── borrow ───────────────────────────────────────────────────────────────────

#[test]
fn test_borrow_mints_credit_and_locks_collateral() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(5_000, 10);

    assert_eq!(p.credit.balance(&borrower), 5_000);
    assert_eq!(p.collateral.balance(&borrower), 0);
    assert_eq!(p.collateral.balance(&p.book.address), 10);
    assert_eq!(p.book.issuance(), 5_000);
    assert_eq!(p.ledger.total_issuance(), 5_000);

    let loan = p.book.get_loan(&loan_id);
    assert_eq!(loan.borrower, borrower);
    assert_eq!(loan.borrow_time, START);
    assert_eq!(loan.borrow_amount, 5_000);
    assert_eq!(loan.borrow_credit_multiplier, SCALAR);
    assert_eq!(loan.collateral_amount, 10);
    assert_eq!(loan.status, LoanStatus::Open);
    assert_eq!(p.book.loans_of(&borrower), vec![&env, loan_id]);
}

#[test]
fn test_borrow_emits_event() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 2);

    let events = env.events().all();
    let (_contract, topics, data) = events.last().unwrap();
    assert_eq!(
        Symbol::try_from_val(&env, &topics.get(0).unwrap()).unwrap(),
        symbol_short!("loan")
    );
    assert_eq!(
        Symbol::try_from_val(&env, &topics.get(1).unwrap()).unwrap(),
        symbol_short!("borrow")
    );
    let event: BorrowEvent = data.try_into_val(&env).unwrap();
    assert_eq!(event.loan_id, loan_id);
    assert_eq!(event.borrower, borrower);
    assert_eq!(event.borrow_amount, 1_000);
    assert_eq!(event.collateral_amount, 2);
    assert_eq!(event.timestamp, START);
}

#[test]
fn test_loan_ids_are_distinct_per_borrow() {
    let env = Env::default();
    let p = setup(&env);
    let borrower = p.borrower(4);
    let first = p.book.borrow(&borrower, &1_000, &2);
    let second = p.book.borrow(&borrower, &1_000, &2);
    assert_ne!(first, second);
    assert_eq!(p.book.loans_of(&borrower), vec![&env, first, second]);
}

#[test]
fn test_borrow_rejects_bad_amounts() {
    let env = Env::default();
    let p = setup(&env);
    let borrower = p.borrower(10);
    assert_eq!(
        p.book.try_borrow(&borrower, &0, &10),
        Err(Ok(Error::InvalidAmount))
    );
    assert_eq!(
        p.book.try_borrow(&borrower, &1_000, &0),
        Err(Ok(Error::InvalidAmount))
    );
    assert_eq!(
        p.book.try_borrow(&borrower, &(MIN_BORROW - 1), &10),
        Err(Ok(Error::BorrowAmountTooLow))
    );
}

#[test]
fn test_opening_fee_is_carried_as_debt() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.opening_fee = SCALAR / 100);
    let (borrower, loan_id) = p.open_loan(1_000, 10);

    assert_eq!(p.credit.balance(&borrower), 1_000);
    assert_eq!(p.book.get_loan(&loan_id).opening_fee, 10);
    assert_eq!(p.book.current_debt(&loan_id), 1_010);

    p.fund(&borrower, 10);
    assert_eq!(p.book.repay(&borrower, &loan_id), 1_010);
    // the fee is profit
    assert_eq!(p.ledger.surplus_buffer(), 10);
}

#[test]
fn test_deprecated_book_rejects_borrow() {
    let env = Env::default();
    let p = setup(&env);
    let borrower = p.borrower(10);
    p.book.deprecate(&p.governor);
    assert!(p.book.is_deprecated());
    assert_eq!(
        p.book.try_borrow(&borrower, &1_000, &10),
        Err(Ok(Error::TermDeprecated))
    );
}

#[test]
fn test_only_governor_deprecates() {
    let env = Env::default();
    let p = setup(&env);
    let stranger = Address::generate(&env);
    assert_eq!(
        p.book.try_deprecate(&stranger),
        Err(Ok(Error::Unauthorized))
    );
}

// ── collateral ───────────────────────────────────────────────────────────────

#[test]
fn test_anyone_can_add_collateral() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 1);
    let friend = p.borrower(4);
    p.book.add_collateral(&friend, &loan_id, &4);
    assert_eq!(p.book.get_loan(&loan_id).collateral_amount, 5);
    assert_eq!(p.collateral.balance(&p.book.address), 5);
    assert_eq!(
        p.book.try_add_collateral(&friend, &loan_id, &0),
        Err(Ok(Error::InvalidAmount))
    );
}

#[test]
fn test_max_debt_follows_multiplier() {
    let env = Env::default();
    let p = setup(&env);
    assert_eq!(p.book.max_debt_for_collateral(&3), 3_000);

    // halve the multiplier: 2,000 supply, forgive 1,000
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.funded(1_000);
    p.book.forgive(&p.governor, &loan_id);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR / 2);
    assert_eq!(p.book.max_debt_for_collateral(&3), 6_000);
}

// ── partial repay ────────────────────────────────────────────────────────────

#[test]
fn test_partial_repay_splits_principal_and_interest() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    assert_eq!(p.book.current_debt(&loan_id), 1_050);

    assert_eq!(p.book.partial_repay(&borrower, &loan_id, &525), 525);

    let loan = p.book.get_loan(&loan_id);
    assert_eq!(loan.borrow_amount, 500);
    assert_eq!(loan.last_partial_repay, START + YEAR);
    assert_eq!(p.book.current_debt(&loan_id), 525);
    assert_eq!(p.book.issuance(), 500);
    assert_eq!(p.ledger.surplus_buffer(), 25);
    // 500 principal burned, 25 interest held by the ledger
    assert_eq!(p.credit.total_supply(), 500);
}

#[test]
fn test_partial_repay_below_minimum_fails() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    assert_eq!(
        p.book.try_partial_repay(&borrower, &loan_id, &104),
        Err(Ok(Error::PartialRepayTooSmall))
    );
    p.book.partial_repay(&borrower, &loan_id, &105);
}

#[test]
fn test_partial_repay_cannot_leave_dust() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(150, 1);
    assert_eq!(
        p.book.try_partial_repay(&borrower, &loan_id, &100),
        Err(Ok(Error::BorrowAmountTooLow))
    );
}

#[test]
fn test_partial_repay_of_full_debt_closes_loan() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    assert_eq!(p.book.partial_repay(&borrower, &loan_id, &1_000), 0);
    assert_eq!(
        closed_reason(&p.book.get_loan(&loan_id).status),
        Some(CloseReason::Repaid)
    );
    assert_eq!(p.collateral.balance(&borrower), 10);
}

#[test]
fn test_partial_repay_minimum_uses_marked_up_principal() {
    let env = Env::default();
    let p = setup(&env);
    let (_a, written_off) = p.open_loan(1_000, 10);
    let (b, survivor) = p.open_loan(300, 10);
    p.book.forgive(&p.governor, &written_off);
    // 1,000 loss over 1,300 supply
    let multiplier = SCALAR * 300 / 1_300;
    assert_eq!(p.ledger.credit_multiplier(), multiplier);
    assert_eq!(p.ledger.min_borrow(), MIN_BORROW * SCALAR / multiplier);
    assert_eq!(p.book.current_debt(&survivor), 1_300);

    // 150 of principal is left, worth 650 credit, above the 433 minimum
    p.fund(&b, 350);
    assert_eq!(p.book.partial_repay(&b, &survivor, &650), 650);
    assert_eq!(p.book.get_loan(&survivor).borrow_amount, 150);
}

#[test]
fn test_missed_partial_repay_is_flagged() {
    let env = Env::default();
    let p = setup_with(&env, |config| {
        config.max_partial_repay_delay = 30 * 86_400
    });
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(29 * 86_400);
    assert!(!p.book.partial_repay_delay_passed(&loan_id));
    p.book.partial_repay(&borrower, &loan_id, &200);
    p.advance(30 * 86_400 + 1);
    assert!(p.book.partial_repay_delay_passed(&loan_id));
}

// ── repay ────────────────────────────────────────────────────────────────────

#[test]
fn test_repay_after_a_year() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    p.fund(&borrower, 50);

    assert_eq!(p.book.repay(&borrower, &loan_id), 1_050);
    // read events before any other call replaces them
    let events = env.events().all();

    assert_eq!(p.credit.balance(&borrower), 0);
    assert_eq!(p.collateral.balance(&borrower), 10);
    assert_eq!(p.book.issuance(), 0);
    assert_eq!(p.ledger.surplus_buffer(), 50);
    assert_eq!(p.credit.total_supply(), 50);
    assert_eq!(p.book.current_debt(&loan_id), 0);
    assert_eq!(
        closed_reason(&p.book.get_loan(&loan_id).status),
        Some(CloseReason::Repaid)
    );

    let (_contract, _topics, data) = events.last().unwrap();
    let event: RepayEvent = data.try_into_val(&env).unwrap();
    assert_eq!(event.debt, 1_050);
    assert_eq!(event.principal, 1_000);
    assert_eq!(event.interest, 50);
}

#[test]
fn test_third_party_can_repay() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    let friend = p.funded(1_000);
    p.book.repay(&friend, &loan_id);
    assert_eq!(p.credit.balance(&friend), 0);
    assert_eq!(p.credit.balance(&borrower), 1_000);
    assert_eq!(p.collateral.balance(&borrower), 10);
}

#[test]
fn test_repay_without_funds_fails() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(YEAR);
    assert_eq!(
        p.book.try_repay(&borrower, &loan_id),
        Err(Ok(Error::InsufficientCreditBalance))
    );
}

#[test]
fn test_unknown_loan_is_reported() {
    let env = Env::default();
    let p = setup(&env);
    let payer = p.funded(1_000);
    let missing = BytesN::from_array(&env, &[7; 32]);
    assert_eq!(
        p.book.try_repay(&payer, &missing),
        Err(Ok(Error::LoanNotFound))
    );
    assert_eq!(
        p.book.try_get_loan(&missing),
        Err(Ok(Error::LoanNotFound))
    );
}

// ── call ─────────────────────────────────────────────────────────────────────

#[test]
fn test_call_snapshots_debt() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    let caller = Address::generate(&env);
    p.advance(YEAR);

    let info = p.book.call(&caller, &loan_id);
    assert_eq!(info.call_debt, 1_050);
    assert_eq!(info.call_time, START + YEAR);
    assert_eq!(info.caller, caller);
    assert_eq!(info.call_fee, 0);
    assert_eq!(
        p.book.get_loan(&loan_id).status,
        LoanStatus::Called(info)
    );
    assert_eq!(
        p.book.try_call(&caller, &loan_id),
        Err(Ok(Error::InvalidLoanState))
    );
}

#[test]
fn test_call_fee_is_burned_and_refunded_on_repay() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.call_fee = SCALAR / 20);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    let caller = p.funded(50);

    let info = p.book.call(&caller, &loan_id);
    assert_eq!(info.call_fee, 50);
    assert_eq!(p.credit.balance(&caller), 0);
    assert_eq!(p.credit.total_supply(), 1_000);

    p.book.repay(&borrower, &loan_id);
    assert_eq!(p.credit.balance(&borrower), 50);
    assert_eq!(p.collateral.balance(&borrower), 10);
}

#[test]
fn test_call_fee_requires_balance() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.call_fee = SCALAR / 20);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    let caller = p.funded(49);
    assert_eq!(
        p.book.try_call(&caller, &loan_id),
        Err(Ok(Error::InsufficientCreditBalance))
    );
}

#[test]
fn test_call_fee_waived_after_missed_partial_repay() {
    let env = Env::default();
    let p = setup_with(&env, |config| {
        config.call_fee = SCALAR / 20;
        config.max_partial_repay_delay = 86_400;
    });
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.advance(86_401);
    let caller = Address::generate(&env);
    assert_eq!(p.book.call(&caller, &loan_id).call_fee, 0);
}

#[test]
fn test_call_fee_waived_when_insolvent() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.call_fee = SCALAR / 20);
    // borrow at the collateral limit; interest alone makes it insolvent
    let (_borrower, loan_id) = p.open_loan(10_000, 10);
    p.advance(86_400);
    let caller = Address::generate(&env);
    assert_eq!(p.book.call(&caller, &loan_id).call_fee, 0);
}

#[test]
fn test_call_fee_waived_on_deprecated_book() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.call_fee = SCALAR / 20);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.book.deprecate(&p.governor);
    let caller = Address::generate(&env);
    assert_eq!(p.book.call(&caller, &loan_id).call_fee, 0);
}

#[test]
fn test_call_many_reports_failures_per_loan() {
    let env = Env::default();
    let p = setup(&env);
    let (_a, first) = p.open_loan(1_000, 10);
    let (b, repaid) = p.open_loan(1_000, 10);
    let (_c, third) = p.open_loan(2_000, 10);
    p.book.repay(&b, &repaid);
    let missing = BytesN::from_array(&env, &[9; 32]);

    let caller = Address::generate(&env);
    let outcomes = p.book.call_many(
        &caller,
        &vec![&env, first.clone(), repaid, missing, third.clone()],
    );
    assert_eq!(
        outcomes,
        vec![
            &env,
            CallOutcome::Called(1_000),
            CallOutcome::Failed(Error::LoanClosed as u32),
            CallOutcome::Failed(Error::LoanNotFound as u32),
            CallOutcome::Called(2_000),
        ]
    );
    assert!(p.book.get_loan(&first).call_info().is_some());
    assert!(p.book.get_loan(&third).call_info().is_some());
}

#[test]
fn test_called_loan_can_still_be_repaid() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.book.call(&Address::generate(&env), &loan_id);
    p.book.repay(&borrower, &loan_id);
    assert_eq!(p.collateral.balance(&borrower), 10);
    assert_eq!(
        p.book.try_partial_repay(&borrower, &loan_id, &100),
        Err(Ok(Error::LoanClosed))
    );
}

#[test]
fn test_called_loan_cannot_be_partially_repaid() {
    let env = Env::default();
    let p = setup(&env);
    let (borrower, loan_id) = p.open_loan(1_000, 10);
    p.book.call(&Address::generate(&env), &loan_id);
    assert_eq!(
        p.book.try_partial_repay(&borrower, &loan_id, &500),
        Err(Ok(Error::InvalidLoanState))
    );
    assert_eq!(
        p.book.try_add_collateral(&borrower, &loan_id, &1),
        Err(Ok(Error::InvalidLoanState))
    );
}

// ── forgive ──────────────────────────────────────────────────────────────────

#[test]
fn test_forgive_requires_role() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    let forgiver = Address::generate(&env);
    assert_eq!(
        p.book.try_forgive(&forgiver, &loan_id),
        Err(Ok(Error::Unauthorized))
    );

    p.funded(9_000);
    p.ledger
        .grant_role(&p.governor, &forgiver, &Role::Forgiver);
    assert_eq!(p.book.forgive(&forgiver, &loan_id), 1_000);
    assert_eq!(
        closed_reason(&p.book.get_loan(&loan_id).status),
        Some(CloseReason::Forgiven)
    );
    assert_eq!(p.book.issuance(), 0);
    // collateral stays with the loan book
    assert_eq!(p.collateral.balance(&p.book.address), 10);
    assert_eq!(p.ledger.credit_multiplier(), SCALAR * 9 / 10);
}

#[test]
fn test_forgive_called_loan_uses_call_debt() {
    let env = Env::default();
    let p = setup(&env);
    let (_borrower, loan_id) = p.open_loan(1_000, 10);
    p.funded(9_000);
    p.advance(YEAR);
    p.book.call(&Address::generate(&env), &loan_id);
    p.advance(YEAR);
    assert_eq!(p.book.forgive(&p.governor, &loan_id), 1_050);
    assert_eq!(
        p.book.try_forgive(&p.governor, &loan_id),
        Err(Ok(Error::LoanClosed))
    );
}

// ── hard cap ─────────────────────────────────────────────────────────────────

#[test]
fn test_hard_cap_blocks_borrow() {
    let env = Env::default();
    let p = setup_with(&env, |config| config.hard_cap = 5_000);
    p.open_loan(4_000, 10);
    let borrower = p.borrower(10);
    assert_eq!(
        p.book.try_borrow(&borrower, &1_001, &10),
        Err(Ok(Error::HardCapExceeded))
    );
    p.book.borrow(&borrower, &1_000, &10);
    assert_eq!(p.book.issuance(), 5_000);
}

#[test]
fn test_guardian_may_only_lower_hard_cap() {
    let env = Env::default();
    let p = setup(&env);
    let guardian = Address::generate(&env);
    p.ledger
        .grant_role(&p.governor, &guardian, &Role::Guardian);

    p.book.set_hard_cap(&guardian, &500_000);
    assert_eq!(p.book.config().hard_cap, 500_000);
    assert_eq!(
        p.book.try_set_hard_cap(&guardian, &500_001),
        Err(Ok(Error::Unauthorized))
    );

    p.book.set_hard_cap(&p.governor, &2_000_000);
    assert_eq!(p.book.config().hard_cap, 2_000_000);

    let stranger = Address::generate(&env);
    assert_eq!(
        p.book.try_set_hard_cap(&stranger, &1),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_hard_cap_cannot_drop_below_issuance() {
    let env = Env::default();
    let p = setup(&env);
    p.open_loan(5_000, 10);
    assert_eq!(
        p.book.try_set_hard_cap(&p.governor, &4_999),
        Err(Ok(Error::HardCapExceeded))
    );
    assert_eq!(p.book.config().hard_cap, 1_000_000);

    p.book.set_hard_cap(&p.governor, &5_000);
    assert_eq!(p.book.debt_ceiling(), 5_000);
    assert!(p.book.issuance() <= p.book.debt_ceiling());
}

#[test]
fn test_init_twice_fails() {
    let env = Env::default();
    let p = setup(&env);
    let config = p.book.config();
    assert_eq!(
        p.book.try_init(
            &p.ledger.address,
            &p.credit.address,
            &p.auction.address,
            &config
        ),
        Err(Ok(Error::AlreadyInitialized))
    );
}
