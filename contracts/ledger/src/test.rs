use super::*;
use credit_token::{CreditToken, CreditTokenClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{contract, contractimpl, String};

/// Gauge stand-in counting loss notifications per term.
#[contract]
pub struct RecordingGauge;

#[contractimpl]
impl RecordingGauge {
    pub fn debt_ceiling(_env: Env, _term: Address) -> i128 {
        i128::MAX
    }

    pub fn notify_gauge_loss(env: Env, term: Address) {
        let count: u32 = env.storage().instance().get(&term).unwrap_or(0);
        env.storage().instance().set(&term, &(count + 1));
    }

    pub fn losses(env: Env, term: Address) -> u32 {
        env.storage().instance().get(&term).unwrap_or(0)
    }
}

struct Setup<'a> {
    ledger: AccountingLedgerClient<'a>,
    credit: CreditTokenClient<'a>,
    governor: Address,
    faucet: Address,
    term: Address,
}

fn setup(env: &Env) -> Setup<'_> {
    env.mock_all_auths();
    let governor = Address::generate(env);
    let faucet = Address::generate(env);
    let term = Address::generate(env);

    let credit_id = env.register(CreditToken, ());
    let credit = CreditTokenClient::new(env, &credit_id);
    credit.init(
        &Address::generate(env),
        &7,
        &String::from_str(env, "Credit"),
        &String::from_str(env, "CREDIT"),
    );
    credit.set_minter(&faucet, &true);

    let ledger_id = env.register(AccountingLedger, ());
    let ledger = AccountingLedgerClient::new(env, &ledger_id);
    ledger.init(&governor, &credit_id, &100);
    ledger.register_term(&governor, &term);

    Setup {
        ledger,
        credit,
        governor,
        faucet,
        term,
    }
}

/// Simulates a loan book paying `amount` of interest into the ledger.
fn book_profit(s: &Setup, amount: i128) {
    s.credit.mint(&s.faucet, &s.ledger.address, &amount);
    s.ledger.notify_profit(&s.term, &amount);
}

fn mint_to_holder(env: &Env, s: &Setup, amount: i128) -> Address {
    let holder = Address::generate(env);
    s.credit.mint(&s.faucet, &holder, &amount);
    holder
}

// ── init / roles ─────────────────────────────────────────────────────────────

#[test]
fn test_init_defaults() {
    let env = Env::default();
    let s = setup(&env);
    assert_eq!(s.ledger.credit_multiplier(), SCALAR);
    assert_eq!(s.ledger.surplus_buffer(), 0);
    assert_eq!(s.ledger.min_borrow(), 100);
    assert!(s.ledger.has_role(&s.governor, &Role::Governor));
    assert!(s.ledger.is_term(&s.term));
    assert_eq!(s.ledger.credit_token(), s.credit.address);
}

#[test]
fn test_init_twice_fails() {
    let env = Env::default();
    let s = setup(&env);
    assert_eq!(
        s.ledger.try_init(&s.governor, &s.credit.address, &0),
        Err(Ok(Error::AlreadyInitialized))
    );
}

#[test]
fn test_grant_and_revoke_role() {
    let env = Env::default();
    let s = setup(&env);
    let guardian = Address::generate(&env);
    s.ledger.grant_role(&s.governor, &guardian, &Role::Guardian);
    assert!(s.ledger.has_role(&guardian, &Role::Guardian));
    assert!(!s.ledger.has_role(&guardian, &Role::Governor));
    s.ledger.revoke_role(&s.governor, &guardian, &Role::Guardian);
    assert!(!s.ledger.has_role(&guardian, &Role::Guardian));
}

#[test]
fn test_non_governor_cannot_configure() {
    let env = Env::default();
    let s = setup(&env);
    let stranger = Address::generate(&env);
    assert_eq!(
        s.ledger.try_grant_role(&stranger, &stranger, &Role::Governor),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(
        s.ledger.try_register_term(&stranger, &stranger),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(
        s.ledger.try_set_min_borrow(&stranger, &1),
        Err(Ok(Error::Unauthorized))
    );
}

// ── issuance ─────────────────────────────────────────────────────────────────

#[test]
fn test_issuance_counters() {
    let env = Env::default();
    let s = setup(&env);
    assert_eq!(s.ledger.increase_issuance(&s.term, &1_000), 1_000);
    assert_eq!(s.ledger.increase_issuance(&s.term, &500), 1_500);
    assert_eq!(s.ledger.decrease_issuance(&s.term, &400), 1_100);
    assert_eq!(s.ledger.issuance(&s.term), 1_100);
    assert_eq!(s.ledger.total_issuance(), 1_100);
    assert_eq!(
        s.ledger.try_decrease_issuance(&s.term, &1_101),
        Err(Ok(Error::InvalidAmount))
    );
}

#[test]
fn test_unregistered_term_is_rejected() {
    let env = Env::default();
    let s = setup(&env);
    let rogue = Address::generate(&env);
    assert_eq!(
        s.ledger.try_increase_issuance(&rogue, &1),
        Err(Ok(Error::UnknownTerm))
    );
    assert_eq!(
        s.ledger.try_notify_loss(&rogue, &1),
        Err(Ok(Error::UnknownTerm))
    );
    assert_eq!(
        s.ledger.try_notify_profit(&rogue, &1),
        Err(Ok(Error::UnknownTerm))
    );
}

// ── profit ───────────────────────────────────────────────────────────────────

#[test]
fn test_profit_defaults_to_surplus_buffer() {
    let env = Env::default();
    let s = setup(&env);
    book_profit(&s, 1_000);
    assert_eq!(s.ledger.surplus_buffer(), 1_000);
    assert_eq!(s.credit.balance(&s.ledger.address), 1_000);
}

#[test]
fn test_profit_split_routes_to_recipients() {
    let env = Env::default();
    let s = setup(&env);
    let holders = Address::generate(&env);
    s.ledger.set_profit_sharing_config(
        &s.governor,
        &ProfitSharingConfig {
            surplus_buffer_split: SCALAR / 2,
            credit_split: SCALAR * 3 / 10,
            guild_split: SCALAR / 5,
            other_split: 0,
            credit_recipient: Some(holders.clone()),
            guild_recipient: None,
            other_recipient: None,
        },
    );
    book_profit(&s, 1_000);
    assert_eq!(s.credit.balance(&holders), 300);
    // guild share has no recipient and stays in the buffer
    assert_eq!(s.ledger.surplus_buffer(), 700);
    assert_eq!(s.credit.balance(&s.ledger.address), 700);
}

#[test]
fn test_profit_split_must_sum_to_one() {
    let env = Env::default();
    let s = setup(&env);
    let config = ProfitSharingConfig {
        surplus_buffer_split: SCALAR / 2,
        credit_split: SCALAR / 4,
        guild_split: 0,
        other_split: 0,
        credit_recipient: None,
        guild_recipient: None,
        other_recipient: None,
    };
    assert_eq!(
        s.ledger.try_set_profit_sharing_config(&s.governor, &config),
        Err(Ok(Error::InvalidConfig))
    );
}

// ── loss ─────────────────────────────────────────────────────────────────────

#[test]
fn test_loss_absorbed_by_surplus_buffer() {
    let env = Env::default();
    let s = setup(&env);
    book_profit(&s, 600);
    mint_to_holder(&env, &s, 1_000);
    s.ledger.notify_loss(&s.term, &525);
    assert_eq!(s.ledger.surplus_buffer(), 75);
    assert_eq!(s.ledger.credit_multiplier(), SCALAR);
    assert_eq!(s.credit.balance(&s.ledger.address), 75);
    assert_eq!(s.credit.total_supply(), 1_075);
}

#[test]
fn test_loss_beyond_buffer_marks_down_multiplier() {
    let env = Env::default();
    let s = setup(&env);
    book_profit(&s, 200);
    mint_to_holder(&env, &s, 800);
    s.ledger.notify_loss(&s.term, &525);
    // buffer burns 200, leaving 800 supply to absorb the remaining 325
    assert_eq!(s.ledger.surplus_buffer(), 0);
    assert_eq!(s.credit.total_supply(), 800);
    assert_eq!(s.ledger.credit_multiplier(), SCALAR * 475 / 800);
}

#[test]
fn test_multiplier_never_increases() {
    let env = Env::default();
    let s = setup(&env);
    mint_to_holder(&env, &s, 10_000);
    let mut previous = s.ledger.credit_multiplier();
    for loss in [1_i128, 250, 3_000, 17] {
        s.ledger.notify_loss(&s.term, &loss);
        let current = s.ledger.credit_multiplier();
        assert!(current <= previous);
        previous = current;
        // profit never pushes the multiplier back up
        book_profit(&s, 10);
        assert_eq!(s.ledger.credit_multiplier(), current);
    }
}

#[test]
fn test_min_borrow_scales_with_multiplier() {
    let env = Env::default();
    let s = setup(&env);
    mint_to_holder(&env, &s, 1_000);
    s.ledger.notify_loss(&s.term, &500);
    assert_eq!(s.ledger.credit_multiplier(), SCALAR / 2);
    assert_eq!(s.ledger.min_borrow(), 200);
}

#[test]
fn test_loss_notifies_gauge() {
    let env = Env::default();
    let s = setup(&env);
    let gauge_id = env.register(RecordingGauge, ());
    let gauge = RecordingGaugeClient::new(&env, &gauge_id);
    s.ledger.set_gauge(&s.governor, &Some(gauge_id.clone()));
    mint_to_holder(&env, &s, 1_000);
    s.ledger.notify_loss(&s.term, &10);
    assert_eq!(gauge.losses(&s.term), 1);
}

#[test]
fn test_zero_loss_is_rejected() {
    let env = Env::default();
    let s = setup(&env);
    assert_eq!(
        s.ledger.try_notify_loss(&s.term, &0),
        Err(Ok(Error::InvalidAmount))
    );
}

// ── surplus buffer management ────────────────────────────────────────────────

#[test]
fn test_donate_and_withdraw_surplus() {
    let env = Env::default();
    let s = setup(&env);
    let donor = mint_to_holder(&env, &s, 1_000);
    s.ledger.donate_to_surplus_buffer(&donor, &400);
    assert_eq!(s.ledger.surplus_buffer(), 400);
    assert_eq!(s.credit.balance(&donor), 600);

    let treasury = Address::generate(&env);
    assert_eq!(
        s.ledger
            .try_withdraw_from_surplus_buffer(&s.governor, &treasury, &401),
        Err(Ok(Error::InsufficientCreditBalance))
    );
    s.ledger
        .withdraw_from_surplus_buffer(&s.governor, &treasury, &150);
    assert_eq!(s.ledger.surplus_buffer(), 250);
    assert_eq!(s.credit.balance(&treasury), 150);
}
