#![no_std]

//! Loan book: callable loans issued under one collateral and rate
//! configuration.
//!
//! Borrowers lock collateral and receive freshly minted credit. A loan is
//! closed by repayment, by an auction run by the auction engine after it has
//! been called, or by forgiveness. Every close path reports principal to the
//! ledger's issuance counters and routes interest (profit) or shortfall (loss)
//! through the ledger.
//!
//! # Reentrancy
//! Soroban token transfers do not call back into the invoker. Borrow and
//! repay paths still hold a guard so a callback from a future integration
//! reverts instead of observing half-written loan state.

pub mod events;
mod storage;

use credit_shared::{
    math::{self, SCALAR},
    require_capability, CallInfo, CallOutcome, CloseReason, Closure, Error, GaugeClient,
    LedgerClient, Loan, LoanStatus, LoanTermConfig, MintableClient, Role,
};
use soroban_sdk::{contract, contractimpl, log, token, Address, BytesN, Env, Vec};

use events::{
    publish_borrow, publish_call, publish_collateral_added, publish_deprecated, publish_forgive,
    publish_hard_cap, publish_partial_repay, publish_repay, publish_seize, publish_settle,
    BorrowEvent, CallEvent, CollateralAddedEvent, DeprecatedEvent, ForgiveEvent, HardCapEvent,
    PartialRepayEvent, RepayEvent, SeizeEvent, SettleEvent,
};
use storage::{
    extend_instance, is_deprecated, next_loan_id, read_borrower_loans, read_config, read_loan,
    read_refs, write_config, write_loan, DataKey, Refs,
};

fn set_reentrancy_guard(env: &Env) -> Result<(), Error> {
    let active: bool = env
        .storage()
        .instance()
        .get(&DataKey::Reentrancy)
        .unwrap_or(false);
    if active {
        return Err(Error::Reentrancy);
    }
    env.storage().instance().set(&DataKey::Reentrancy, &true);
    Ok(())
}

fn clear_reentrancy_guard(env: &Env) {
    env.storage().instance().set(&DataKey::Reentrancy, &false);
}

fn validate_config(config: &LoanTermConfig) -> Result<(), Error> {
    let ratio = 0..=SCALAR;
    if config.max_debt_per_collateral_token <= 0
        || config.interest_rate < 0
        || config.hard_cap < 0
        || !ratio.contains(&config.min_partial_repay_percent)
        || !ratio.contains(&config.opening_fee)
        || !ratio.contains(&config.call_fee)
    {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

fn check_positive(amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

/// Rejects loans that are not in the `Open` state.
fn require_open(loan: &Loan) -> Result<(), Error> {
    match loan.status {
        LoanStatus::Open => Ok(()),
        LoanStatus::Closed(_) => Err(Error::LoanClosed),
        _ => Err(Error::InvalidLoanState),
    }
}

fn require_balance(credit: &token::Client, owner: &Address, amount: i128) -> Result<(), Error> {
    if credit.balance(owner) < amount {
        return Err(Error::InsufficientCreditBalance);
    }
    Ok(())
}

/// Debt owed on `loan` right now, in current credit units.
fn loan_debt(
    env: &Env,
    config: &LoanTermConfig,
    loan: &Loan,
    multiplier: i128,
) -> Result<i128, Error> {
    match &loan.status {
        LoanStatus::Closed(_) => Ok(0),
        LoanStatus::Liquidating(info) => Ok(info.call_debt),
        LoanStatus::Open | LoanStatus::Called(_) => {
            let nominal = math::nominal_debt(
                loan.borrow_amount,
                loan.opening_fee,
                config.interest_rate,
                loan.borrow_time,
                env.ledger().timestamp(),
            )?;
            math::rescale(nominal, loan.borrow_credit_multiplier, multiplier)
        }
    }
}

/// Principal of `loan` in current credit units.
fn principal_now(loan: &Loan, multiplier: i128) -> Result<i128, Error> {
    math::rescale(loan.borrow_amount, loan.borrow_credit_multiplier, multiplier)
}

fn partial_repay_overdue(config: &LoanTermConfig, loan: &Loan, now: u64) -> bool {
    config.max_partial_repay_delay != 0
        && now.saturating_sub(loan.last_partial_repay) > config.max_partial_repay_delay
}

fn gauge_ceiling(env: &Env, ledger: &LedgerClient, config: &LoanTermConfig) -> i128 {
    match ledger.gauge() {
        Some(gauge) => GaugeClient::new(env, &gauge)
            .debt_ceiling(&env.current_contract_address())
            .min(config.hard_cap),
        None => config.hard_cap,
    }
}

/// Forwards `amount` credit held by the loan book to the ledger as profit.
fn book_profit(
    env: &Env,
    ledger: &LedgerClient,
    credit: &token::Client,
    amount: i128,
) -> Result<(), Error> {
    if amount <= 0 {
        return Ok(());
    }
    let this = env.current_contract_address();
    credit.transfer(&this, &ledger.address, &amount);
    ledger.notify_profit(&this, &amount);
    Ok(())
}

/// Settles the full debt of an `Open` or `Called` loan from `payer` and
/// returns the collateral to the borrower.
fn close_repaid(
    env: &Env,
    refs: &Refs,
    config: &LoanTermConfig,
    payer: &Address,
    mut loan: Loan,
) -> Result<i128, Error> {
    let ledger = LedgerClient::new(env, &refs.ledger);
    let credit = token::Client::new(env, &refs.credit_token);
    let this = env.current_contract_address();
    let now = env.ledger().timestamp();

    let multiplier = ledger.credit_multiplier();
    let debt = loan_debt(env, config, &loan, multiplier)?;
    let principal = principal_now(&loan, multiplier)?.min(debt);
    let interest = debt - principal;
    require_balance(&credit, payer, debt)?;

    credit.transfer(payer, &this, &debt);
    credit.burn(&this, &principal);
    book_profit(env, &ledger, &credit, interest)?;
    ledger.decrease_issuance(&this, &loan.borrow_amount);
    token::Client::new(env, &config.collateral_token).transfer(
        &this,
        &loan.borrower,
        &loan.collateral_amount,
    );

    let refund = loan.call_info().map(|info| info.call_fee).unwrap_or(0);
    if refund > 0 {
        MintableClient::new(env, &refs.credit_token).mint(&this, &loan.borrower, &refund);
    }

    loan.status = LoanStatus::Closed(Closure {
        close_time: now,
        reason: CloseReason::Repaid,
    });
    write_loan(env, &loan);

    publish_repay(
        env,
        RepayEvent {
            loan_id: loan.id.clone(),
            payer: payer.clone(),
            debt,
            principal,
            interest,
            call_fee_refund: refund,
            timestamp: now,
        },
    );
    Ok(debt)
}

/// Moves one `Open` loan to `Called`, burning the call fee from `fee_payer`
/// unless it is waived.
fn call_loan(
    env: &Env,
    refs: &Refs,
    config: &LoanTermConfig,
    multiplier: i128,
    deprecated: bool,
    fee_payer: &Address,
    loan_id: &BytesN<32>,
) -> Result<CallInfo, Error> {
    let mut loan = read_loan(env, loan_id)?;
    require_open(&loan)?;

    let now = env.ledger().timestamp();
    let debt = loan_debt(env, config, &loan, multiplier)?;
    let max_debt = math::max_debt_for_collateral(
        loan.collateral_amount,
        config.max_debt_per_collateral_token,
        multiplier,
    )?;
    let waived = deprecated || partial_repay_overdue(config, &loan, now) || debt > max_debt;
    let call_fee = if waived {
        0
    } else {
        math::mul_div(debt, config.call_fee, SCALAR)?
    };

    if call_fee > 0 {
        let credit = token::Client::new(env, &refs.credit_token);
        match credit.try_burn(fee_payer, &call_fee) {
            Ok(Ok(())) => {}
            _ => return Err(Error::InsufficientCreditBalance),
        }
    }

    let info = CallInfo {
        caller: fee_payer.clone(),
        call_time: now,
        call_debt: debt,
        call_fee,
    };
    loan.status = LoanStatus::Called(info.clone());
    write_loan(env, &loan);

    publish_call(
        env,
        CallEvent {
            loan_id: loan_id.clone(),
            caller: fee_payer.clone(),
            call_debt: debt,
            call_fee,
            timestamp: now,
        },
    );
    Ok(info)
}

#[contract]
pub struct LoanBook;

#[contractimpl]
impl LoanBook {
    /// Binds the loan book to its ledger, credit token and auction engine.
    /// The ledger's governor must still register it as a term before it can
    /// issue credit.
    pub fn init(
        env: Env,
        ledger: Address,
        credit_token: Address,
        auction_engine: Address,
        config: LoanTermConfig,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Refs) {
            return Err(Error::AlreadyInitialized);
        }
        validate_config(&config)?;
        env.storage().instance().set(
            &DataKey::Refs,
            &Refs {
                ledger,
                credit_token,
                auction_engine,
            },
        );
        write_config(&env, &config);
        Ok(())
    }

    // ── views ────────────────────────────────────────────────────────────────

    pub fn config(env: Env) -> Result<LoanTermConfig, Error> {
        read_config(&env)
    }

    pub fn ledger(env: Env) -> Result<Address, Error> {
        Ok(read_refs(&env)?.ledger)
    }

    pub fn auction_engine(env: Env) -> Result<Address, Error> {
        Ok(read_refs(&env)?.auction_engine)
    }

    pub fn get_loan(env: Env, loan_id: BytesN<32>) -> Result<Loan, Error> {
        read_loan(&env, &loan_id)
    }

    /// Ids of every loan `borrower` has opened here, oldest first.
    pub fn loans_of(env: Env, borrower: Address) -> Vec<BytesN<32>> {
        read_borrower_loans(&env, &borrower)
    }

    /// Debt owed right now: accrued nominal debt rescaled to the current
    /// multiplier, the frozen call debt once liquidating, zero once closed.
    pub fn current_debt(env: Env, loan_id: BytesN<32>) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let loan = read_loan(&env, &loan_id)?;
        let multiplier = LedgerClient::new(&env, &refs.ledger).credit_multiplier();
        loan_debt(&env, &config, &loan, multiplier)
    }

    /// Outstanding principal issued by this loan book, as tracked by the ledger.
    pub fn issuance(env: Env) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        Ok(LedgerClient::new(&env, &refs.ledger).issuance(&env.current_contract_address()))
    }

    /// The lower of the hard cap and the gauge allocation, if a gauge is set.
    pub fn debt_ceiling(env: Env) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        Ok(gauge_ceiling(
            &env,
            &LedgerClient::new(&env, &refs.ledger),
            &config,
        ))
    }

    /// Largest principal `collateral_amount` can back right now.
    pub fn max_debt_for_collateral(env: Env, collateral_amount: i128) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        math::max_debt_for_collateral(
            collateral_amount,
            config.max_debt_per_collateral_token,
            LedgerClient::new(&env, &refs.ledger).credit_multiplier(),
        )
    }

    pub fn partial_repay_delay_passed(env: Env, loan_id: BytesN<32>) -> Result<bool, Error> {
        let config = read_config(&env)?;
        let loan = read_loan(&env, &loan_id)?;
        Ok(!loan.is_closed() && partial_repay_overdue(&config, &loan, env.ledger().timestamp()))
    }

    pub fn is_deprecated(env: Env) -> bool {
        is_deprecated(&env)
    }

    // ── borrower operations ──────────────────────────────────────────────────

    /// Opens a loan: locks `collateral_amount` of the collateral token and
    /// mints `borrow_amount` credit to `borrower`.
    ///
    /// # Errors
    /// * `InvalidAmount` – either amount is zero or negative
    /// * `TermDeprecated` – the loan book no longer accepts new loans
    /// * `BorrowAmountTooLow` – below the ledger's minimum borrow
    /// * `InsufficientCollateral` – collateral cannot back the borrow
    /// * `HardCapExceeded` / `DebtCeilingExceeded` – issuance would pass a ceiling
    /// * `Reentrancy` – re-entrant call detected
    pub fn borrow(
        env: Env,
        borrower: Address,
        borrow_amount: i128,
        collateral_amount: i128,
    ) -> Result<BytesN<32>, Error> {
        set_reentrancy_guard(&env)?;
        borrower.require_auth();
        check_positive(borrow_amount)?;
        check_positive(collateral_amount)?;
        if is_deprecated(&env) {
            return Err(Error::TermDeprecated);
        }

        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let ledger = LedgerClient::new(&env, &refs.ledger);
        let this = env.current_contract_address();
        let multiplier = ledger.credit_multiplier();

        if borrow_amount < ledger.min_borrow() {
            return Err(Error::BorrowAmountTooLow);
        }
        let max_debt = math::max_debt_for_collateral(
            collateral_amount,
            config.max_debt_per_collateral_token,
            multiplier,
        )?;
        if borrow_amount > max_debt {
            return Err(Error::InsufficientCollateral);
        }
        let issuance = ledger
            .issuance(&this)
            .checked_add(borrow_amount)
            .ok_or(Error::Overflow)?;
        if issuance > config.hard_cap {
            return Err(Error::HardCapExceeded);
        }
        if issuance > gauge_ceiling(&env, &ledger, &config) {
            return Err(Error::DebtCeilingExceeded);
        }

        let opening_fee = math::mul_div(borrow_amount, config.opening_fee, SCALAR)?;
        let now = env.ledger().timestamp();
        let loan_id = next_loan_id(&env, &borrower);
        let loan = Loan {
            id: loan_id.clone(),
            borrower: borrower.clone(),
            borrow_time: now,
            borrow_amount,
            opening_fee,
            borrow_credit_multiplier: multiplier,
            collateral_amount,
            last_partial_repay: now,
            status: LoanStatus::Open,
        };
        write_loan(&env, &loan);

        ledger.increase_issuance(&this, &borrow_amount);
        token::Client::new(&env, &config.collateral_token).transfer(
            &borrower,
            &this,
            &collateral_amount,
        );
        MintableClient::new(&env, &refs.credit_token).mint(&this, &borrower, &borrow_amount);

        clear_reentrancy_guard(&env);

        publish_borrow(
            &env,
            BorrowEvent {
                loan_id: loan_id.clone(),
                borrower,
                borrow_amount,
                collateral_amount,
                opening_fee,
                credit_multiplier: multiplier,
                timestamp: now,
            },
        );
        Ok(loan_id)
    }

    /// Tops up the collateral of an open loan. Anyone may add collateral.
    pub fn add_collateral(
        env: Env,
        from: Address,
        loan_id: BytesN<32>,
        amount: i128,
    ) -> Result<(), Error> {
        from.require_auth();
        check_positive(amount)?;
        let config = read_config(&env)?;
        let mut loan = read_loan(&env, &loan_id)?;
        require_open(&loan)?;

        token::Client::new(&env, &config.collateral_token).transfer(
            &from,
            &env.current_contract_address(),
            &amount,
        );
        loan.collateral_amount = loan
            .collateral_amount
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        write_loan(&env, &loan);

        publish_collateral_added(
            &env,
            CollateralAddedEvent {
                loan_id,
                from,
                amount,
                collateral_amount: loan.collateral_amount,
            },
        );
        Ok(())
    }

    /// Pays back part of an open loan and returns the debt still owed.
    /// Paying the full debt or more closes the loan as `repay` would.
    ///
    /// Principal and opening fee shrink in proportion to the share of the
    /// debt paid. The principal share is burned, the rest goes to the ledger
    /// as profit.
    ///
    /// # Errors
    /// * `PartialRepayTooSmall` – below the minimum share of current debt
    /// * `BorrowAmountTooLow` – the remaining principal would drop under the
    ///   minimum borrow
    /// * `LoanClosed` / `InvalidLoanState` – the loan is not open
    pub fn partial_repay(
        env: Env,
        payer: Address,
        loan_id: BytesN<32>,
        amount: i128,
    ) -> Result<i128, Error> {
        set_reentrancy_guard(&env)?;
        payer.require_auth();
        check_positive(amount)?;

        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let mut loan = read_loan(&env, &loan_id)?;
        require_open(&loan)?;

        let ledger = LedgerClient::new(&env, &refs.ledger);
        let multiplier = ledger.credit_multiplier();
        let debt = loan_debt(&env, &config, &loan, multiplier)?;
        if amount >= debt {
            close_repaid(&env, &refs, &config, &payer, loan)?;
            clear_reentrancy_guard(&env);
            return Ok(0);
        }

        if amount < math::mul_div(debt, config.min_partial_repay_percent, SCALAR)? {
            return Err(Error::PartialRepayTooSmall);
        }
        let principal_repaid = math::mul_div(loan.borrow_amount, amount, debt)?;
        let fee_repaid = math::mul_div(loan.opening_fee, amount, debt)?;
        let remaining = loan.borrow_amount - principal_repaid;
        if math::rescale(remaining, loan.borrow_credit_multiplier, multiplier)?
            < ledger.min_borrow()
        {
            return Err(Error::BorrowAmountTooLow);
        }

        let credit = token::Client::new(&env, &refs.credit_token);
        let this = env.current_contract_address();
        let burned = math::rescale(principal_repaid, loan.borrow_credit_multiplier, multiplier)?
            .min(amount);
        let interest = amount - burned;
        require_balance(&credit, &payer, amount)?;

        credit.transfer(&payer, &this, &amount);
        if burned > 0 {
            credit.burn(&this, &burned);
        }
        book_profit(&env, &ledger, &credit, interest)?;
        if principal_repaid > 0 {
            ledger.decrease_issuance(&this, &principal_repaid);
        }

        let now = env.ledger().timestamp();
        loan.borrow_amount = remaining;
        loan.opening_fee -= fee_repaid;
        loan.last_partial_repay = now;
        write_loan(&env, &loan);

        clear_reentrancy_guard(&env);

        publish_partial_repay(
            &env,
            PartialRepayEvent {
                loan_id,
                payer,
                amount,
                principal_repaid: burned,
                interest_repaid: interest,
                remaining_borrow_amount: remaining,
                timestamp: now,
            },
        );
        Ok(debt - amount)
    }

    /// Pays back the full current debt of an open or called loan and returns
    /// the amount paid. The collateral goes back to the borrower; a call fee
    /// paid on this loan is re-minted to the borrower.
    ///
    /// # Errors
    /// * `LoanClosed` – the loan is already closed
    /// * `InvalidLoanState` – the collateral is at auction
    /// * `InsufficientCreditBalance` – `payer` cannot cover the debt
    pub fn repay(env: Env, payer: Address, loan_id: BytesN<32>) -> Result<i128, Error> {
        set_reentrancy_guard(&env)?;
        payer.require_auth();

        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let loan = read_loan(&env, &loan_id)?;
        match loan.status {
            LoanStatus::Open | LoanStatus::Called(_) => {}
            LoanStatus::Closed(_) => return Err(Error::LoanClosed),
            LoanStatus::Liquidating(_) => return Err(Error::InvalidLoanState),
        }

        let paid = close_repaid(&env, &refs, &config, &payer, loan)?;
        clear_reentrancy_guard(&env);
        Ok(paid)
    }

    // ── calls and liquidation ────────────────────────────────────────────────

    /// Calls an open loan, snapshotting its debt. The call fee is burned
    /// from `fee_payer` unless the loan book is deprecated, the borrower
    /// missed the partial repay deadline, or the loan is undercollateralized.
    pub fn call(env: Env, fee_payer: Address, loan_id: BytesN<32>) -> Result<CallInfo, Error> {
        fee_payer.require_auth();
        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let multiplier = LedgerClient::new(&env, &refs.ledger).credit_multiplier();
        call_loan(
            &env,
            &refs,
            &config,
            multiplier,
            is_deprecated(&env),
            &fee_payer,
            &loan_id,
        )
    }

    /// Calls each loan in turn. A loan that cannot be called is reported in
    /// the outcome list and does not stop the batch.
    pub fn call_many(
        env: Env,
        fee_payer: Address,
        loan_ids: Vec<BytesN<32>>,
    ) -> Result<Vec<CallOutcome>, Error> {
        fee_payer.require_auth();
        let refs = read_refs(&env)?;
        let config = read_config(&env)?;
        let multiplier = LedgerClient::new(&env, &refs.ledger).credit_multiplier();
        let deprecated = is_deprecated(&env);

        let mut outcomes = Vec::new(&env);
        for loan_id in loan_ids.iter() {
            let outcome = match call_loan(
                &env,
                &refs,
                &config,
                multiplier,
                deprecated,
                &fee_payer,
                &loan_id,
            ) {
                Ok(info) => CallOutcome::Called(info.call_debt),
                Err(err) => CallOutcome::Failed(err as u32),
            };
            outcomes.push_back(outcome);
        }
        Ok(outcomes)
    }

    /// Hands the collateral of a called loan to the auction engine once the
    /// call period has elapsed. Returns the collateral amount moved.
    pub fn seize(env: Env, loan_id: BytesN<32>) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        refs.auction_engine.require_auth();
        let config = read_config(&env)?;
        let mut loan = read_loan(&env, &loan_id)?;
        let info = match &loan.status {
            LoanStatus::Called(info) => info.clone(),
            LoanStatus::Closed(_) => return Err(Error::LoanClosed),
            _ => return Err(Error::InvalidLoanState),
        };

        let now = env.ledger().timestamp();
        if now < info.call_time.saturating_add(config.call_period) {
            return Err(Error::CallPeriodActive);
        }

        token::Client::new(&env, &config.collateral_token).transfer(
            &env.current_contract_address(),
            &refs.auction_engine,
            &loan.collateral_amount,
        );
        loan.status = LoanStatus::Liquidating(info);
        write_loan(&env, &loan);

        publish_seize(
            &env,
            SeizeEvent {
                loan_id,
                auction_engine: refs.auction_engine,
                collateral_amount: loan.collateral_amount,
                timestamp: now,
            },
        );
        Ok(loan.collateral_amount)
    }

    /// Closes a liquidating loan with the proceeds of its auction. The
    /// auction engine has already moved `credit_received` to this contract.
    ///
    /// The principal share of the proceeds is burned and the rest is booked
    /// as profit. Proceeds short of the call debt report the gap as a loss.
    pub fn settle_from_auction(
        env: Env,
        loan_id: BytesN<32>,
        credit_received: i128,
        collateral_given: i128,
        bidder: Option<Address>,
    ) -> Result<(), Error> {
        let refs = read_refs(&env)?;
        refs.auction_engine.require_auth();
        if credit_received < 0 || collateral_given < 0 {
            return Err(Error::InvalidAmount);
        }
        let mut loan = read_loan(&env, &loan_id)?;
        let info = match &loan.status {
            LoanStatus::Liquidating(info) => info.clone(),
            LoanStatus::Closed(_) => return Err(Error::LoanClosed),
            _ => return Err(Error::InvalidLoanState),
        };
        if collateral_given > loan.collateral_amount {
            return Err(Error::InvalidAmount);
        }

        let ledger = LedgerClient::new(&env, &refs.ledger);
        let credit = token::Client::new(&env, &refs.credit_token);
        let this = env.current_contract_address();

        // Only principal is burned; anything received above it was interest.
        let principal = principal_now(&loan, ledger.credit_multiplier())?.min(credit_received);
        if principal > 0 {
            credit.burn(&this, &principal);
        }
        let profit = credit_received - principal;
        book_profit(&env, &ledger, &credit, profit)?;
        let loss = (info.call_debt - credit_received).max(0);

        ledger.decrease_issuance(&this, &loan.borrow_amount);
        if loss > 0 {
            log!(&env, "auction shortfall", loss);
            ledger.notify_loss(&this, &loss);
        }

        let now = env.ledger().timestamp();
        let reason = if bidder.is_some() {
            CloseReason::Auctioned
        } else {
            CloseReason::Forgiven
        };
        loan.status = LoanStatus::Closed(Closure {
            close_time: now,
            reason,
        });
        write_loan(&env, &loan);

        publish_settle(
            &env,
            SettleEvent {
                loan_id,
                bidder,
                credit_received,
                collateral_given,
                profit,
                loss,
                timestamp: now,
            },
        );
        Ok(())
    }

    /// Writes off an open or called loan and returns the loss reported to
    /// the ledger. The collateral stays in the loan book.
    pub fn forgive(env: Env, forgiver: Address, loan_id: BytesN<32>) -> Result<i128, Error> {
        let refs = read_refs(&env)?;
        require_capability(
            &env,
            &refs.ledger,
            &forgiver,
            &[Role::Governor, Role::Forgiver],
        )?;
        let config = read_config(&env)?;
        let mut loan = read_loan(&env, &loan_id)?;
        let ledger = LedgerClient::new(&env, &refs.ledger);

        let loss = match &loan.status {
            LoanStatus::Open => loan_debt(&env, &config, &loan, ledger.credit_multiplier())?,
            LoanStatus::Called(info) => info.call_debt,
            LoanStatus::Liquidating(_) => return Err(Error::InvalidLoanState),
            LoanStatus::Closed(_) => return Err(Error::LoanClosed),
        };

        let this = env.current_contract_address();
        ledger.decrease_issuance(&this, &loan.borrow_amount);
        if loss > 0 {
            log!(&env, "loan forgiven", loss);
            ledger.notify_loss(&this, &loss);
        }

        let now = env.ledger().timestamp();
        loan.status = LoanStatus::Closed(Closure {
            close_time: now,
            reason: CloseReason::Forgiven,
        });
        write_loan(&env, &loan);

        publish_forgive(
            &env,
            ForgiveEvent {
                loan_id,
                forgiver,
                loss,
                timestamp: now,
            },
        );
        Ok(loss)
    }

    // ── governance ───────────────────────────────────────────────────────────

    /// Governors may set any hard cap; guardians may only lower it. The cap
    /// never drops below the principal already issued.
    pub fn set_hard_cap(env: Env, caller: Address, hard_cap: i128) -> Result<(), Error> {
        if hard_cap < 0 {
            return Err(Error::InvalidConfig);
        }
        let refs = read_refs(&env)?;
        let role = require_capability(
            &env,
            &refs.ledger,
            &caller,
            &[Role::Governor, Role::Guardian],
        )?;
        let mut config = read_config(&env)?;
        if role == Role::Guardian && hard_cap > config.hard_cap {
            return Err(Error::Unauthorized);
        }

        let issuance =
            LedgerClient::new(&env, &refs.ledger).issuance(&env.current_contract_address());
        if hard_cap < issuance {
            return Err(Error::HardCapExceeded);
        }

        let previous = config.hard_cap;
        config.hard_cap = hard_cap;
        write_config(&env, &config);

        publish_hard_cap(
            &env,
            HardCapEvent {
                set_by: caller,
                previous,
                hard_cap,
            },
        );
        Ok(())
    }

    /// Stops new borrowing and waives call fees from now on. Existing loans
    /// can still be repaid, called and auctioned.
    pub fn deprecate(env: Env, governor: Address) -> Result<(), Error> {
        let refs = read_refs(&env)?;
        require_capability(&env, &refs.ledger, &governor, &[Role::Governor])?;
        env.storage().instance().set(&DataKey::Deprecated, &true);
        extend_instance(&env);

        publish_deprecated(
            &env,
            DeprecatedEvent {
                governor,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }
}
