#![no_std]

//! Auction engine: liquidates the collateral of called loans through a
//! two-phase Dutch auction.
//!
//! The first bid wins. Until the mid point the bidder pays the full call
//! debt for a growing share of the collateral (the rest goes back to the
//! borrower); after it the bidder gets all of the collateral for a
//! shrinking share of the debt. An auction nobody bids on before it ends is
//! forgiven and the whole call debt becomes a loss.

pub mod events;
mod storage;

use credit_shared::{
    math, AuctionParams, AuctionQuote, Error, LedgerClient, LoanStatus, TermClient,
};
use soroban_sdk::{contract, contractimpl, log, token, Address, BytesN, Env};

use events::{
    publish_bid, publish_forgive, publish_start, AuctionBidEvent, AuctionForgiveEvent,
    AuctionStartEvent,
};
pub use storage::Auction;
use storage::{read_address, read_auction, read_params, write_auction, DataKey};

/// Builds the auction a called loan would get, without seizing anything.
fn pending_auction(env: &Env, term: &Address, loan_id: &BytesN<32>) -> Result<Auction, Error> {
    let ledger = LedgerClient::new(env, &read_address(env, &DataKey::Ledger)?);
    if !ledger.is_term(term) {
        return Err(Error::UnknownTerm);
    }
    let book = TermClient::new(env, term);
    let loan = book.get_loan(loan_id);
    let info = match loan.status {
        LoanStatus::Called(info) => info,
        _ => return Err(Error::AuctionNotActive),
    };
    let config = book.config();
    Ok(Auction {
        term: term.clone(),
        loan_id: loan_id.clone(),
        borrower: loan.borrower,
        collateral_token: config.collateral_token,
        collateral_amount: loan.collateral_amount,
        call_debt: info.call_debt,
        start_time: info.call_time.saturating_add(config.call_period),
        closed_at: None,
    })
}

/// Seizes the collateral of a called loan and records its auction.
fn start(env: &Env, term: &Address, loan_id: &BytesN<32>) -> Result<Auction, Error> {
    if read_auction(env, term, loan_id).is_some() {
        return Err(Error::AuctionAlreadyStarted);
    }
    let mut auction = pending_auction(env, term, loan_id)?;
    if env.ledger().timestamp() < auction.start_time {
        return Err(Error::CallPeriodActive);
    }
    auction.collateral_amount = TermClient::new(env, term).seize(loan_id);
    write_auction(env, &auction);

    publish_start(
        env,
        AuctionStartEvent {
            term: term.clone(),
            loan_id: loan_id.clone(),
            collateral_amount: auction.collateral_amount,
            call_debt: auction.call_debt,
            start_time: auction.start_time,
        },
    );
    Ok(auction)
}

/// Running auction for the loan, starting it first if needed.
fn live_auction(env: &Env, term: &Address, loan_id: &BytesN<32>) -> Result<Auction, Error> {
    let auction = match read_auction(env, term, loan_id) {
        Some(auction) => auction,
        None => start(env, term, loan_id)?,
    };
    if auction.closed_at.is_some() {
        return Err(Error::AuctionNotActive);
    }
    Ok(auction)
}

fn elapsed(env: &Env, auction: &Auction) -> Result<u64, Error> {
    env.ledger()
        .timestamp()
        .checked_sub(auction.start_time)
        .ok_or(Error::CallPeriodActive)
}

#[contract]
pub struct AuctionEngine;

#[contractimpl]
impl AuctionEngine {
    pub fn init(
        env: Env,
        ledger: Address,
        credit_token: Address,
        params: AuctionParams,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Params) {
            return Err(Error::AlreadyInitialized);
        }
        math::validate_auction_params(&params)?;
        env.storage().instance().set(&DataKey::Ledger, &ledger);
        env.storage()
            .instance()
            .set(&DataKey::CreditToken, &credit_token);
        env.storage().instance().set(&DataKey::Params, &params);
        storage::extend_instance(&env);
        Ok(())
    }

    pub fn params(env: Env) -> Result<AuctionParams, Error> {
        read_params(&env)
    }

    pub fn get_auction(env: Env, term: Address, loan_id: BytesN<32>) -> Result<Auction, Error> {
        read_auction(&env, &term, &loan_id).ok_or(Error::AuctionNotActive)
    }

    /// What a bid would receive and pay right now. Works before the
    /// auction has been started.
    pub fn quote(env: Env, term: Address, loan_id: BytesN<32>) -> Result<AuctionQuote, Error> {
        let auction = match read_auction(&env, &term, &loan_id) {
            Some(auction) if auction.closed_at.is_some() => return Err(Error::AuctionNotActive),
            Some(auction) => auction,
            None => pending_auction(&env, &term, &loan_id)?,
        };
        math::auction_quote(
            &read_params(&env)?,
            elapsed(&env, &auction)?,
            auction.collateral_amount,
            auction.call_debt,
        )
    }

    /// Pulls the collateral of a called loan once its call period is over.
    /// Anyone may start an auction; `bid` starts it implicitly.
    ///
    /// # Errors
    /// * `UnknownTerm` – `term` is not registered with the ledger
    /// * `AuctionNotActive` – the loan has not been called
    /// * `AuctionAlreadyStarted` – the collateral is already here
    /// * `CallPeriodActive` – the call period has not elapsed yet
    pub fn start_auction(env: Env, term: Address, loan_id: BytesN<32>) -> Result<Auction, Error> {
        start(&env, &term, &loan_id)
    }

    /// Buys the auctioned collateral at the current schedule price.
    ///
    /// `bidder` pays the asked credit to the loan book and receives the
    /// offered collateral; any collateral not offered goes back to the
    /// borrower. Borrowers may bid on their own loans.
    ///
    /// # Errors
    /// * `AuctionNotActive` – loan not called, or auction already closed
    /// * `CallPeriodActive` – too early
    /// * `AuctionExpired` – too late, the auction must be forgiven
    /// * `InsufficientCreditBalance` – `bidder` cannot pay the asked credit
    pub fn bid(
        env: Env,
        bidder: Address,
        term: Address,
        loan_id: BytesN<32>,
    ) -> Result<AuctionQuote, Error> {
        bidder.require_auth();
        let mut auction = live_auction(&env, &term, &loan_id)?;
        let since_start = elapsed(&env, &auction)?;
        let quote = math::auction_quote(
            &read_params(&env)?,
            since_start,
            auction.collateral_amount,
            auction.call_debt,
        )?;

        let credit = token::Client::new(&env, &read_address(&env, &DataKey::CreditToken)?);
        if credit.balance(&bidder) < quote.credit_asked {
            return Err(Error::InsufficientCreditBalance);
        }
        if quote.credit_asked > 0 {
            credit.transfer(&bidder, &term, &quote.credit_asked);
        }

        let collateral = token::Client::new(&env, &auction.collateral_token);
        let this = env.current_contract_address();
        if quote.collateral_to_bidder > 0 {
            collateral.transfer(&this, &bidder, &quote.collateral_to_bidder);
        }
        if quote.collateral_to_borrower > 0 {
            collateral.transfer(&this, &auction.borrower, &quote.collateral_to_borrower);
        }

        TermClient::new(&env, &term).settle_from_auction(
            &loan_id,
            &quote.credit_asked,
            &quote.collateral_to_bidder,
            &Some(bidder.clone()),
        );

        let now = env.ledger().timestamp();
        auction.closed_at = Some(now);
        write_auction(&env, &auction);

        publish_bid(
            &env,
            AuctionBidEvent {
                term,
                loan_id,
                bidder,
                elapsed: since_start,
                credit_paid: quote.credit_asked,
                collateral_to_bidder: quote.collateral_to_bidder,
                collateral_to_borrower: quote.collateral_to_borrower,
                timestamp: now,
            },
        );
        Ok(quote)
    }

    /// Writes off an auction that ended without a bid and returns the loss
    /// reported through the loan book. Callable by anyone. The collateral
    /// stays with the engine.
    pub fn forgive(env: Env, term: Address, loan_id: BytesN<32>) -> Result<i128, Error> {
        let mut auction = live_auction(&env, &term, &loan_id)?;
        let params = read_params(&env)?;
        if elapsed(&env, &auction)? <= params.auction_duration {
            return Err(Error::AuctionNotExpired);
        }

        TermClient::new(&env, &term).settle_from_auction(&loan_id, &0, &0, &None);
        log!(&env, "auction expired without bid", auction.call_debt);

        let now = env.ledger().timestamp();
        auction.closed_at = Some(now);
        write_auction(&env, &auction);

        publish_forgive(
            &env,
            AuctionForgiveEvent {
                term,
                loan_id,
                loss: auction.call_debt,
                timestamp: now,
            },
        );
        Ok(auction.call_debt)
    }
}
