use auction_engine::{AuctionEngine, AuctionEngineClient};
use credit_ledger::{AccountingLedger, AccountingLedgerClient};
use credit_shared::{math::SCALAR, AuctionParams, LoanTermConfig};
use credit_token::{CreditToken, CreditTokenClient};
use loan_book::{LoanBook, LoanBookClient};
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{contract, contractimpl, token, Address, BytesN, Env, String};

pub const START: u64 = 1_700_000_000;
pub const MIN_BORROW: i128 = 100;
pub const MID_POINT: u64 = 600;
pub const AUCTION_DURATION: u64 = 1_800;

/// Gauge stand-in with a settable ceiling per loan book.
#[contract]
pub struct MockGauge;

#[contractimpl]
impl MockGauge {
    pub fn set_ceiling(env: Env, term: Address, ceiling: i128) {
        env.storage().instance().set(&(term, true), &ceiling);
    }

    pub fn debt_ceiling(env: Env, term: Address) -> i128 {
        env.storage()
            .instance()
            .get(&(term, true))
            .unwrap_or(i128::MAX)
    }

    pub fn notify_gauge_loss(env: Env, term: Address) {
        let count: u32 = env.storage().instance().get(&(term.clone(), false)).unwrap_or(0);
        env.storage().instance().set(&(term, false), &(count + 1));
    }

    pub fn losses(env: Env, term: Address) -> u32 {
        env.storage().instance().get(&(term, false)).unwrap_or(0)
    }
}

pub struct Protocol<'a> {
    pub env: &'a Env,
    pub governor: Address,
    /// Enabled credit minter used to fund bidders and holders.
    pub faucet: Address,
    pub credit: CreditTokenClient<'a>,
    pub ledger: AccountingLedgerClient<'a>,
    pub auction: AuctionEngineClient<'a>,
    pub book: LoanBookClient<'a>,
    pub collateral: token::Client<'a>,
    pub collateral_sac: token::StellarAssetClient<'a>,
}

/// 1,000 credit per collateral unit, 5% a year, 10% minimum partial
/// repayment, no fees, no call period.
pub fn default_config(collateral_token: &Address) -> LoanTermConfig {
    LoanTermConfig {
        collateral_token: collateral_token.clone(),
        max_debt_per_collateral_token: 1_000 * SCALAR,
        interest_rate: SCALAR / 20,
        max_partial_repay_delay: 0,
        min_partial_repay_percent: SCALAR / 10,
        opening_fee: 0,
        hard_cap: 1_000_000,
        call_fee: 0,
        call_period: 0,
    }
}

pub fn setup(env: &Env) -> Protocol<'_> {
    setup_with(env, |_| {})
}

pub fn setup_with(env: &Env, configure: impl FnOnce(&mut LoanTermConfig)) -> Protocol<'_> {
    env.mock_all_auths();
    env.ledger().set_timestamp(START);

    let governor = Address::generate(env);
    let faucet = Address::generate(env);

    let credit_id = env.register(CreditToken, ());
    let credit = CreditTokenClient::new(env, &credit_id);
    credit.init(
        &Address::generate(env),
        &7,
        &String::from_str(env, "Credit"),
        &String::from_str(env, "CREDIT"),
    );

    let ledger_id = env.register(AccountingLedger, ());
    let ledger = AccountingLedgerClient::new(env, &ledger_id);
    ledger.init(&governor, &credit_id, &MIN_BORROW);

    let auction_id = env.register(AuctionEngine, ());
    let auction = AuctionEngineClient::new(env, &auction_id);
    auction.init(
        &ledger_id,
        &credit_id,
        &AuctionParams {
            mid_point: MID_POINT,
            auction_duration: AUCTION_DURATION,
        },
    );

    let sac = env.register_stellar_asset_contract_v2(Address::generate(env));
    let collateral = token::Client::new(env, &sac.address());
    let collateral_sac = token::StellarAssetClient::new(env, &sac.address());

    let mut config = default_config(&sac.address());
    configure(&mut config);
    let book_id = env.register(LoanBook, ());
    let book = LoanBookClient::new(env, &book_id);
    book.init(&ledger_id, &credit_id, &auction_id, &config);

    ledger.register_term(&governor, &book_id);
    credit.set_minter(&book_id, &true);
    credit.set_minter(&faucet, &true);

    Protocol {
        env,
        governor,
        faucet,
        credit,
        ledger,
        auction,
        book,
        collateral,
        collateral_sac,
    }
}

impl Protocol<'_> {
    pub fn advance(&self, seconds: u64) {
        let now = self.env.ledger().timestamp();
        self.env.ledger().set_timestamp(now + seconds);
    }

    /// Mints `amount` credit to a fresh address.
    pub fn funded(&self, amount: i128) -> Address {
        let holder = Address::generate(self.env);
        self.fund(&holder, amount);
        holder
    }

    pub fn fund(&self, to: &Address, amount: i128) {
        self.credit.mint(&self.faucet, to, &amount);
    }

    /// A fresh borrower holding `collateral` units of the collateral token.
    pub fn borrower(&self, collateral: i128) -> Address {
        let borrower = Address::generate(self.env);
        self.collateral_sac.mint(&borrower, &collateral);
        borrower
    }

    /// Opens a loan for a fresh borrower; returns the borrower and loan id.
    pub fn open_loan(&self, borrow_amount: i128, collateral: i128) -> (Address, BytesN<32>) {
        let borrower = self.borrower(collateral);
        let loan_id = self.book.borrow(&borrower, &borrow_amount, &collateral);
        (borrower, loan_id)
    }

    /// Registers a gauge on the ledger with `ceiling` for the loan book.
    pub fn gauge(&self, ceiling: i128) -> MockGaugeClient<'_> {
        let gauge_id = self.env.register(MockGauge, ());
        let gauge = MockGaugeClient::new(self.env, &gauge_id);
        gauge.set_ceiling(&self.book.address, &ceiling);
        self.ledger.set_gauge(&self.governor, &Some(gauge_id));
        gauge
    }
}
