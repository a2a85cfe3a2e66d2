#![no_std]

//! CREDIT: the debt token minted by loan books and burned on repayment.
//!
//! Exposes the standard token entry points (so `token::Client` works against
//! it), a `total_supply` view used by the ledger's markdown, and minting
//! restricted to addresses the admin has enabled as minters.

pub mod events;
mod storage;

use credit_shared::Error;
use soroban_sdk::{contract, contractimpl, Address, Env, String};

use events::{
    publish_approve, publish_burn, publish_mint, publish_minter, publish_transfer, ApproveEvent,
    MinterEvent,
};

use storage::{
    read_allowance, read_balance, read_total_supply, require_admin, spend_allowance,
    write_allowance, write_balance, write_total_supply, DataKey, TokenMetadata,
};

fn check_nonnegative(amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

fn debit(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let balance = read_balance(env, from);
    if balance < amount {
        return Err(Error::InsufficientCreditBalance);
    }
    write_balance(env, from, balance - amount);
    Ok(())
}

fn credit(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    let balance = read_balance(env, to)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    write_balance(env, to, balance);
    Ok(())
}

fn shrink_supply(env: &Env, amount: i128) {
    let supply = read_total_supply(env);
    write_total_supply(env, supply - amount);
}

#[contract]
pub struct CreditToken;

#[contractimpl]
impl CreditToken {
    pub fn init(
        env: Env,
        admin: Address,
        decimals: u32,
        name: String,
        symbol: String,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(
            &DataKey::Metadata,
            &TokenMetadata {
                decimals,
                name,
                symbol,
            },
        );
        write_total_supply(&env, 0);
        Ok(())
    }

    /// Enable or disable `minter` (admin only). Loan books are the minters.
    pub fn set_minter(env: Env, minter: Address, enabled: bool) -> Result<(), Error> {
        require_admin(&env)?.require_auth();
        env.storage()
            .persistent()
            .set(&DataKey::Minter(minter.clone()), &enabled);
        publish_minter(&env, MinterEvent { minter, enabled });
        Ok(())
    }

    pub fn is_minter(env: Env, minter: Address) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::Minter(minter))
            .unwrap_or(false)
    }

    pub fn mint(env: Env, minter: Address, to: Address, amount: i128) -> Result<(), Error> {
        minter.require_auth();
        check_nonnegative(amount)?;
        if !Self::is_minter(env.clone(), minter.clone()) {
            return Err(Error::Unauthorized);
        }
        credit(&env, &to, amount)?;
        let supply = read_total_supply(&env)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        write_total_supply(&env, supply);
        publish_mint(&env, minter, to, amount);
        Ok(())
    }

    pub fn total_supply(env: Env) -> i128 {
        read_total_supply(&env)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        read_allowance(&env, &from, &spender).amount
    }

    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        from.require_auth();
        check_nonnegative(amount)?;
        write_allowance(&env, &from, &spender, amount, expiration_ledger)?;
        publish_approve(
            &env,
            from,
            spender,
            ApproveEvent {
                amount,
                expiration_ledger,
            },
        );
        Ok(())
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        read_balance(&env, &id)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        check_nonnegative(amount)?;
        debit(&env, &from, amount)?;
        credit(&env, &to, amount)?;
        publish_transfer(&env, from, to, amount);
        Ok(())
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        check_nonnegative(amount)?;
        spend_allowance(&env, &from, &spender, amount)?;
        debit(&env, &from, amount)?;
        credit(&env, &to, amount)?;
        publish_transfer(&env, from, to, amount);
        Ok(())
    }

    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        check_nonnegative(amount)?;
        debit(&env, &from, amount)?;
        shrink_supply(&env, amount);
        publish_burn(&env, from, amount);
        Ok(())
    }

    pub fn burn_from(env: Env, spender: Address, from: Address, amount: i128) -> Result<(), Error> {
        spender.require_auth();
        check_nonnegative(amount)?;
        spend_allowance(&env, &from, &spender, amount)?;
        debit(&env, &from, amount)?;
        shrink_supply(&env, amount);
        publish_burn(&env, from, amount);
        Ok(())
    }

    pub fn decimals(env: Env) -> Result<u32, Error> {
        Ok(storage::read_metadata(&env)?.decimals)
    }

    pub fn name(env: Env) -> Result<String, Error> {
        Ok(storage::read_metadata(&env)?.name)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        Ok(storage::read_metadata(&env)?.symbol)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::testutils::{Address as _, Events as _, Ledger as _};
    use soroban_sdk::{symbol_short, Symbol, TryFromVal, TryIntoVal};

    fn setup(env: &Env) -> (CreditTokenClient<'_>, Address, Address) {
        let admin = Address::generate(env);
        let minter = Address::generate(env);
        let id = env.register(CreditToken, ());
        let client = CreditTokenClient::new(env, &id);
        client.init(
            &admin,
            &7,
            &String::from_str(env, "Credit"),
            &String::from_str(env, "CREDIT"),
        );
        client.set_minter(&minter, &true);
        (client, admin, minter)
    }

    #[test]
    fn test_mint_increases_balance_and_supply() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        client.mint(&minter, &holder, &1_000);
        assert_eq!(client.balance(&holder), 1_000);
        assert_eq!(client.total_supply(), 1_000);
    }

    #[test]
    fn test_mint_requires_enabled_minter() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let stranger = Address::generate(&env);
        let holder = Address::generate(&env);
        assert_eq!(
            client.try_mint(&stranger, &holder, &1),
            Err(Ok(Error::Unauthorized))
        );
        client.set_minter(&minter, &false);
        assert_eq!(
            client.try_mint(&minter, &holder, &1),
            Err(Ok(Error::Unauthorized))
        );
    }

    #[test]
    fn test_set_minter_emits_event() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        client.set_minter(&minter, &false);

        let events = env.events().all();
        let (_contract, topics, data) = events.last().unwrap();
        assert_eq!(
            Symbol::try_from_val(&env, &topics.get(1).unwrap()).unwrap(),
            symbol_short!("minter")
        );
        let event: MinterEvent = data.try_into_val(&env).unwrap();
        assert_eq!(event.minter, minter);
        assert!(!event.enabled);
    }

    #[test]
    fn test_transfer_emits_standard_event() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        let other = Address::generate(&env);
        client.mint(&minter, &holder, &100);
        client.transfer(&holder, &other, &40);

        let events = env.events().all();
        let (_contract, topics, data) = events.last().unwrap();
        assert_eq!(
            Symbol::try_from_val(&env, &topics.get(0).unwrap()).unwrap(),
            symbol_short!("transfer")
        );
        assert_eq!(
            Address::try_from_val(&env, &topics.get(2).unwrap()).unwrap(),
            other
        );
        let amount: i128 = data.try_into_val(&env).unwrap();
        assert_eq!(amount, 40);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        client.mint(&minter, &holder, &1_000);
        client.burn(&holder, &400);
        assert_eq!(client.balance(&holder), 600);
        assert_eq!(client.total_supply(), 600);
    }

    #[test]
    fn test_transfer_over_balance_fails() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        let other = Address::generate(&env);
        client.mint(&minter, &holder, &100);
        assert_eq!(
            client.try_transfer(&holder, &other, &101),
            Err(Ok(Error::InsufficientCreditBalance))
        );
        client.transfer(&holder, &other, &100);
        assert_eq!(client.balance(&other), 100);
        assert_eq!(client.total_supply(), 100);
    }

    #[test]
    fn test_burn_from_spends_allowance() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        let spender = Address::generate(&env);
        client.mint(&minter, &holder, &500);
        client.approve(&holder, &spender, &300, &1_000);
        client.burn_from(&spender, &holder, &200);
        assert_eq!(client.allowance(&holder, &spender), 100);
        assert_eq!(client.balance(&holder), 300);
        assert_eq!(
            client.try_burn_from(&spender, &holder, &101),
            Err(Ok(Error::InsufficientAllowance))
        );
    }

    #[test]
    fn test_expired_allowance_reads_as_zero() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _admin, minter) = setup(&env);
        let holder = Address::generate(&env);
        let spender = Address::generate(&env);
        client.mint(&minter, &holder, &500);
        client.approve(&holder, &spender, &300, &100);
        env.ledger().set_sequence_number(101);
        assert_eq!(client.allowance(&holder, &spender), 0);
    }

    #[test]
    fn test_init_twice_fails() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, admin, _minter) = setup(&env);
        assert_eq!(
            client.try_init(
                &admin,
                &7,
                &String::from_str(&env, "Credit"),
                &String::from_str(&env, "CREDIT"),
            ),
            Err(Ok(Error::AlreadyInitialized))
        );
    }
}
