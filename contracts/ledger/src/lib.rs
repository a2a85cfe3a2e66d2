#![no_std]

//! Accounting ledger: the credit multiplier, the surplus buffer, the profit
//! split, per-term issuance counters and the protocol role registry.
//!
//! All global counters are mutated here and only here. Loan books report
//! profit and loss through `notify_profit` / `notify_loss`, and only loan
//! books registered by governance may do so.

mod events;
mod storage;

#[cfg(test)]
mod test;

use soroban_sdk::{contract, contractimpl, log, token, Address, Env};

use credit_shared::{
    math::{self, SCALAR},
    Error, GaugeClient, MintableClient, ProfitSharingConfig, Role,
};
use events::{
    publish_loss, publish_multiplier, publish_profit, publish_role, publish_surplus, publish_term,
    LossEvent, MultiplierEvent, ProfitEvent, RoleEvent, SurplusEvent, TermEvent,
};
use storage::{
    extend_instance, read_credit_token, read_flag, read_i128, read_issuance, read_multiplier,
    read_profit_sharing, role_key, write_flag, write_i128, write_issuance, DataKey,
};

fn require_role(env: &Env, account: &Address, role: Role) -> Result<(), Error> {
    account.require_auth();
    if !read_flag(env, &role_key(account, role)) {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

fn require_term(env: &Env, term: &Address) -> Result<(), Error> {
    term.require_auth();
    if !read_flag(env, &DataKey::Term(term.clone())) {
        return Err(Error::UnknownTerm);
    }
    Ok(())
}

fn check_positive(amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

fn validate_profit_sharing(config: &ProfitSharingConfig) -> Result<(), Error> {
    let splits = [
        config.surplus_buffer_split,
        config.credit_split,
        config.guild_split,
        config.other_split,
    ];
    if splits.iter().any(|split| *split < 0) {
        return Err(Error::InvalidConfig);
    }
    let total = splits
        .iter()
        .try_fold(0i128, |acc, split| acc.checked_add(*split))
        .ok_or(Error::Overflow)?;
    if total != SCALAR {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

#[contract]
pub struct AccountingLedger;

#[contractimpl]
impl AccountingLedger {
    /// Initialize with the first governor, the credit token and the minimum
    /// borrow size expressed at multiplier 1.0.
    pub fn init(
        env: Env,
        governor: Address,
        credit_token: Address,
        min_borrow: i128,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::CreditToken) {
            return Err(Error::AlreadyInitialized);
        }
        if min_borrow < 0 {
            return Err(Error::InvalidConfig);
        }
        env.storage()
            .instance()
            .set(&DataKey::CreditToken, &credit_token);
        write_i128(&env, &DataKey::CreditMultiplier, SCALAR);
        write_i128(&env, &DataKey::SurplusBuffer, 0);
        write_i128(&env, &DataKey::MinBorrow, min_borrow);
        write_i128(&env, &DataKey::TotalIssuance, 0);
        write_flag(&env, &role_key(&governor, Role::Governor), true);
        extend_instance(&env);
        publish_role(
            &env,
            RoleEvent {
                account: governor,
                role: Role::Governor,
                granted: true,
            },
        );
        Ok(())
    }

    // ── roles ────────────────────────────────────────────────────────────────

    pub fn grant_role(
        env: Env,
        governor: Address,
        account: Address,
        role: Role,
    ) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        write_flag(&env, &role_key(&account, role), true);
        publish_role(
            &env,
            RoleEvent {
                account,
                role,
                granted: true,
            },
        );
        Ok(())
    }

    pub fn revoke_role(
        env: Env,
        governor: Address,
        account: Address,
        role: Role,
    ) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        write_flag(&env, &role_key(&account, role), false);
        publish_role(
            &env,
            RoleEvent {
                account,
                role,
                granted: false,
            },
        );
        Ok(())
    }

    pub fn has_role(env: Env, account: Address, role: Role) -> bool {
        read_flag(&env, &role_key(&account, role))
    }

    // ── configuration ────────────────────────────────────────────────────────

    /// Allow `term` to mutate issuance and report profit and loss.
    pub fn register_term(env: Env, governor: Address, term: Address) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        write_flag(&env, &DataKey::Term(term.clone()), true);
        publish_term(
            &env,
            TermEvent {
                term,
                registered: true,
            },
        );
        Ok(())
    }

    pub fn is_term(env: Env, term: Address) -> bool {
        read_flag(&env, &DataKey::Term(term))
    }

    pub fn set_gauge(env: Env, governor: Address, gauge: Option<Address>) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        match gauge {
            Some(gauge) => env.storage().instance().set(&DataKey::Gauge, &gauge),
            None => env.storage().instance().remove(&DataKey::Gauge),
        }
        extend_instance(&env);
        Ok(())
    }

    pub fn gauge(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Gauge)
    }

    pub fn set_min_borrow(env: Env, governor: Address, min_borrow: i128) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        if min_borrow < 0 {
            return Err(Error::InvalidConfig);
        }
        write_i128(&env, &DataKey::MinBorrow, min_borrow);
        Ok(())
    }

    /// Minimum principal in today's credit units. Grows as the multiplier
    /// falls so the real-terms minimum stays constant.
    pub fn min_borrow(env: Env) -> Result<i128, Error> {
        math::mul_div(
            read_i128(&env, &DataKey::MinBorrow),
            SCALAR,
            read_multiplier(&env),
        )
    }

    pub fn set_profit_sharing_config(
        env: Env,
        governor: Address,
        config: ProfitSharingConfig,
    ) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        validate_profit_sharing(&config)?;
        env.storage()
            .instance()
            .set(&DataKey::ProfitSharing, &config);
        extend_instance(&env);
        Ok(())
    }

    pub fn profit_sharing_config(env: Env) -> ProfitSharingConfig {
        read_profit_sharing(&env)
    }

    // ── views ────────────────────────────────────────────────────────────────

    pub fn credit_token(env: Env) -> Result<Address, Error> {
        read_credit_token(&env)
    }

    pub fn credit_multiplier(env: Env) -> i128 {
        read_multiplier(&env)
    }

    pub fn surplus_buffer(env: Env) -> i128 {
        read_i128(&env, &DataKey::SurplusBuffer)
    }

    pub fn issuance(env: Env, term: Address) -> i128 {
        read_issuance(&env, &term)
    }

    pub fn total_issuance(env: Env) -> i128 {
        read_i128(&env, &DataKey::TotalIssuance)
    }

    // ── issuance ─────────────────────────────────────────────────────────────

    pub fn increase_issuance(env: Env, term: Address, amount: i128) -> Result<i128, Error> {
        require_term(&env, &term)?;
        check_positive(amount)?;
        let issuance = read_issuance(&env, &term)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let total = read_i128(&env, &DataKey::TotalIssuance)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        write_issuance(&env, &term, issuance);
        write_i128(&env, &DataKey::TotalIssuance, total);
        extend_instance(&env);
        Ok(issuance)
    }

    pub fn decrease_issuance(env: Env, term: Address, amount: i128) -> Result<i128, Error> {
        require_term(&env, &term)?;
        check_positive(amount)?;
        let issuance = read_issuance(&env, &term);
        if amount > issuance {
            return Err(Error::InvalidAmount);
        }
        let total = read_i128(&env, &DataKey::TotalIssuance) - amount;
        write_issuance(&env, &term, issuance - amount);
        write_i128(&env, &DataKey::TotalIssuance, total);
        extend_instance(&env);
        Ok(issuance - amount)
    }

    // ── profit and loss ──────────────────────────────────────────────────────

    /// Route `amount` credit, already transferred to the ledger by `term`,
    /// according to the profit split.
    pub fn notify_profit(env: Env, term: Address, amount: i128) -> Result<(), Error> {
        require_term(&env, &term)?;
        check_positive(amount)?;

        let config = read_profit_sharing(&env);
        let credit = token::Client::new(&env, &read_credit_token(&env)?);
        let this = env.current_contract_address();

        let to_credit_holders = math::mul_div(amount, config.credit_split, SCALAR)?;
        let to_guild = math::mul_div(amount, config.guild_split, SCALAR)?;
        let to_other = math::mul_div(amount, config.other_split, SCALAR)?;
        let mut to_surplus_buffer = amount - to_credit_holders - to_guild - to_other;

        for (share, recipient) in [
            (to_credit_holders, &config.credit_recipient),
            (to_guild, &config.guild_recipient),
            (to_other, &config.other_recipient),
        ] {
            if share == 0 {
                continue;
            }
            match recipient {
                Some(recipient) => credit.transfer(&this, recipient, &share),
                None => to_surplus_buffer += share,
            }
        }

        let buffer = read_i128(&env, &DataKey::SurplusBuffer)
            .checked_add(to_surplus_buffer)
            .ok_or(Error::Overflow)?;
        write_i128(&env, &DataKey::SurplusBuffer, buffer);
        extend_instance(&env);

        publish_profit(
            &env,
            ProfitEvent {
                term,
                amount,
                to_surplus_buffer,
                to_credit_holders,
                to_guild,
                to_other,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    /// Absorb a loss reported by `term`: the surplus buffer takes it first,
    /// any remainder marks the credit multiplier down across the whole supply.
    pub fn notify_loss(env: Env, term: Address, amount: i128) -> Result<(), Error> {
        require_term(&env, &term)?;
        check_positive(amount)?;

        let credit_token = read_credit_token(&env)?;
        let buffer = read_i128(&env, &DataKey::SurplusBuffer);
        let absorbed = amount.min(buffer);
        if absorbed > 0 {
            token::Client::new(&env, &credit_token).burn(&env.current_contract_address(), &absorbed);
            write_i128(&env, &DataKey::SurplusBuffer, buffer - absorbed);
        }

        let marked_down = amount - absorbed;
        let previous = read_multiplier(&env);
        let mut current = previous;
        if marked_down > 0 {
            let supply = MintableClient::new(&env, &credit_token).total_supply();
            current = math::marked_down_multiplier(previous, supply, marked_down)?;
            write_i128(&env, &DataKey::CreditMultiplier, current);
            log!(
                &env,
                "credit multiplier marked down",
                previous,
                current,
                marked_down
            );
            publish_multiplier(
                &env,
                MultiplierEvent {
                    previous,
                    current,
                    timestamp: env.ledger().timestamp(),
                },
            );
        }
        extend_instance(&env);

        if let Some(gauge) = Self::gauge(env.clone()) {
            GaugeClient::new(&env, &gauge).notify_gauge_loss(&term);
        }

        publish_loss(
            &env,
            LossEvent {
                term,
                amount,
                absorbed,
                marked_down,
                credit_multiplier: current,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    // ── surplus buffer ───────────────────────────────────────────────────────

    pub fn donate_to_surplus_buffer(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        check_positive(amount)?;
        token::Client::new(&env, &read_credit_token(&env)?).transfer(
            &from,
            &env.current_contract_address(),
            &amount,
        );
        let buffer = read_i128(&env, &DataKey::SurplusBuffer)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        write_i128(&env, &DataKey::SurplusBuffer, buffer);
        extend_instance(&env);
        publish_surplus(
            &env,
            SurplusEvent {
                account: from,
                delta: amount,
                surplus_buffer: buffer,
            },
        );
        Ok(())
    }

    pub fn withdraw_from_surplus_buffer(
        env: Env,
        governor: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        require_role(&env, &governor, Role::Governor)?;
        check_positive(amount)?;
        let buffer = read_i128(&env, &DataKey::SurplusBuffer);
        if amount > buffer {
            return Err(Error::InsufficientCreditBalance);
        }
        write_i128(&env, &DataKey::SurplusBuffer, buffer - amount);
        token::Client::new(&env, &read_credit_token(&env)?).transfer(
            &env.current_contract_address(),
            &to,
            &amount,
        );
        publish_surplus(
            &env,
            SurplusEvent {
                account: to,
                delta: -amount,
                surplus_buffer: buffer - amount,
            },
        );
        Ok(())
    }
}
