use credit_shared::{math::SCALAR, Error, ProfitSharingConfig, Role};
use soroban_sdk::{contracttype, Address, Env};

const INSTANCE_LIFETIME_THRESHOLD: u32 = 100_800;
const INSTANCE_BUMP_AMOUNT: u32 = 518_400;
const ENTRY_LIFETIME_THRESHOLD: u32 = 518_400;
const ENTRY_BUMP_AMOUNT: u32 = 3_110_400;

#[contracttype]
#[derive(Clone)]
pub struct RoleKey {
    pub account: Address,
    pub role: Role,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    CreditToken,
    CreditMultiplier,
    SurplusBuffer,
    MinBorrow,
    ProfitSharing,
    Gauge,
    TotalIssuance,
    Term(Address),
    Issuance(Address),
    Role(RoleKey),
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn read_credit_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::CreditToken)
        .ok_or(Error::NotInitialized)
}

pub fn read_i128(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

pub fn write_i128(env: &Env, key: &DataKey, value: i128) {
    env.storage().instance().set(key, &value);
}

pub fn read_multiplier(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::CreditMultiplier)
        .unwrap_or(SCALAR)
}

/// Everything goes to the surplus buffer until governance sets a split.
pub fn read_profit_sharing(env: &Env) -> ProfitSharingConfig {
    env.storage()
        .instance()
        .get(&DataKey::ProfitSharing)
        .unwrap_or(ProfitSharingConfig {
            surplus_buffer_split: SCALAR,
            credit_split: 0,
            guild_split: 0,
            other_split: 0,
            credit_recipient: None,
            guild_recipient: None,
            other_recipient: None,
        })
}

pub fn read_flag(env: &Env, key: &DataKey) -> bool {
    let value: Option<bool> = env.storage().persistent().get(key);
    if value.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(key, ENTRY_LIFETIME_THRESHOLD, ENTRY_BUMP_AMOUNT);
    }
    value.unwrap_or(false)
}

pub fn write_flag(env: &Env, key: &DataKey, value: bool) {
    if value {
        env.storage().persistent().set(key, &true);
        env.storage()
            .persistent()
            .extend_ttl(key, ENTRY_LIFETIME_THRESHOLD, ENTRY_BUMP_AMOUNT);
    } else {
        env.storage().persistent().remove(key);
    }
}

pub fn read_issuance(env: &Env, term: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Issuance(term.clone()))
        .unwrap_or(0)
}

pub fn write_issuance(env: &Env, term: &Address, value: i128) {
    let key = DataKey::Issuance(term.clone());
    env.storage().persistent().set(&key, &value);
    env.storage()
        .persistent()
        .extend_ttl(&key, ENTRY_LIFETIME_THRESHOLD, ENTRY_BUMP_AMOUNT);
}

pub fn role_key(account: &Address, role: Role) -> DataKey {
    DataKey::Role(RoleKey {
        account: account.clone(),
        role,
    })
}
