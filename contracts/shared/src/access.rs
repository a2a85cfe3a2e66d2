use soroban_sdk::{Address, Env};

use crate::{Error, LedgerClient, Role};

/// Requires `account`'s authorization and that the ledger grants it one of
/// `roles`. Returns the first matching role.
pub fn require_capability(
    env: &Env,
    ledger: &Address,
    account: &Address,
    roles: &[Role],
) -> Result<Role, Error> {
    account.require_auth();
    let ledger = LedgerClient::new(env, ledger);
    roles
        .iter()
        .copied()
        .find(|role| ledger.has_role(account, role))
        .ok_or(Error::Unauthorized)
}
