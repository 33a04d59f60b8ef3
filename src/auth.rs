//! Owner capability checked at the boundary before the reclaim core runs.

use crate::{
    chain::AccountName,
    error::{ReclaimError, Result},
};

/// Proof that the caller acts as the contract account.
///
/// Only [`Authority::require_auth`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerAuth {
    account: AccountName,
}

impl OwnerAuth {
    pub fn account(&self) -> &AccountName {
        &self.account
    }
}

/// Grants [`OwnerAuth`] to callers acting as the contract account
#[derive(Debug, Clone)]
pub struct Authority {
    contract: AccountName,
}

impl Authority {
    pub fn new(contract: AccountName) -> Self {
        Self { contract }
    }

    pub fn require_auth(&self, actor: &AccountName) -> Result<OwnerAuth> {
        if actor != &self.contract {
            return Err(ReclaimError::MissingAuthority(self.contract.clone()));
        }
        Ok(OwnerAuth {
            account: self.contract.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contract_account_is_authorized() {
        let authority = Authority::new("reclaimer".parse().unwrap());

        let auth = authority.require_auth(&"reclaimer".parse().unwrap()).unwrap();
        assert_eq!(auth.account().as_str(), "reclaimer");

        let err = authority.require_auth(&"mallory".parse().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "missing authority of reclaimer");
    }
}
