//! Account model - the pre-authenticated caller of every decision.

use serde::{Deserialize, Serialize};

use super::{AccountId, CustomerId};
use crate::services::AclError;

/// An authenticated account.
///
/// Accounts are owned by the authentication subsystem; only the fields that
/// take part in authorization decisions are carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unrestricted access to every system and deployment.
    pub root: bool,
    /// The organization the account belongs to.
    pub customer: CustomerId,
}

impl Account {
    /// Create a regular (non-root) account.
    pub fn new(id: i64, customer: i64) -> Self {
        Self {
            id: AccountId(id),
            root: false,
            customer: CustomerId(customer),
        }
    }

    /// Create a root account.
    pub fn root(id: i64, customer: i64) -> Self {
        Self {
            root: true,
            ..Self::new(id, customer)
        }
    }

    /// Check that the account carries a usable identity.
    ///
    /// Account ids are database serials, so anything below 1 means the
    /// caller handed over an account that was never persisted.
    pub fn validate(&self) -> Result<(), AclError> {
        if self.id.0 <= 0 {
            return Err(AclError::InvalidAccount(format!(
                "account id must be positive (got {})",
                self.id
            )));
        }
        Ok(())
    }
}
