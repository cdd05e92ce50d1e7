//! Role rules deciding what an authenticated principal may do.
//!
//! The policy is a pure function of `(principal, operation)`: it never
//! consults storage, so callers resolve whatever facts a rule needs (for
//! example whether a delete target is an admin) before asking.

use crate::error::PolicyDenied;
use crate::types::Principal;

/// Every operation reachable behind authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    ListUsers,
    UpdateUser { target_id: i64 },
    DeleteUser { target_is_admin: bool },
    GetSettings,
    ListTimezones,
    UpdateSettings,
    ListTransactions,
    GetTransaction,
    CreateTransaction { user_id: i64 },
    ReadPhoto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// When set, non-admins may only record transactions for themselves.
    /// Off by default: any authenticated caller may stamp for any user.
    pub enforce_transaction_ownership: bool,
}

impl AccessPolicy {
    pub fn new(enforce_transaction_ownership: bool) -> Self {
        Self {
            enforce_transaction_ownership,
        }
    }

    pub fn authorize(&self, principal: &Principal, op: Operation) -> Result<(), PolicyDenied> {
        match op {
            Operation::ListUsers
            | Operation::GetSettings
            | Operation::ListTimezones
            | Operation::ListTransactions
            | Operation::GetTransaction
            | Operation::ReadPhoto => Ok(()),

            Operation::CreateUser | Operation::UpdateSettings => require_admin(principal),

            Operation::UpdateUser { target_id } => {
                if principal.id == target_id || principal.is_admin {
                    Ok(())
                } else {
                    Err(PolicyDenied::NotSelf)
                }
            }

            // Admin accounts are undeletable no matter who asks.
            Operation::DeleteUser { target_is_admin } => {
                require_admin(principal)?;
                if target_is_admin {
                    Err(PolicyDenied::AdminUndeletable)
                } else {
                    Ok(())
                }
            }

            Operation::CreateTransaction { user_id } => {
                if !self.enforce_transaction_ownership
                    || principal.is_admin
                    || principal.id == user_id
                {
                    Ok(())
                } else {
                    Err(PolicyDenied::NotOwner)
                }
            }
        }
    }
}

fn require_admin(principal: &Principal) -> Result<(), PolicyDenied> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(PolicyDenied::AdminRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal {
            id: 1,
            username: "admin".into(),
            is_admin: true,
        }
    }

    fn worker(id: i64) -> Principal {
        Principal {
            id,
            username: format!("worker{id}"),
            is_admin: false,
        }
    }

    #[test]
    fn test_open_operations_allow_everyone() {
        let policy = AccessPolicy::default();
        for op in [
            Operation::ListUsers,
            Operation::GetSettings,
            Operation::ListTimezones,
            Operation::ListTransactions,
            Operation::GetTransaction,
            Operation::ReadPhoto,
            Operation::CreateTransaction { user_id: 99 },
        ] {
            assert_eq!(policy.authorize(&worker(2), op), Ok(()));
            assert_eq!(policy.authorize(&admin(), op), Ok(()));
        }
    }

    #[test]
    fn test_admin_only_operations() {
        let policy = AccessPolicy::default();
        for op in [Operation::CreateUser, Operation::UpdateSettings] {
            assert_eq!(policy.authorize(&admin(), op), Ok(()));
            assert_eq!(
                policy.authorize(&worker(2), op),
                Err(PolicyDenied::AdminRequired)
            );
        }
    }

    #[test]
    fn test_update_user_self_or_admin() {
        let policy = AccessPolicy::default();
        let op = Operation::UpdateUser { target_id: 2 };
        assert_eq!(policy.authorize(&worker(2), op), Ok(()));
        assert_eq!(policy.authorize(&admin(), op), Ok(()));
        assert_eq!(policy.authorize(&worker(3), op), Err(PolicyDenied::NotSelf));
    }

    #[test]
    fn test_delete_admin_always_denied() {
        let policy = AccessPolicy::default();
        let op = Operation::DeleteUser {
            target_is_admin: true,
        };
        assert_eq!(
            policy.authorize(&admin(), op),
            Err(PolicyDenied::AdminUndeletable)
        );
        assert!(policy.authorize(&worker(2), op).is_err());
    }

    #[test]
    fn test_delete_regular_user_requires_admin() {
        let policy = AccessPolicy::default();
        let op = Operation::DeleteUser {
            target_is_admin: false,
        };
        assert_eq!(policy.authorize(&admin(), op), Ok(()));
        assert_eq!(
            policy.authorize(&worker(2), op),
            Err(PolicyDenied::AdminRequired)
        );
    }

    #[test]
    fn test_transaction_ownership_when_enforced() {
        let policy = AccessPolicy::new(true);
        assert_eq!(
            policy.authorize(&worker(2), Operation::CreateTransaction { user_id: 2 }),
            Ok(())
        );
        assert_eq!(
            policy.authorize(&worker(2), Operation::CreateTransaction { user_id: 3 }),
            Err(PolicyDenied::NotOwner)
        );
        assert_eq!(
            policy.authorize(&admin(), Operation::CreateTransaction { user_id: 3 }),
            Ok(())
        );
    }

    #[test]
    fn test_authorize_is_deterministic() {
        let policy = AccessPolicy::default();
        let op = Operation::UpdateUser { target_id: 5 };
        let first = policy.authorize(&worker(4), op);
        for _ in 0..10 {
            assert_eq!(policy.authorize(&worker(4), op), first);
        }
    }
}
