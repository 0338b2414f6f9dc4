//! # Tenants and Principals
//!
//! Every request carries an explicit [`Principal`]; nothing reads the caller
//! from ambient state. A worker's username doubles as their [`TenantId`].
//!
//! ## Access Rules
//! ```text
//! ┌──────────────┬───────────────────────┬────────────────────────────┐
//! │ Principal    │ Catalog of tenant T   │ Sell / return              │
//! ├──────────────┼───────────────────────┼────────────────────────────┤
//! │ admin        │ any T                 │ no (owns no ledger)        │
//! │ worker W     │ only T == W           │ own tenant only            │
//! └──────────────┴───────────────────────┴────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Role;

/// Identifies one tenant's catalog and ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(username: impl Into<String>) -> Self {
        TenantId(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated caller of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Principal {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The tenant this principal sells from, if any.
    ///
    /// Admins own no ledger.
    pub fn own_tenant(&self) -> Option<TenantId> {
        match self.role {
            Role::Worker => Some(TenantId::new(self.username.clone())),
            Role::Admin => None,
        }
    }

    /// Whether this principal may read or edit `tenant`'s catalog.
    pub fn can_manage(&self, tenant: &TenantId) -> bool {
        self.is_admin() || self.username == tenant.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_manages_only_own_tenant() {
        let anna = Principal::new("anna", Role::Worker);
        assert!(anna.can_manage(&TenantId::new("anna")));
        assert!(!anna.can_manage(&TenantId::new("boris")));
        assert_eq!(anna.own_tenant(), Some(TenantId::new("anna")));
    }

    #[test]
    fn test_admin_manages_everyone_but_owns_nothing() {
        let admin = Principal::new("admin", Role::Admin);
        assert!(admin.can_manage(&TenantId::new("anna")));
        assert!(admin.can_manage(&TenantId::new("boris")));
        assert_eq!(admin.own_tenant(), None);
    }
}
