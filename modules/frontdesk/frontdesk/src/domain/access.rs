//! Tenant access control.
//!
//! [`AccessPolicy::authorized_tenants`] is the single source of truth for
//! tenant authorization. Every other check in the module is a containment
//! test against its result; nothing re-derives "allowed tenants" ad hoc.

use std::collections::BTreeSet;

use frontdesk_sdk::Principal;
use uuid::Uuid;

/// The set of tenants a principal may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Privileged principals: every tenant, including tenants created after
    /// the scope was computed.
    All,
    /// Explicitly granted tenants. Empty for unauthenticated principals.
    Only(BTreeSet<Uuid>),
}

impl TenantScope {
    #[must_use]
    pub fn permits(&self, tenant_id: Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&tenant_id),
        }
    }

    /// The single granted tenant, when the scope holds exactly one.
    /// Used for UX pre-selection; never for authorization.
    #[must_use]
    pub fn sole_tenant(&self) -> Option<Uuid> {
        match self {
            Self::All => None,
            Self::Only(ids) => {
                if ids.len() == 1 {
                    ids.iter().next().copied()
                } else {
                    None
                }
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Only(ids) => ids.is_empty(),
        }
    }
}

/// Injectable tenant authorization policy.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the tenant scope for a principal.
    ///
    /// Pure function of the principal's state at call time: grants can
    /// change between calls and nothing is cached across requests.
    #[must_use]
    pub fn authorized_tenants(&self, principal: &Principal) -> TenantScope {
        if !principal.authenticated {
            return TenantScope::Only(BTreeSet::new());
        }
        if principal.privileged {
            return TenantScope::All;
        }
        TenantScope::Only(principal.granted_tenants.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(privileged: bool, grants: &[Uuid]) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            authenticated: true,
            privileged,
            granted_tenants: grants.iter().copied().collect(),
        }
    }

    #[test]
    fn unauthenticated_gets_empty_scope() {
        let policy = AccessPolicy::new();
        let scope = policy.authorized_tenants(&Principal::anonymous());
        assert!(scope.is_empty());
        assert!(!scope.permits(Uuid::new_v4()));
    }

    #[test]
    fn privileged_permits_tenants_created_later() {
        let policy = AccessPolicy::new();
        let scope = policy.authorized_tenants(&principal(true, &[]));
        // A tenant id that did not exist when the scope was computed.
        assert!(scope.permits(Uuid::new_v4()));
        assert_eq!(scope.sole_tenant(), None);
    }

    #[test]
    fn scoped_principal_limited_to_grants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let policy = AccessPolicy::new();
        let scope = policy.authorized_tenants(&principal(false, &[a]));
        assert!(scope.permits(a));
        assert!(!scope.permits(b));
        assert_eq!(scope.sole_tenant(), Some(a));
    }

    #[test]
    fn sole_tenant_requires_exactly_one_grant() {
        let policy = AccessPolicy::new();
        let scope = policy.authorized_tenants(&principal(false, &[Uuid::new_v4(), Uuid::new_v4()]));
        assert_eq!(scope.sole_tenant(), None);
    }
}
