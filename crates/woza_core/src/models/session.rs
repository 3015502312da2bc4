use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Collector,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Collector => "collector",
            Role::Customer => "customer",
        }
    }

    pub fn allows(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Collector => matches!(
                permission,
                Permission::SubmitCollection | Permission::ViewOwnCollections
            ),
            Role::Customer => matches!(permission, Permission::ViewOwnCollections),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "collector" => Ok(Role::Collector),
            "customer" | "resident" => Ok(Role::Customer),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    ManageMaterials,
    SubmitCollection,
    ReviewCollections,
    ViewAllCollections,
    ViewOwnCollections,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Permission::ManageMaterials => "manage materials",
            Permission::SubmitCollection => "submit collections",
            Permission::ReviewCollections => "review collections",
            Permission::ViewAllCollections => "view all collections",
            Permission::ViewOwnCollections => "view own collections",
        };
        f.write_str(text)
    }
}

/// An authenticated user, passed explicitly into every service call.
///
/// Authentication happens upstream; this value only records who was
/// authenticated and with which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,

    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
}

impl Session {
    pub fn login(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            started_at: OffsetDateTime::now_utc(),
        }
    }

    /// Ends the session. Consuming `self` makes further use a compile error.
    pub fn logout(self) -> Uuid {
        self.user_id
    }

    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            Err(Error::Forbidden {
                role: self.role,
                permission,
            })
        }
    }

    /// Collectors and customers only see collections they are party to.
    pub fn can_view(&self, collector_id: Uuid, customer_id: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Collector => self.user_id == collector_id,
            Role::Customer => self.user_id == customer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.allows(Permission::ManageMaterials));
        assert!(Role::Collector.allows(Permission::SubmitCollection));
        assert!(!Role::Collector.allows(Permission::ReviewCollections));
        assert!(!Role::Customer.allows(Permission::SubmitCollection));
        assert!(Role::Customer.allows(Permission::ViewOwnCollections));
    }

    #[test]
    fn test_require_reports_role_and_permission() {
        let session = Session::login(Uuid::new_v4(), Role::Customer);
        let err = session.require(Permission::ManageMaterials).unwrap_err();
        assert_eq!(err.to_string(), "Role 'customer' is not permitted to manage materials");
    }

    #[test]
    fn test_visibility_is_scoped_by_role() {
        let collector = Uuid::new_v4();
        let customer = Uuid::new_v4();

        assert!(Session::login(collector, Role::Collector).can_view(collector, customer));
        assert!(!Session::login(customer, Role::Collector).can_view(collector, customer));
        assert!(Session::login(customer, Role::Customer).can_view(collector, customer));
        assert!(Session::login(Uuid::new_v4(), Role::Admin).can_view(collector, customer));
    }

    #[test]
    fn test_resident_alias_parses_as_customer() {
        assert_eq!("Resident".parse::<Role>().unwrap(), Role::Customer);
    }
}
