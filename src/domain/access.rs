//! Roles and the gate that grants them.
//!
//! Catalog management and order handling are plain operations on the
//! catalog and order aggregates; who may call them is decided here, once,
//! by the role a presented secret maps to.

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Customer,
    Staff,
    Administrator,
}

impl Role {
    pub fn can_manage_catalog(&self) -> bool { matches!(self, Self::Administrator) }
    pub fn can_advance_orders(&self) -> bool { matches!(self, Self::Staff | Self::Administrator) }
}

/// Maps shared secrets to elevated roles.
#[derive(Clone, Debug)]
pub struct Gate {
    admin_secret: String,
    staff_secret: String,
}

impl Gate {
    pub fn new(admin_secret: impl Into<String>, staff_secret: impl Into<String>) -> Self {
        Self { admin_secret: admin_secret.into(), staff_secret: staff_secret.into() }
    }

    pub fn authenticate(&self, secret: &str) -> Result<Role, AccessError> {
        if !self.admin_secret.is_empty() && secret == self.admin_secret { return Ok(Role::Administrator); }
        if !self.staff_secret.is_empty() && secret == self.staff_secret { return Ok(Role::Staff); }
        Err(AccessError::BadCredentials)
    }

    pub fn require_catalog_manager(&self, secret: &str) -> Result<Role, AccessError> {
        let role = self.authenticate(secret)?;
        if !role.can_manage_catalog() { return Err(AccessError::Forbidden(role)); }
        Ok(role)
    }

    pub fn require_order_handler(&self, secret: &str) -> Result<Role, AccessError> {
        let role = self.authenticate(secret)?;
        if !role.can_advance_orders() { return Err(AccessError::Forbidden(role)); }
        Ok(role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Incorrect password")]
    BadCredentials,
    #[error("Role {0:?} is not allowed to do that")]
    Forbidden(Role),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_roles() {
        let gate = Gate::new("admin123", "staff123");
        assert_eq!(gate.authenticate("admin123").unwrap(), Role::Administrator);
        assert_eq!(gate.authenticate("staff123").unwrap(), Role::Staff);
        assert_eq!(gate.authenticate("nope").unwrap_err(), AccessError::BadCredentials);
        assert_eq!(gate.require_catalog_manager("staff123").unwrap_err(), AccessError::Forbidden(Role::Staff));
        assert!(gate.require_order_handler("staff123").is_ok());
        assert!(!Role::Customer.can_advance_orders());
    }
    #[test]
    fn test_empty_secret_never_matches() {
        let gate = Gate::new("admin123", "");
        assert!(gate.authenticate("").is_err());
    }
}
