//! Customer Aggregate

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    id: String,
    name: String,
    phone: String,
    email: String,
    registered_at: DateTime<Utc>,
    active: bool,
}

impl Customer {
    pub const MAX_NAME_LEN: usize = 100;
    pub const MAX_PHONE_LEN: usize = 20;

    pub fn register(name: &str, phone: &str, email: &str) -> Result<Self, CustomerError> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() || name.chars().count() > Self::MAX_NAME_LEN { return Err(CustomerError::InvalidName); }
        if phone.is_empty() || phone.chars().count() > Self::MAX_PHONE_LEN { return Err(CustomerError::InvalidPhone); }
        let email = normalize_email(email);
        if !validator::validate_email(email.as_str()) { return Err(CustomerError::InvalidEmail(email)); }
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email,
            registered_at: Utc::now(),
            active: true,
        })
    }

    pub fn restore(id: String, name: String, phone: String, email: String, registered_at: DateTime<Utc>, active: bool) -> Self {
        Self { id, name, phone, email, registered_at, active }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn phone(&self) -> &str { &self.phone }
    pub fn email(&self) -> &str { &self.email }
    pub fn registered_at(&self) -> DateTime<Utc> { self.registered_at }
    pub fn is_active(&self) -> bool { self.active }
}

/// Lowercases the domain part, leaving the local part as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerError {
    #[error("Name is required (max 100 characters)")]
    InvalidName,
    #[error("Phone is required (max 20 characters)")]
    InvalidPhone,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_register() {
        let c = Customer::register(" Ana ", "3001234567", "Ana@Example.COM").unwrap();
        assert_eq!(c.name(), "Ana");
        assert_eq!(c.email(), "Ana@example.com");
        assert!(c.is_active());
    }
    #[test]
    fn test_register_validation() {
        assert_eq!(Customer::register("", "1", "a@b.co").unwrap_err(), CustomerError::InvalidName);
        assert_eq!(Customer::register("Ana", "", "a@b.co").unwrap_err(), CustomerError::InvalidPhone);
        assert!(matches!(Customer::register("Ana", "1", "not-an-email"), Err(CustomerError::InvalidEmail(_))));
    }
}
