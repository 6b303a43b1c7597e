//! Common type definitions and permission system types.
//!
//! Entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`CategoryId`], [`ProductId`], [`ServiceId`]: Catalog identifiers
//! - [`OrderId`], [`OrderItemId`]: Marketplace order identifiers
//! - [`TransferId`]: Money transfer identifier
//! - [`ExchangeRateId`]: Stored currency pair identifier
//!
//! The permission model is deliberately small: every resource supports the
//! four CRUD operations, and each operation is either unrestricted (`*All`,
//! admin only) or restricted to the caller's own records (`*Own`).

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type CategoryId = Uuid;
pub type ProductId = Uuid;
pub type ServiceId = Uuid;
pub type OrderId = Uuid;
pub type OrderItemId = Uuid;
pub type TransferId = Uuid;
pub type ExchangeRateId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Categories,
    Products,
    Services,
    Orders,
    Transfers,
    ExchangeRates,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Users => "users",
            Resource::Categories => "categories",
            Resource::Products => "products",
            Resource::Services => "services",
            Resource::Orders => "orders",
            Resource::Transfers => "transfers",
            Resource::ExchangeRates => "exchange rates",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::CreateAll.to_string(), "Create");
        assert_eq!(Operation::ReadOwn.to_string(), "Read");
        assert_eq!(Operation::DeleteAll.to_string(), "Delete");
    }
}
