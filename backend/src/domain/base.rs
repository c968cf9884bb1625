/// Base abstractions for the domain layer
use std::fmt::Debug;

/// Trait for value objects - immutable objects defined by their attributes
/// Value objects are equal if all their attributes are equal
pub trait ValueObject: Clone + PartialEq + Eq + Debug {}

/// Trait for entities - objects with identity that can change over time
/// Entities are equal if their IDs are equal, regardless of other attributes
pub trait Entity: Debug {
    type Id: ValueObject;

    fn id(&self) -> &Self::Id;
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value provided
    InvalidValue(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
