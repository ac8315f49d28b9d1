//! `smartstock-core`: shared domain building blocks.
//!
//! Pure domain primitives only: identifiers, the aggregate contract and the
//! domain error model. Nothing in here performs IO.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, AggregateId};
pub use value_object::ValueObject;
