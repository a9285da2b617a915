//! memberd-core: domain model and service contract for memberd
//!
//! Holds everything the HTTP host and the storage adapter share:
//! the membership wire model, the `RwService` capability trait, and
//! the common error type. No engine or HTTP dependencies live here.

pub mod dates;
pub mod error;
pub mod membership;
pub mod service;

pub use dates::DateProps;
pub use error::{Result, ServiceError};
pub use membership::{AlternativeIdentifiers, Membership, MembershipRole};
pub use service::RwService;
