//! memberd-graph: Neo4j storage adapter for memberd
//!
//! `CypherRunner` submits parameterized statement batches over Bolt with
//! an all-or-nothing guarantee; `MembershipRepository` maps memberships
//! onto the graph shape and implements the `RwService` contract the HTTP
//! host consumes.

pub mod labels;
pub mod repository;
pub mod runner;

pub use labels::{Label, Rel};
pub use repository::MembershipRepository;
pub use runner::{CypherRunner, GraphConfig, ParamValue, Statement, DEFAULT_BATCH_SIZE};
