//! The capability contract between a storage adapter and the HTTP host

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Read/write capability a storage adapter exposes to the generic host.
///
/// One implementor per storage engine. The host is generic over this trait,
/// so router tests can substitute an in-memory service for the real graph.
#[async_trait]
pub trait RwService: Send + Sync + 'static {
    /// Concrete record type this service reads and writes.
    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Declare required schema constraints. Idempotent.
    async fn initialise(&self) -> Result<()>;

    /// Fetch one record by uuid. Absence is `Ok(None)`, not an error.
    async fn read(&self, uuid: &str) -> Result<Option<Self::Record>>;

    /// Write one record, fully replacing whatever is stored under its uuid.
    async fn write(&self, record: Self::Record) -> Result<()>;

    /// Remove the record. `Ok(true)` only when a tagged record existed and
    /// was stripped by this call.
    async fn delete(&self, uuid: &str) -> Result<bool>;

    /// Number of records currently stored.
    async fn count(&self) -> Result<u64>;

    /// Connectivity probe against the backing store.
    async fn check(&self) -> Result<()>;

    /// Deserialize one record from a request body, reporting its uuid for
    /// routing and log correlation.
    fn decode(&self, body: &[u8]) -> Result<(Self::Record, String)>;
}
