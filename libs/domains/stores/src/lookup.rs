//! Store Lookup: the narrow view of stores other domains depend on.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::Store;

/// Store resolution and the Tenant Ownership Guard.
///
/// Staff management and staff login take an implementation of this trait at
/// construction instead of reaching into the stores repository.
#[async_trait]
pub trait StoreLookup: Send + Sync {
    /// Resolve a store reference that is either a store id or a slug.
    ///
    /// An id-shaped reference is looked up by id only; anything else by slug.
    async fn find_store(&self, reference: &str) -> StoreResult<Option<Store>>;

    /// The store when it exists and belongs to `owner_id`.
    ///
    /// A missing store and a store owned by someone else both fail with the
    /// same `NotFound`.
    async fn require_store_ownership(&self, store_id: Uuid, owner_id: Uuid) -> StoreResult<Store>;
}
