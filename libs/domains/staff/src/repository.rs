use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StaffError, StaffResult};
use crate::models::Staff;

/// Repository trait for Staff persistence. Every lookup is scoped to a store.
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// `DuplicateStaffId` if the store already has this `staff_id`
    async fn create(&self, staff: Staff) -> StaffResult<Staff>;

    async fn list_by_store(&self, store_id: Uuid) -> StaffResult<Vec<Staff>>;

    async fn find_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<Option<Staff>>;

    /// Login lookup by the `(store_id, staff_id)` pair
    async fn find_by_staff_id(&self, store_id: Uuid, staff_id: &str)
    -> StaffResult<Option<Staff>>;

    /// Persist name, role, activity and password hash
    async fn update(&self, staff: Staff) -> StaffResult<Staff>;

    async fn delete_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<bool>;
}

/// In-memory implementation of StaffRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryStaffRepository {
    staff: Arc<RwLock<HashMap<Uuid, Staff>>>,
}

impl InMemoryStaffRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StaffRepository for InMemoryStaffRepository {
    async fn create(&self, staff: Staff) -> StaffResult<Staff> {
        let mut all = self.staff.write().await;

        if all
            .values()
            .any(|s| s.store_id == staff.store_id && s.staff_id == staff.staff_id)
        {
            return Err(StaffError::DuplicateStaffId(staff.staff_id));
        }

        all.insert(staff.id, staff.clone());
        Ok(staff)
    }

    async fn list_by_store(&self, store_id: Uuid) -> StaffResult<Vec<Staff>> {
        let all = self.staff.read().await;
        let mut members: Vec<Staff> = all
            .values()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn find_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<Option<Staff>> {
        let all = self.staff.read().await;
        Ok(all.get(&id).filter(|s| s.store_id == store_id).cloned())
    }

    async fn find_by_staff_id(
        &self,
        store_id: Uuid,
        staff_id: &str,
    ) -> StaffResult<Option<Staff>> {
        let all = self.staff.read().await;
        Ok(all
            .values()
            .find(|s| s.store_id == store_id && s.staff_id == staff_id)
            .cloned())
    }

    async fn update(&self, staff: Staff) -> StaffResult<Staff> {
        let mut all = self.staff.write().await;

        let existing = all
            .get_mut(&staff.id)
            .filter(|s| s.store_id == staff.store_id)
            .ok_or(StaffError::NotFound(staff.id))?;
        *existing = staff;

        Ok(existing.clone())
    }

    async fn delete_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<bool> {
        let mut all = self.staff.write().await;

        if all.get(&id).is_some_and(|s| s.store_id == store_id) {
            all.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub StaffRepository {}

        #[async_trait]
        impl StaffRepository for StaffRepository {
            async fn create(&self, staff: Staff) -> StaffResult<Staff>;
            async fn list_by_store(&self, store_id: Uuid) -> StaffResult<Vec<Staff>>;
            async fn find_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<Option<Staff>>;
            async fn find_by_staff_id(&self, store_id: Uuid, staff_id: &str) -> StaffResult<Option<Staff>>;
            async fn update(&self, staff: Staff) -> StaffResult<Staff>;
            async fn delete_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<bool>;
        }
    }
}
