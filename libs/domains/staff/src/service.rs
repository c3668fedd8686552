use axum_helpers::{Principal, TokenService, hash_password, verify_password_or_dummy};
use chrono::Utc;
use domain_stores::StoreLookup;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{StaffError, StaffResult};
use crate::models::{CreateStaff, Staff, StaffLoginRequest, UpdateStaff};
use crate::repository::StaffRepository;

/// Staff management for store owners, and staff sign-in.
///
/// Management calls take the store id from the request path and go through
/// [`StoreLookup::require_store_ownership`] before any staff row is touched.
pub struct StaffService<R: StaffRepository, L: StoreLookup> {
    repository: Arc<R>,
    stores: Arc<L>,
    tokens: TokenService,
}

impl<R: StaffRepository, L: StoreLookup> Clone for StaffService<R, L> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            stores: self.stores.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<R: StaffRepository, L: StoreLookup> StaffService<R, L> {
    pub fn new(repository: R, stores: L, tokens: TokenService) -> Self {
        Self {
            repository: Arc::new(repository),
            stores: Arc::new(stores),
            tokens,
        }
    }

    pub async fn create_staff(
        &self,
        owner_id: Uuid,
        store_id: Uuid,
        input: CreateStaff,
    ) -> StaffResult<Staff> {
        self.stores.require_store_ownership(store_id, owner_id).await?;

        let password_hash = hash_password(&input.password)?;
        let staff = Staff::new(
            store_id,
            input.name,
            input.staff_id,
            password_hash,
            input.role,
        );

        let created = self.repository.create(staff).await?;
        tracing::info!(store_id = %store_id, staff_id = %created.id, "Created staff member");
        Ok(created)
    }

    pub async fn list_staff(&self, owner_id: Uuid, store_id: Uuid) -> StaffResult<Vec<Staff>> {
        self.stores.require_store_ownership(store_id, owner_id).await?;
        self.repository.list_by_store(store_id).await
    }

    pub async fn update_staff(
        &self,
        owner_id: Uuid,
        store_id: Uuid,
        id: Uuid,
        input: UpdateStaff,
    ) -> StaffResult<Staff> {
        self.stores.require_store_ownership(store_id, owner_id).await?;

        let mut staff = self
            .repository
            .find_in_store(store_id, id)
            .await?
            .ok_or(StaffError::NotFound(id))?;

        if let Some(name) = input.name {
            staff.name = name;
        }
        if let Some(role) = input.role {
            staff.role = role;
        }
        if let Some(is_active) = input.is_active {
            staff.is_active = is_active;
        }
        if let Some(password) = input.password {
            staff.password_hash = hash_password(&password)?;
        }
        staff.updated_at = Utc::now();

        self.repository.update(staff).await
    }

    pub async fn delete_staff(&self, owner_id: Uuid, store_id: Uuid, id: Uuid) -> StaffResult<()> {
        self.stores.require_store_ownership(store_id, owner_id).await?;

        if !self.repository.delete_in_store(store_id, id).await? {
            return Err(StaffError::NotFound(id));
        }
        tracing::info!(store_id = %store_id, staff_id = %id, "Deleted staff member");
        Ok(())
    }

    /// Staff sign-in with a store id or slug.
    ///
    /// An unknown staff id still pays for a password verification, and the
    /// active flag is only consulted once the password has matched, so
    /// neither existence nor deactivation shows to anyone without the
    /// password.
    pub async fn login(&self, input: StaffLoginRequest) -> StaffResult<(String, Staff)> {
        let store = self
            .stores
            .find_store(&input.store_id)
            .await?
            .ok_or(StaffError::InvalidStoreId)?;

        let staff = self
            .repository
            .find_by_staff_id(store.id, &input.staff_id)
            .await?;
        let password_ok = verify_password_or_dummy(
            staff.as_ref().map(|s| s.password_hash.as_str()),
            &input.password,
        );
        let Some(staff) = staff.filter(|_| password_ok) else {
            return Err(StaffError::InvalidCredentials);
        };

        if !staff.is_active {
            return Err(StaffError::AccountInactive);
        }

        let principal = Principal::staff(staff.id, staff.role.to_string(), store.id);
        let access_token = self.tokens.issue_access_token(&principal)?;

        tracing::info!(store_id = %store.id, staff_id = %staff.id, "Staff logged in");
        Ok((access_token, staff))
    }

    /// The staff member behind a staff principal
    pub async fn me(&self, principal: &Principal) -> StaffResult<Staff> {
        let store_id = principal.store_id.ok_or(StaffError::InvalidStoreId)?;

        let staff = self
            .repository
            .find_in_store(store_id, principal.subject_id)
            .await?
            .ok_or(StaffError::NotFound(principal.subject_id))?;

        if !staff.is_active {
            return Err(StaffError::AccountInactive);
        }
        Ok(staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StaffRole;
    use axum_helpers::verify_password;
    use crate::repository::InMemoryStaffRepository;
    use crate::repository::mock::MockStaffRepository;
    use async_trait::async_trait;
    use core_config::auth::AuthConfig;
    use domain_stores::{Store, StoreError, StoreResult, StoreSettings};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Stores {}

        #[async_trait]
        impl StoreLookup for Stores {
            async fn find_store(&self, reference: &str) -> StoreResult<Option<Store>>;
            async fn require_store_ownership(&self, store_id: Uuid, owner_id: Uuid) -> StoreResult<Store>;
        }
    }

    fn store(id: Uuid, owner_id: Uuid) -> Store {
        let now = Utc::now();
        Store {
            id,
            owner_id,
            name: "Shop".to_string(),
            slug: "abc123".to_string(),
            settings: StoreSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn tokens() -> TokenService {
        TokenService::new(&AuthConfig::development())
    }

    /// A lookup that knows exactly one store, owned by `owner_id`
    fn single_store(store_id: Uuid, owner_id: Uuid) -> MockStores {
        let mut stores = MockStores::new();
        stores
            .expect_require_store_ownership()
            .returning(move |id, owner| {
                if id == store_id && owner == owner_id {
                    Ok(store(store_id, owner_id))
                } else {
                    Err(StoreError::NotFound(id))
                }
            });
        stores.expect_find_store().returning(move |reference| {
            Ok((reference == "abc123" || reference == store_id.to_string())
                .then(|| store(store_id, owner_id)))
        });
        stores
    }

    fn create(staff_id: &str) -> CreateStaff {
        CreateStaff {
            name: "Bob".to_string(),
            staff_id: staff_id.to_string(),
            password: "pw123456".to_string(),
            role: StaffRole::Cashier,
        }
    }

    fn login(store: &str, staff_id: &str, password: &str) -> StaffLoginRequest {
        StaffLoginRequest {
            store_id: store.to_string(),
            staff_id: staff_id.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_foreign_store_never_reaches_repository() {
        let store_id = Uuid::now_v7();
        let mut stores = MockStores::new();
        stores
            .expect_require_store_ownership()
            .with(eq(store_id), mockall::predicate::always())
            .times(4)
            .returning(|id, _| Err(StoreError::NotFound(id)));

        let mut repo = MockStaffRepository::new();
        repo.expect_create().never();
        repo.expect_list_by_store().never();
        repo.expect_find_in_store().never();
        repo.expect_delete_in_store().never();

        let service = StaffService::new(repo, stores, tokens());
        let owner = Uuid::now_v7();
        let id = Uuid::now_v7();

        let results = [
            service.create_staff(owner, store_id, create("001")).await.err(),
            service.list_staff(owner, store_id).await.err(),
            service
                .update_staff(owner, store_id, id, UpdateStaff::default())
                .await
                .err(),
            service.delete_staff(owner, store_id, id).await.err(),
        ];
        for err in results {
            assert!(matches!(err, Some(StaffError::Store(StoreError::NotFound(_)))));
        }
    }

    #[tokio::test]
    async fn test_created_staff_has_hashed_password() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );

        let staff = service.create_staff(owner, store_id, create("001")).await.unwrap();
        assert_eq!(staff.store_id, store_id);
        assert!(staff.is_active);
        assert_ne!(staff.password_hash, "pw123456");
        assert!(verify_password(&staff.password_hash, "pw123456"));
    }

    #[tokio::test]
    async fn test_login_issues_store_scoped_token() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let tokens = tokens();
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens.clone(),
        );
        let bob = service.create_staff(owner, store_id, create("001")).await.unwrap();

        let (token, staff) = service.login(login("abc123", "001", "pw123456")).await.unwrap();
        assert_eq!(staff.id, bob.id);

        let claims = tokens.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, bob.id.to_string());
        assert_eq!(claims.role, "cashier");
        assert_eq!(claims.store_id, Some(store_id.to_string()));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );
        service.create_staff(owner, store_id, create("001")).await.unwrap();

        let unknown_store = service.login(login("zzz999", "001", "pw123456")).await;
        assert!(matches!(unknown_store, Err(StaffError::InvalidStoreId)));

        let unknown_staff = service.login(login("abc123", "002", "pw123456")).await;
        assert!(matches!(unknown_staff, Err(StaffError::InvalidCredentials)));

        let wrong_password = service.login(login("abc123", "001", "wrong-pw")).await;
        assert!(matches!(wrong_password, Err(StaffError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_staff_login_takes_as_long_as_wrong_password() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );
        service.create_staff(owner, store_id, create("001")).await.unwrap();
        let _ = service.login(login("abc123", "999", "wrong-pw")).await;

        let start = std::time::Instant::now();
        let known = service.login(login("abc123", "001", "wrong-pw")).await;
        let known_elapsed = start.elapsed();

        let start = std::time::Instant::now();
        let unknown = service.login(login("abc123", "999", "wrong-pw")).await;
        let unknown_elapsed = start.elapsed();

        assert!(matches!(known, Err(StaffError::InvalidCredentials)));
        assert!(matches!(unknown, Err(StaffError::InvalidCredentials)));
        assert!(
            unknown_elapsed * 4 >= known_elapsed,
            "unknown {unknown_elapsed:?} vs known {known_elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_inactive_account_checked_after_password() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );
        let bob = service.create_staff(owner, store_id, create("001")).await.unwrap();
        service
            .update_staff(
                owner,
                store_id,
                bob.id,
                UpdateStaff {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let wrong_password = service.login(login("abc123", "001", "wrong-pw")).await;
        assert!(matches!(wrong_password, Err(StaffError::InvalidCredentials)));

        let right_password = service.login(login("abc123", "001", "pw123456")).await;
        assert!(matches!(right_password, Err(StaffError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_update_password_rehashes() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );
        let bob = service.create_staff(owner, store_id, create("001")).await.unwrap();

        let updated = service
            .update_staff(
                owner,
                store_id,
                bob.id,
                UpdateStaff {
                    password: Some("new-secret".to_string()),
                    role: Some(StaffRole::Manager),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, StaffRole::Manager);
        assert_eq!(updated.name, "Bob");

        assert!(service.login(login("abc123", "001", "new-secret")).await.is_ok());
        assert!(service.login(login("abc123", "001", "pw123456")).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_staff_is_not_found() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );

        let result = service.delete_staff(owner, store_id, Uuid::now_v7()).await;
        assert!(matches!(result, Err(StaffError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_me_resolves_principal() {
        let (store_id, owner) = (Uuid::now_v7(), Uuid::now_v7());
        let service = StaffService::new(
            InMemoryStaffRepository::new(),
            single_store(store_id, owner),
            tokens(),
        );
        let bob = service.create_staff(owner, store_id, create("001")).await.unwrap();

        let principal = Principal::staff(bob.id, "cashier", store_id);
        assert_eq!(service.me(&principal).await.unwrap().id, bob.id);

        let elsewhere = Principal::staff(bob.id, "cashier", Uuid::now_v7());
        assert!(matches!(
            service.me(&elsewhere).await,
            Err(StaffError::NotFound(_))
        ));
    }
}
