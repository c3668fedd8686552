//! Stores Domain
//!
//! Stores owned by owner-users, and the Tenant Ownership Guard every
//! store-scoped operation goes through.
//!
//! # Features
//!
//! - Store CRUD scoped to the authenticated owner
//! - Globally unique slugs, generated with retry on collision when not supplied
//! - [`StoreLookup`]: id-or-slug resolution and `require_store_ownership`,
//!   injected into the staff domain
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_stores::{handlers, InMemoryStoreRepository, StoreService};
//!
//! let service = StoreService::new(InMemoryStoreRepository::new());
//! let router = handlers::router(service.clone(), tokens);
//! // `service` doubles as the StoreLookup handed to the staff domain
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod lookup;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod slug;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use lookup::StoreLookup;
pub use models::{CreateStore, Store, StoreSettings, UpdateStore};
pub use postgres::PgStoreRepository;
pub use repository::{InMemoryStoreRepository, StoreRepository};
pub use service::StoreService;
