//! Staff Domain
//!
//! Store-scoped worker identities with their own sign-in.
//!
//! # Features
//!
//! - `staff_id` unique per store, free to repeat across stores
//! - Management only by the store's owner, through [`domain_stores::StoreLookup`]
//! - Staff login by store id or slug, issuing a staff access token with a
//!   store scope and no refresh token
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_staff::{handlers, InMemoryStaffRepository, StaffService};
//!
//! let staff = StaffService::new(InMemoryStaffRepository::new(), stores.clone(), tokens.clone());
//! let stores_routes = stores_router.merge(handlers::management_router(staff.clone(), tokens.clone()));
//! let staff_routes = handlers::session_router(staff, tokens);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{StaffError, StaffResult};
pub use models::{CreateStaff, Staff, StaffLoginRequest, StaffResponse, StaffRole, UpdateStaff};
pub use postgres::PgStaffRepository;
pub use repository::{InMemoryStaffRepository, StaffRepository};
pub use service::StaffService;
