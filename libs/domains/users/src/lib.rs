//! Users Domain
//!
//! Owner-user accounts and their sessions.
//!
//! # Features
//!
//! - Registration and email/password login
//! - Access/refresh token pairs with refresh rotation and reuse rejection
//! - Refresh tokens persisted as SHA-256 digests, revocable per token or per user
//! - Profile, password and avatar management
//! - Admin user management (admins cannot be deleted)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (/auth, /users)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← AuthService (identity resolver), UserService
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← UserRepository + RefreshTokenStore (in-memory, PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{
//!     auth_handlers, handlers, AuthService, InMemoryRefreshTokenStore,
//!     InMemoryUserRepository, UserService,
//! };
//!
//! let users = InMemoryUserRepository::new();
//! let sessions = InMemoryRefreshTokenStore::new();
//!
//! let auth = AuthService::new(users.clone(), sessions.clone(), tokens.clone());
//! let auth_router = auth_handlers::router(auth, cookie);
//! let users_router = handlers::router(UserService::new(users, sessions), tokens);
//! ```

pub mod auth_handlers;
pub mod auth_service;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod refresh_token;
pub mod repository;
pub mod seed;
pub mod service;

// Re-export commonly used types
pub use auth_handlers::RefreshCookie;
pub use auth_service::{AuthService, AuthSession};
pub use error::{AuthError, AuthResult, UserError, UserResult};
pub use models::{
    LoginRequest, LoginResponse, RegisterRequest, Role, User, UserResponse,
};
pub use postgres::{PgRefreshTokenStore, PgUserRepository};
pub use refresh_token::{InMemoryRefreshTokenStore, RefreshTokenRecord, RefreshTokenStore};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use seed::seed_users;
pub use service::UserService;
