//! StoreHub API
//!
//! Composition root: configuration, routers of every domain and the
//! OpenAPI document. The binary in `main.rs` adds the database, seed and
//! server lifecycle around it.

pub mod api;
pub mod config;
pub mod openapi;
pub mod state;
