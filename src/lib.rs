//! shop_catalog: product catalog service in Rust
//!
//! Product CRUD over a Sled store (Serde JSON records), served by Axum, with
//! HS256 bearer tokens (jsonwebtoken) and bcrypt password checks gating the
//! protected routes.

pub mod auth;
pub mod config;
pub mod error;
// Extractors that reject with the JSON error body
pub mod extract;
pub mod logging;
pub mod models;
// REST API module: Axum router, handlers and the OpenAPI document
pub mod rest;
pub mod storage;
