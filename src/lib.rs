// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Workshop ERP - API Security Gate
//!
//! REST API shell for a small-business ERP. Every request passes a security
//! pipeline that resolves a static role token and decides access from the
//! route's declared roles; the voice-assistant bridge has its own signed
//! trust path.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router assembly (Axum)
//! - `auth` - Token registry, resolver, role decision and route declarations
//! - `bridge` - Signed voice-assistant webhook and account linking
//! - `config` - Environment-driven server configuration
//! - `store` - In-memory data behind the demonstration routes

pub mod api;
pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
