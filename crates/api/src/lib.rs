//! HTTP API: authentication endpoints, request authentication middleware and
//! the tenant-scoped routes that sit behind it.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
