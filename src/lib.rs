//! Employee leave-management service: an employee directory and a leave
//! ledger served as JSON over actix-web, backed by SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
