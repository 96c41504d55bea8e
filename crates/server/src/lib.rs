//! Chalkbox server library.
//!
//! The JSON API for the course catalog, enrollments, purchases, and access
//! decisions, exposed as a library so the full router can be exercised
//! in-process by integration tests over the in-memory backends.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod webhook;
