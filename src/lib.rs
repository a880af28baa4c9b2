//! Shelfguard - Book Catalogue Service with Admission Control
//!
//! This crate implements a small book CRUD service over HTTP. Every book
//! route is guarded by an in-process leaky-bucket limiter that rejects
//! excess requests with `429 Too Many Requests` before they reach a handler
//! or the store.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod store;
