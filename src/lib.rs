//! Pet Haven: backend API for a pet-adoption and donation-campaign platform.
//!
//! Identity is claim-based: the server signs short-lived bearer tokens and
//! every protected route runs behind the verification/authorization
//! middleware chain. Listings, adoption requests and campaigns live in an
//! embedded schema-less document store.

pub mod auth;
pub mod models;
// Document store: Sled-backed collections of JSON documents with
// filter/sort/skip/limit queries
pub mod storage;
// Query construction: search filters, owner scoping, pagination windows
pub mod query;
// REST API module: Axum router, middleware chain and resource handlers
pub mod rest;
