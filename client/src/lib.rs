#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
//! Client for the UK Parliament REST APIs.
//!
//! Records are fetched through a [`client::ResourceClient`], walked across
//! pages by a [`pagination::Pager`] (link-following or skip/take windows),
//! and assembled into enriched entities by the per-domain types in
//! [`domains`] using the helpers in [`enrich`].
//!
//! Every call is a fresh set of sequential (or boundedly concurrent) network
//! round trips: nothing is cached, persisted, rate-limited or retried.

pub mod client;
pub mod config;
pub mod domains;
pub mod endpoint;
pub mod enrich;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod query;

pub use error::ParleyError;
