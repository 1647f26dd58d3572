//! Adapter between a business platform and the STBL payment provider.
//!
//! The platform sends normalized pay/payout/status requests; they are
//! translated into provider API calls, the replies are mapped back to the
//! platform's status vocabulary, and provider callbacks are relayed to the
//! platform as signed tokens.

pub mod api;
#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod connect;
pub mod database;
pub mod gateway;
