//! BIXI Montréal bike-share query server.
//!
//! Answers questions about the live BIXI network ("where is the nearest
//! station with a bike?", "which stations are broken?") from its public
//! GBFS feeds, cached for a short TTL so bursts of queries cost at most one
//! upstream fetch per feed.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod gbfs;
pub mod stations;
pub mod web;
