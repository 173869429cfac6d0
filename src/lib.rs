//! `thunder-muscle`: turn a Thunderbird mail archive into a portable dataset.
//!
//! This crate provides the core library for extracting records from the
//! Gloda full-text store, filtering and querying datasets, and computing
//! temporal, keyword and domain aggregates over them.

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod search;
pub mod stats;
pub mod store;
