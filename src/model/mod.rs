//! Core data model: extracted email records and sender address parsing.

pub mod address;
pub mod record;
