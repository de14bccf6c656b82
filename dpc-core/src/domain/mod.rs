//! Core domain types
//!
//! These types describe a single pipeline trigger request and its outcome.
//! They are shared between the client (which sends executions) and the
//! runner (which parses queue records and reports batch results).

pub mod execution;
pub mod message;
pub mod project;
