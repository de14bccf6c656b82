//! DPC Core
//!
//! Core types shared by the DPC trigger crates.
//!
//! This crate contains:
//! - Domain types: queue messages, the project registry, execution results
//! - DTOs: wire formats for the queue event, identity provider and DPC API

pub mod domain;
pub mod dto;
