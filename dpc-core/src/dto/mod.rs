//! Data Transfer Objects
//!
//! Wire formats exchanged with the queue, the identity provider and the
//! DPC pipeline execution API.

pub mod batch;
pub mod execution;
pub mod queue;
pub mod token;
