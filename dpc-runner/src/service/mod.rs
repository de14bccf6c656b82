//! Service layer
//!
//! Services contain the runner's business logic. They are trait-based so the
//! binary can hold them behind `Arc<dyn ...>`.

mod batch;

pub use batch::{BatchService, RecordError, StandardBatchService};
