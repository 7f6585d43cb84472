//! sl-engine - Reconciliation engine for sledger
//!
//! This crate walks the declared change sequence against a storage driver:
//! every declared change is applied (skipped or forwarded) in order, then
//! any persisted entries past the last declared change are rolled back.

pub mod error;
pub mod plan;
pub mod reconcile;

pub use error::{EngineError, EngineResult};
pub use plan::{plan, PlannedChange};
pub use reconcile::{reconcile, run, ReconcileSummary};
