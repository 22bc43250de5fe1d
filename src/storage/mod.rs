//! Local persistence for velocity records.

mod results;

pub use results::{StoredRecord, VelocityStore};
