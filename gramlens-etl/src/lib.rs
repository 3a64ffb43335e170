// Library exports for gramlens-etl
// This allows integration tests to drive the pipeline stages directly.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod stage;
pub mod transform;

pub use error::{EtlError, Result};
