//! sl-core: shared foundation for speedloop.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + finiteness/period checks + sign)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SlError, SlResult};
pub use numeric::*;
pub use units::*;
