//! pd-core: shared foundation for the pendula models.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (tolerances + float helpers + gradient)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
