//! Case viability math utilities.

pub mod math;

pub use math::distance::*;
pub use math::metrics::*;
pub use math::stable::*;
pub use math::stats::*;
