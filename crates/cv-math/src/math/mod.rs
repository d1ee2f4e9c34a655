//! Core math modules.

pub mod distance;
pub mod metrics;
pub mod stable;
pub mod stats;
