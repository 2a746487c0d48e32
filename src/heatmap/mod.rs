mod aggregate;
mod tier;

pub use aggregate::{aggregate, AggregatedLocation, Aggregator, CellKey, Resolution};
pub use tier::{DensityTier, HIGH_ABOVE, MEDIUM_ABOVE};
