// Analysis module
//
// Per-province correlation of the three anomaly series, plus the static
// reference data joined onto the results (province coordinates, labels).

pub mod coordinates;
pub mod correlation;
pub mod labels;

pub use coordinates::{Coordinate, CoordinateError, CoordinateLookup};
pub use correlation::{
    compute, compute_with_coordinates, pearson, CorrelationRow, Metric, MetricPair,
};
pub use labels::LabelSet;
