pub mod derived;
pub mod normalizer;

pub use derived::{calculate, DerivedMetricsResult, NormalizedMetric, RawZoneMetrics};
pub use normalizer::{clamp_score, normalize, MetricCategory, MetricKey, MetricRange};
