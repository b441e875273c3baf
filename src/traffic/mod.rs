pub mod congestion;
pub mod fusion;
pub mod placeholder;
pub mod types;

pub use congestion::{
    classify_delta, compare_congestion, CongestionComparison, CongestionLevel, SignalDirection,
    SignalStrength,
};
pub use fusion::{activity_multiplier, fuse_traffic, vehicle_ratio};
pub use types::{
    DotTrafficData, FusedTrafficResult, GoogleTrafficData, PrimarySource, TrafficInputs,
    TrafficTrend, TrendDirection,
};
