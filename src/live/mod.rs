pub mod client;
pub mod config;
pub mod error;
pub mod sampler;
pub mod segments;
pub mod types;

pub use client::{create_provider, install_crypto_provider, CongestionProvider, HttpCongestionProvider};
pub use config::{validate_live_sampling, LiveSamplingConfig, SamplerSettings};
pub use error::LiveSignalError;
pub use sampler::LiveSignalSampler;
pub use segments::segments_from_geojson;
pub use types::{
    LiveCongestion, LiveSamplingReport, RoadSegment, SegmentSignal, SignalOrigin, SignalSummary,
};
