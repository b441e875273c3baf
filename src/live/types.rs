use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::GeoPoint;
use crate::traffic::{CongestionComparison, CongestionLevel, SignalDirection};

/// A road segment with its official AADT baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id: String,
    pub aadt: u64,
    /// Representative point of the geometry; `None` when it could not be derived
    pub midpoint: Option<GeoPoint>,
}

impl RoadSegment {
    /// Spatial bucket this segment generalises into
    pub fn bucket_key(&self) -> Option<String> {
        self.midpoint.as_ref().map(GeoPoint::bucket_key)
    }

    pub fn expected_congestion(&self) -> CongestionLevel {
        CongestionLevel::expected_from_aadt(self.aadt)
    }
}

/// One live reading from the congestion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCongestion {
    pub congestion: CongestionLevel,
    #[serde(default)]
    pub road_class: Option<String>,
}

/// Where a segment's signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalOrigin {
    /// The segment itself was queried
    Sampled,
    /// Copied from a sampled segment in the same bucket
    Inherited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSignal {
    pub segment_id: String,
    pub bucket: Option<String>,
    pub origin: Option<SignalOrigin>,
    pub comparison: Option<CongestionComparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub growth: usize,
    pub decline: usize,
    pub stable: usize,
    pub unenriched: usize,
}

/// Outcome of a live sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSamplingReport {
    /// False when sampling was skipped for lack of configuration
    pub enabled: bool,
    pub total_segments: usize,
    pub sampled: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Queries dropped because the deadline passed or the service rejected us
    pub skipped: usize,
    pub deadline_exceeded: bool,
    pub buckets: BTreeMap<String, CongestionComparison>,
    pub segments: Vec<SegmentSignal>,
}

impl LiveSamplingReport {
    /// Report for a run that made no queries; every segment is left unenriched
    pub fn unenriched(segments: &[RoadSegment], enabled: bool) -> Self {
        Self {
            enabled,
            total_segments: segments.len(),
            sampled: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            deadline_exceeded: false,
            buckets: BTreeMap::new(),
            segments: segments
                .iter()
                .map(|s| SegmentSignal {
                    segment_id: s.id.clone(),
                    bucket: s.bucket_key(),
                    origin: None,
                    comparison: None,
                })
                .collect(),
        }
    }

    pub fn enriched_count(&self) -> usize {
        self.segments.iter().filter(|s| s.comparison.is_some()).count()
    }

    /// Live-vs-expected comparison for the bucket containing `point`
    pub fn signal_at(&self, point: &GeoPoint) -> Option<&CongestionComparison> {
        self.buckets.get(&point.bucket_key())
    }

    pub fn summary(&self) -> SignalSummary {
        let mut summary = SignalSummary::default();
        for segment in &self.segments {
            match segment.comparison.as_ref().map(|c| c.signal) {
                Some(SignalDirection::Growth) => summary.growth += 1,
                Some(SignalDirection::Decline) => summary.decline += 1,
                Some(SignalDirection::Stable) => summary.stable += 1,
                None => summary.unenriched += 1,
            }
        }
        summary
    }
}
