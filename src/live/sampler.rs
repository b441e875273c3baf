use futures::stream::{FuturesUnordered, StreamExt};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use tokio::time::Instant;

use super::client::{create_provider, CongestionProvider, HttpCongestionProvider};
use super::config::{LiveSamplingConfig, SamplerSettings};
use super::error::LiveSignalError;
use super::types::{LiveCongestion, LiveSamplingReport, RoadSegment, SegmentSignal, SignalOrigin};
use crate::credentials::{get_api_key_from_env, ENV_API_KEY_VAR};
use crate::geo::GeoPoint;
use crate::traffic::{compare_congestion, CongestionComparison};

static DISABLED_WARNING: Once = Once::new();

/// Segment index with its query result; `None` when the query was never sent
type QueryOutcome = (usize, Option<Result<LiveCongestion, LiveSignalError>>);

/// Enriches road segments with live congestion by querying a random sample
/// and spreading each result across its spatial bucket.
pub struct LiveSignalSampler {
    provider: Option<Arc<dyn CongestionProvider>>,
    settings: SamplerSettings,
}

impl LiveSignalSampler {
    pub fn new(provider: Arc<dyn CongestionProvider>, settings: SamplerSettings) -> Self {
        Self {
            provider: Some(provider),
            settings,
        }
    }

    /// A sampler that never queries; every run returns an unenriched report
    pub fn disabled(settings: SamplerSettings) -> Self {
        Self {
            provider: None,
            settings,
        }
    }

    /// Build a sampler from config plus the API key in the environment.
    /// Missing credentials or endpoint switch sampling off (warned once per process).
    pub fn from_config(config: &LiveSamplingConfig) -> Self {
        let settings = SamplerSettings::from_config(config);
        match Self::http_provider(config) {
            Ok(provider) => Self::new(Arc::new(provider), settings),
            Err(e) => {
                DISABLED_WARNING.call_once(|| {
                    log::warn!("Live congestion sampling disabled: {}", e);
                });
                Self::disabled(settings)
            }
        }
    }

    fn http_provider(
        config: &LiveSamplingConfig,
    ) -> Result<HttpCongestionProvider, LiveSignalError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(LiveSignalError::MissingEndpoint)?;
        let api_key = get_api_key_from_env().ok_or(LiveSignalError::MissingApiKey(ENV_API_KEY_VAR))?;
        create_provider(endpoint, &api_key)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Query a random sample of `segments` and generalize the results by bucket.
    ///
    /// Failed or timed-out queries leave their segment unenriched. When
    /// `deadline` passes, outstanding queries are dropped and whatever has
    /// completed is still merged.
    pub async fn enrich(&self, segments: &[RoadSegment], deadline: Option<Instant>) -> LiveSamplingReport {
        let provider = match &self.provider {
            Some(provider) => provider.clone(),
            None => return LiveSamplingReport::unenriched(segments, false),
        };

        let selected = self.select_sample(segments);
        let mut report = LiveSamplingReport::unenriched(segments, true);
        report.sampled = selected.len();
        if selected.is_empty() {
            return report;
        }

        log::debug!(
            "Sampling {} of {} segments (concurrency {})",
            selected.len(),
            segments.len(),
            self.settings.concurrency
        );

        // Auth rejection flag shared across concurrent tasks
        let auth_rejected = Arc::new(AtomicBool::new(false));

        let mut futures = FuturesUnordered::new();
        let mut pending = selected
            .into_iter()
            .filter_map(|idx| segments[idx].midpoint.map(|point| (idx, point)));
        let mut outcomes = Vec::new();

        // Fill initial batch
        for _ in 0..self.settings.concurrency.max(1) {
            if let Some((idx, point)) = pending.next() {
                futures.push(self.query_segment(provider.clone(), idx, point, auth_rejected.clone()));
            }
        }

        // Process results and feed new tasks
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, futures.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        log::warn!(
                            "Live sampling deadline reached; dropping {} in-flight queries",
                            futures.len()
                        );
                        report.deadline_exceeded = true;
                        break;
                    }
                },
                None => futures.next().await,
            };

            let Some(outcome) = next else { break };
            outcomes.push(outcome);

            if !auth_rejected.load(Ordering::Relaxed) {
                if let Some((idx, point)) = pending.next() {
                    futures.push(self.query_segment(provider.clone(), idx, point, auth_rejected.clone()));
                }
            }
        }
        drop(futures);

        self.merge(segments, outcomes, &mut report);
        report.skipped = report.sampled - report.succeeded - report.failed;

        let summary = report.summary();
        log::info!(
            "Live sampling: {} queried, {} failed, {} skipped; {} of {} segments enriched ({} growth, {} decline, {} stable)",
            report.succeeded,
            report.failed,
            report.skipped,
            report.enriched_count(),
            report.total_segments,
            summary.growth,
            summary.decline,
            summary.stable
        );

        report
    }

    /// Indices of the segments to query, ascending. Only segments with a midpoint qualify.
    fn select_sample(&self, segments: &[RoadSegment]) -> Vec<usize> {
        let eligible: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.midpoint.is_some())
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return Vec::new();
        }

        let amount = sample_size(eligible.len(), self.settings.sample_fraction);
        let mut rng = match self.settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut picked: Vec<usize> = rand::seq::index::sample(&mut rng, eligible.len(), amount)
            .into_iter()
            .map(|i| eligible[i])
            .collect();
        picked.sort_unstable();
        picked
    }

    async fn query_segment(
        &self,
        provider: Arc<dyn CongestionProvider>,
        idx: usize,
        point: GeoPoint,
        auth_rejected: Arc<AtomicBool>,
    ) -> QueryOutcome {
        // Queued before the service rejected our key; never sent
        if auth_rejected.load(Ordering::Relaxed) {
            return (idx, None);
        }

        let timeout = self.settings.timeout;
        let result = match tokio::time::timeout(timeout, provider.query(point, self.settings.search_radius_m)).await {
            Ok(result) => result,
            Err(_) => Err(LiveSignalError::Timeout(timeout)),
        };

        if let Err(ref e) = result {
            if e.is_auth_rejection() {
                auth_rejected.store(true, Ordering::Relaxed);
            }
        }

        (idx, Some(result))
    }

    // Runs strictly after the fan-out has joined, so no locking is needed.
    fn merge(
        &self,
        segments: &[RoadSegment],
        mut outcomes: Vec<QueryOutcome>,
        report: &mut LiveSamplingReport,
    ) {
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut sampled: BTreeMap<usize, Option<CongestionComparison>> = BTreeMap::new();
        for (idx, result) in outcomes {
            let segment = &segments[idx];
            match result {
                None => log::debug!("Skipped segment {} after credential rejection", segment.id),
                Some(Ok(live)) => {
                    report.succeeded += 1;
                    let comparison =
                        compare_congestion(live.congestion, segment.expected_congestion(), live.road_class);
                    if let (Some(bucket), Some(comparison)) = (segment.bucket_key(), comparison.as_ref()) {
                        // Last write wins within a bucket
                        report.buckets.insert(bucket, comparison.clone());
                    }
                    sampled.insert(idx, comparison);
                }
                Some(Err(e)) => {
                    report.failed += 1;
                    log::warn!("Live congestion query failed for segment {}: {}", segment.id, e);
                }
            }
        }

        report.segments = segments
            .iter()
            .enumerate()
            .map(|(idx, segment)| {
                let bucket = segment.bucket_key();
                let (origin, comparison) = match sampled.get(&idx) {
                    Some(Some(own)) => (Some(SignalOrigin::Sampled), Some(own.clone())),
                    _ => match bucket.as_ref().and_then(|b| report.buckets.get(b)) {
                        Some(shared) => (Some(SignalOrigin::Inherited), Some(shared.clone())),
                        None => (None, None),
                    },
                };
                SegmentSignal {
                    segment_id: segment.id.clone(),
                    bucket,
                    origin,
                    comparison,
                }
            })
            .collect();
    }
}

/// Number of items to draw: ceil(len * fraction), at least one, at most len
pub fn sample_size(len: usize, fraction: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    ((len as f64 * fraction).ceil() as usize).clamp(1, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::{CongestionLevel, SignalDirection, SignalStrength};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted provider keyed by the queried point's bucket, or by the exact
    /// point (4 decimal places) when `point_responses` has an entry
    #[derive(Default)]
    struct MockProvider {
        responses: HashMap<String, Result<CongestionLevel, u16>>,
        point_responses: HashMap<String, CongestionLevel>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        queried: Mutex<Vec<GeoPoint>>,
    }

    #[async_trait]
    impl CongestionProvider for MockProvider {
        async fn query(&self, point: GeoPoint, _radius_m: u32) -> Result<LiveCongestion, LiveSignalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.queried.lock().unwrap().push(point);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let exact = format!("{:.4},{:.4}", point.lat, point.lng);
            if let Some(level) = self.point_responses.get(&exact) {
                return Ok(LiveCongestion {
                    congestion: *level,
                    road_class: None,
                });
            }

            match self.responses.get(&point.bucket_key()) {
                Some(Ok(level)) => Ok(LiveCongestion {
                    congestion: *level,
                    road_class: Some("arterial".to_string()),
                }),
                Some(Err(status)) => Err(LiveSignalError::Status(*status)),
                None => Ok(LiveCongestion {
                    congestion: CongestionLevel::Moderate,
                    road_class: None,
                }),
            }
        }
    }

    fn segment(id: &str, aadt: u64, lat: f64, lng: f64) -> RoadSegment {
        RoadSegment {
            id: id.to_string(),
            aadt,
            midpoint: Some(GeoPoint::new(lat, lng)),
        }
    }

    fn settings(fraction: f64, concurrency: usize) -> SamplerSettings {
        SamplerSettings {
            sample_fraction: fraction,
            concurrency,
            timeout: Duration::from_secs(5),
            search_radius_m: 500,
            seed: Some(42),
        }
    }

    #[test]
    fn test_sample_size() {
        assert_eq!(sample_size(0, 0.2), 0);
        assert_eq!(sample_size(10, 0.2), 2);
        assert_eq!(sample_size(11, 0.2), 3);
        assert_eq!(sample_size(3, 0.2), 1);
        assert_eq!(sample_size(5, 1.0), 5);
        assert_eq!(sample_size(5, f64::NAN), 1);
    }

    #[test]
    fn test_selection_is_seeded_and_sorted() {
        let segments: Vec<RoadSegment> = (0..50)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64 * 0.05, -97.0))
            .collect();
        let sampler = LiveSignalSampler::disabled(settings(0.2, 10));

        let first = sampler.select_sample(&segments);
        let second = sampler.select_sample(&segments);
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_selection_skips_segments_without_midpoint() {
        let mut segments = vec![segment("a", 1_000, 30.0, -97.0)];
        segments.push(RoadSegment {
            id: "b".to_string(),
            aadt: 1_000,
            midpoint: None,
        });
        let sampler = LiveSignalSampler::disabled(settings(1.0, 10));
        assert_eq!(sampler.select_sample(&segments), vec![0]);
    }

    #[tokio::test]
    async fn test_disabled_sampler_is_noop() {
        let segments = vec![segment("a", 12_000, 30.0, -97.0)];
        let sampler = LiveSignalSampler::disabled(SamplerSettings::default());
        assert!(!sampler.is_enabled());

        let report = sampler.enrich(&segments, None).await;
        assert!(!report.enabled);
        assert_eq!(report.sampled, 0);
        assert_eq!(report.enriched_count(), 0);
        assert_eq!(report.segments.len(), 1);
        assert!(report.segments[0].comparison.is_none());
    }

    #[tokio::test]
    async fn test_unsampled_segments_inherit_bucket_result() {
        // Four segments in one 0.01-degree bucket; a quarter of them is one query
        let segments = vec![
            segment("a", 12_000, 30.2711, -97.7411),
            segment("b", 12_000, 30.2712, -97.7412),
            segment("c", 12_000, 30.2713, -97.7413),
            segment("d", 12_000, 30.2714, -97.7414),
        ];
        let provider = Arc::new(MockProvider {
            responses: HashMap::from([("30.27,-97.74".to_string(), Ok(CongestionLevel::Severe))]),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider.clone(), settings(0.25, 10));

        let report = sampler.enrich(&segments, None).await;
        assert!(report.enabled);
        assert_eq!(report.sampled, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.enriched_count(), 4);

        let origins: Vec<_> = report.segments.iter().map(|s| s.origin).collect();
        assert_eq!(origins.iter().filter(|o| **o == Some(SignalOrigin::Sampled)).count(), 1);
        assert_eq!(origins.iter().filter(|o| **o == Some(SignalOrigin::Inherited)).count(), 3);

        // moderate expected, severe live: delta 2
        for signal in &report.segments {
            let comparison = signal.comparison.as_ref().unwrap();
            assert_eq!(comparison.delta, 2);
            assert_eq!(comparison.signal, SignalDirection::Growth);
            assert_eq!(comparison.strength, SignalStrength::Strong);
            assert_eq!(signal.bucket.as_deref(), Some("30.27,-97.74"));
        }
    }

    #[tokio::test]
    async fn test_other_buckets_do_not_inherit() {
        let mut segments = vec![
            segment("near", 12_000, 30.2711, -97.7411),
            segment("far", 12_000, 40.0, -80.0),
            segment("nowhere", 12_000, 40.0, -80.0),
        ];
        segments[2].midpoint = None;

        let provider = Arc::new(MockProvider::default());
        let sampler = LiveSignalSampler::new(provider, settings(0.5, 10));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.sampled, 1);
        assert_eq!(report.enriched_count(), 1);
        assert!(report.segments[2].bucket.is_none());
        assert!(report.segments[2].comparison.is_none());
    }

    #[tokio::test]
    async fn test_last_sampled_segment_wins_bucket() {
        let segments = vec![
            segment("first", 12_000, 30.2711, -97.7411),
            segment("second", 12_000, 30.2712, -97.7412),
        ];
        let provider = Arc::new(MockProvider {
            point_responses: HashMap::from([
                ("30.2711,-97.7411".to_string(), CongestionLevel::Low),
                ("30.2712,-97.7412".to_string(), CongestionLevel::Severe),
            ]),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider, settings(1.0, 10));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.succeeded, 2);

        // Each sampled segment keeps its own reading
        assert_eq!(report.segments[0].origin, Some(SignalOrigin::Sampled));
        assert_eq!(report.segments[0].comparison.as_ref().unwrap().delta, -1);
        assert_eq!(report.segments[1].origin, Some(SignalOrigin::Sampled));
        assert_eq!(report.segments[1].comparison.as_ref().unwrap().delta, 2);

        // The bucket holds the later segment's result
        assert_eq!(report.buckets.len(), 1);
        let bucket = report.signal_at(&GeoPoint::new(30.2749, -97.7449)).unwrap();
        assert_eq!(bucket.live, CongestionLevel::Severe);
        assert!(report.signal_at(&GeoPoint::new(31.0, -97.0)).is_none());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let segments = vec![
            segment("ok", 12_000, 30.0, -97.0),
            segment("broken", 12_000, 31.0, -97.0),
        ];
        let provider = Arc::new(MockProvider {
            responses: HashMap::from([
                ("30.00,-97.00".to_string(), Ok(CongestionLevel::Low)),
                ("31.00,-97.00".to_string(), Err(500)),
            ]),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider, settings(1.0, 10));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.sampled, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 0);

        let ok = &report.segments[0];
        let comparison = ok.comparison.as_ref().unwrap();
        assert_eq!(comparison.delta, -1);
        assert_eq!(comparison.signal, SignalDirection::Decline);
        assert!(report.segments[1].comparison.is_none());
    }

    #[tokio::test]
    async fn test_unknown_live_reading_gives_no_signal() {
        let segments = vec![segment("a", 12_000, 30.0, -97.0)];
        let provider = Arc::new(MockProvider {
            responses: HashMap::from([("30.00,-97.00".to_string(), Ok(CongestionLevel::Unknown))]),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider, settings(1.0, 10));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.succeeded, 1);
        assert!(report.buckets.is_empty());
        assert!(report.segments[0].comparison.is_none());
    }

    #[tokio::test]
    async fn test_concurrency_limit_holds() {
        let segments: Vec<RoadSegment> = (0..20)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64 * 0.1, -97.0))
            .collect();
        let provider = Arc::new(MockProvider {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider.clone(), settings(1.0, 3));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.succeeded, 20);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 20);
        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 3);
        let queried = provider.queried.lock().unwrap();
        assert_eq!(queried.len(), 20);
        assert!(segments.iter().all(|s| queried.contains(&s.midpoint.unwrap())));
    }

    #[tokio::test]
    async fn test_per_query_timeout() {
        let segments = vec![segment("slow", 12_000, 30.0, -97.0)];
        let provider = Arc::new(MockProvider {
            delay: Duration::from_millis(500),
            ..Default::default()
        });
        let mut settings = settings(1.0, 10);
        settings.timeout = Duration::from_millis(20);
        let sampler = LiveSignalSampler::new(provider, settings);

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.enriched_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_drops_outstanding_queries() {
        let segments: Vec<RoadSegment> = (0..4)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64, -97.0))
            .collect();
        let provider = Arc::new(MockProvider {
            delay: Duration::from_millis(500),
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider, settings(1.0, 10));

        let deadline = Instant::now() + Duration::from_millis(30);
        let report = sampler.enrich(&segments, Some(deadline)).await;
        assert!(report.deadline_exceeded);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.segments.len(), 4);
    }

    #[tokio::test]
    async fn test_auth_rejection_stops_feeding() {
        let segments: Vec<RoadSegment> = (0..10)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64, -97.0))
            .collect();
        let responses = (0..10)
            .map(|i| (GeoPoint::new(30.0 + i as f64, -97.0).bucket_key(), Err(401)))
            .collect();
        let provider = Arc::new(MockProvider {
            responses,
            ..Default::default()
        });
        let sampler = LiveSignalSampler::new(provider.clone(), settings(1.0, 1));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 9);
    }

    #[tokio::test]
    async fn test_queued_queries_after_auth_rejection_are_skipped() {
        let segments: Vec<RoadSegment> = (0..10)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64, -97.0))
            .collect();
        let responses = (0..10)
            .map(|i| (GeoPoint::new(30.0 + i as f64, -97.0).bucket_key(), Err(403)))
            .collect();
        let provider = Arc::new(MockProvider {
            responses,
            ..Default::default()
        });
        // Two queries primed; the second starts after the first was rejected
        let sampler = LiveSignalSampler::new(provider.clone(), settings(1.0, 2));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 9);
        assert_eq!(report.succeeded, 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_queries() {
        let segments: Vec<RoadSegment> = (0..5)
            .map(|i| segment(&format!("s{}", i), 10_000, 30.0 + i as f64, -97.0))
            .collect();
        let provider = Arc::new(MockProvider::default());
        let sampler = LiveSignalSampler::new(provider.clone(), settings(1.0, 0));

        let report = sampler.enrich(&segments, None).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.skipped, 0);
        assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
