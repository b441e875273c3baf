use serde::{Deserialize, Serialize};

/// Ordinal congestion scale. The discriminants matter: comparisons subtract them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CongestionLevel {
    Unknown = 0,
    Low = 1,
    Moderate = 2,
    Heavy = 3,
    Severe = 4,
}

impl CongestionLevel {
    pub fn ordinal(self) -> i32 {
        self as i32
    }

    /// Parse a provider congestion string. Unrecognised values map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "light" | "free_flow" => CongestionLevel::Low,
            "moderate" | "medium" => CongestionLevel::Moderate,
            "heavy" | "high" => CongestionLevel::Heavy,
            "severe" | "standstill" | "blocked" => CongestionLevel::Severe,
            _ => CongestionLevel::Unknown,
        }
    }

    /// Congestion a road segment would typically show for its AADT count
    pub fn expected_from_aadt(aadt: u64) -> Self {
        match aadt {
            0 => CongestionLevel::Unknown,
            1..=4_999 => CongestionLevel::Low,
            5_000..=19_999 => CongestionLevel::Moderate,
            20_000..=49_999 => CongestionLevel::Heavy,
            _ => CongestionLevel::Severe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Growth,
    Decline,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Moderate,
    Weak,
}

/// Map a live-minus-expected congestion delta onto a traffic signal
pub fn classify_delta(delta: i32) -> (SignalDirection, SignalStrength) {
    match delta {
        d if d >= 2 => (SignalDirection::Growth, SignalStrength::Strong),
        1 => (SignalDirection::Growth, SignalStrength::Moderate),
        d if d <= -2 => (SignalDirection::Decline, SignalStrength::Strong),
        -1 => (SignalDirection::Decline, SignalStrength::Moderate),
        _ => (SignalDirection::Stable, SignalStrength::Weak),
    }
}

/// Live congestion reading compared against the AADT expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionComparison {
    pub live: CongestionLevel,
    pub expected: CongestionLevel,
    pub delta: i32,
    pub signal: SignalDirection,
    pub strength: SignalStrength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_class: Option<String>,
}

/// Compare a live reading with the expected level. `None` when either side is unknown.
pub fn compare_congestion(
    live: CongestionLevel,
    expected: CongestionLevel,
    road_class: Option<String>,
) -> Option<CongestionComparison> {
    if live == CongestionLevel::Unknown || expected == CongestionLevel::Unknown {
        return None;
    }

    let delta = live.ordinal() - expected.ordinal();
    let (signal, strength) = classify_delta(delta);

    Some(CongestionComparison {
        live,
        expected,
        delta,
        signal,
        strength,
        road_class,
    })
}
