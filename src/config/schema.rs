use serde::{Deserialize, Serialize};

use crate::live::LiveSamplingConfig;
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
    #[serde(default)]
    pub live_sampling: Option<LiveSamplingConfig>,
}

impl Config {
    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn live_sampling(&self) -> LiveSamplingConfig {
        self.live_sampling.clone().unwrap_or_default()
    }
}
