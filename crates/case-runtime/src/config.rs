//! Engine configuration
//!
//! One JSON document configures every component. Durations are written the
//! human way (`"80ms"`, `"1s"`) and parsed with `humantime`; omitted fields
//! keep their defaults.

use std::time::Duration;

use case_core::{duration_to_ms, ms_to_duration, CaseError, CaseResult};
use case_time::{ClockSource, TimerConfig};
use case_visual::ResolverConfig;
use case_voice::TimelineConfig;
use serde::{Deserialize, Deserializer};

use crate::{LogConfig, PerformerConfig};

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineSection {
    #[serde(deserialize_with = "human_duration")]
    pub rest_gap_threshold: Duration,
    pub merge_adjacent: bool,
    #[serde(deserialize_with = "human_duration")]
    pub rest_hold: Duration,
}

impl Default for TimelineSection {
    fn default() -> Self {
        let defaults = TimelineConfig::default();
        TimelineSection {
            rest_gap_threshold: ms_to_duration(defaults.rest_gap_threshold_ms),
            merge_adjacent: defaults.merge_adjacent,
            rest_hold: ms_to_duration(defaults.rest_hold_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSection {
    #[serde(deserialize_with = "human_duration")]
    pub viseme_blend_in: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub mouth_close_blend: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub min_duration: Duration,
    pub hold_expression: bool,
    #[serde(deserialize_with = "human_duration")]
    pub expression_release: Duration,
}

impl Default for ResolverSection {
    fn default() -> Self {
        let defaults = ResolverConfig::default();
        ResolverSection {
            viseme_blend_in: ms_to_duration(defaults.viseme_blend_in_ms),
            mouth_close_blend: ms_to_duration(defaults.mouth_close_blend_ms),
            min_duration: ms_to_duration(defaults.min_duration_ms),
            hold_expression: defaults.hold_expression,
            expression_release: ms_to_duration(defaults.expression_release_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockSection {
    /// `audio`, `wall` or `manual`
    pub source: String,
    #[serde(deserialize_with = "human_duration")]
    pub max_step: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub drift_warn: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub audio_timeout: Duration,
}

impl Default for ClockSection {
    fn default() -> Self {
        let defaults = TimerConfig::default();
        ClockSection {
            source: "audio".to_owned(),
            max_step: defaults.max_step,
            drift_warn: defaults.drift_warn,
            audio_timeout: defaults.audio_timeout,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformerSection {
    pub queue_capacity: usize,
    /// Release blend for targets the next turn does not drive
    #[serde(deserialize_with = "human_duration")]
    pub release: Duration,
}

impl Default for PerformerSection {
    fn default() -> Self {
        let defaults = PerformerConfig::default();
        PerformerSection {
            queue_capacity: defaults.queue_capacity,
            release: ms_to_duration(defaults.release_ms),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub timeline: TimelineSection,
    pub resolver: ResolverSection,
    pub clock: ClockSection,
    pub performer: PerformerSection,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> CaseResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| CaseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CaseResult<()> {
        if self.performer.queue_capacity == 0 {
            return Err(CaseError::Config(
                "performer.queue_capacity must be at least 1".into(),
            ));
        }
        if self.clock.max_step.is_zero() {
            return Err(CaseError::Config("clock.max_step must be positive".into()));
        }
        self.clock_source()?;
        Ok(())
    }

    fn clock_source(&self) -> CaseResult<ClockSource> {
        ClockSource::from_name(&self.clock.source).ok_or_else(|| {
            CaseError::Config(format!("unknown clock source `{}`", self.clock.source))
        })
    }

    pub fn timeline_config(&self) -> TimelineConfig {
        TimelineConfig {
            rest_gap_threshold_ms: duration_to_ms(self.timeline.rest_gap_threshold),
            merge_adjacent: self.timeline.merge_adjacent,
            rest_hold_ms: duration_to_ms(self.timeline.rest_hold),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            viseme_blend_in_ms: duration_to_ms(self.resolver.viseme_blend_in),
            mouth_close_blend_ms: duration_to_ms(self.resolver.mouth_close_blend),
            min_duration_ms: duration_to_ms(self.resolver.min_duration),
            hold_expression: self.resolver.hold_expression,
            expression_release_ms: duration_to_ms(self.resolver.expression_release),
        }
    }

    pub fn timer_config(&self) -> CaseResult<TimerConfig> {
        Ok(TimerConfig {
            source: self.clock_source()?,
            max_step: self.clock.max_step,
            drift_warn: self.clock.drift_warn,
            audio_timeout: self.clock.audio_timeout,
        })
    }

    pub fn performer_config(&self) -> CaseResult<PerformerConfig> {
        Ok(PerformerConfig {
            timer: self.timer_config()?,
            queue_capacity: self.performer.queue_capacity,
            release_ms: duration_to_ms(self.performer.release),
        })
    }
}
