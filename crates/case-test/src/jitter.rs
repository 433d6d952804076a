//! Frame jitter for playback testing
//!
//! Simulates hostile render loops:
//! - Uneven frame deltas
//! - Occasional stalls (long frames)
//! - Zero-length frames

use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Jitter distribution type
#[derive(Clone, Debug)]
pub enum JitterDistribution {
    /// Uniform distribution
    Uniform { min_ms: u32, max_ms: u32 },
    /// Normal distribution (mean, stddev)
    Normal { mean_ms: f64, stddev_ms: f64 },
    /// Pareto distribution (heavy tail)
    Pareto { scale_ms: f64, shape: f64 },
}

impl JitterDistribution {
    /// Sample a jitter value
    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        match self {
            JitterDistribution::Uniform { min_ms, max_ms } => {
                if min_ms >= max_ms {
                    return Duration::from_millis(*min_ms as u64);
                }
                let dist = Uniform::new(*min_ms, *max_ms);
                Duration::from_millis(dist.sample(rng) as u64)
            }
            JitterDistribution::Normal { mean_ms, stddev_ms } => {
                // Box-Muller
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
                let value = mean_ms + stddev_ms * z;
                Duration::from_millis(value.max(0.0) as u64)
            }
            JitterDistribution::Pareto { scale_ms, shape } => {
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                let value = scale_ms / u.powf(1.0 / shape);
                Duration::from_millis(value.min(1000.0) as u64)
            }
        }
    }
}

/// Render loop jitter configuration
#[derive(Clone, Debug)]
pub struct JitterConfig {
    /// Nominal frame time
    pub frame: Duration,
    /// Added on top of `frame`
    pub jitter: JitterDistribution,
    /// Probability of a stall frame
    pub stall_prob: f64,
    /// Length of a stall frame
    pub stall: Duration,
    /// Probability of a zero-length frame
    pub zero_prob: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        JitterConfig {
            frame: Duration::from_millis(16),
            jitter: JitterDistribution::Uniform {
                min_ms: 0,
                max_ms: 4,
            },
            stall_prob: 0.0,
            stall: Duration::from_millis(250),
            zero_prob: 0.0,
        }
    }
}

impl JitterConfig {
    /// Fixed 60 Hz
    pub fn steady() -> Self {
        JitterConfig {
            jitter: JitterDistribution::Uniform {
                min_ms: 0,
                max_ms: 0,
            },
            ..Default::default()
        }
    }

    /// Busy host: noisy frames, some stalls
    pub fn uneven() -> Self {
        JitterConfig {
            frame: Duration::from_millis(16),
            jitter: JitterDistribution::Normal {
                mean_ms: 4.0,
                stddev_ms: 6.0,
            },
            stall_prob: 0.02,
            stall: Duration::from_millis(120),
            zero_prob: 0.02,
        }
    }

    /// Overloaded host: heavy-tailed frames, frequent stalls
    pub fn hostile() -> Self {
        JitterConfig {
            frame: Duration::from_millis(33),
            jitter: JitterDistribution::Pareto {
                scale_ms: 5.0,
                shape: 1.2,
            },
            stall_prob: 0.1,
            stall: Duration::from_millis(400),
            zero_prob: 0.05,
        }
    }
}

/// Seeded source of frame deltas
pub struct ClockJitter {
    config: JitterConfig,
    rng: StdRng,
    stats: JitterStats,
}

#[derive(Clone, Debug, Default)]
pub struct JitterStats {
    pub frames: u64,
    pub stalls: u64,
    pub zero_frames: u64,
    pub total: Duration,
    pub max_frame: Duration,
}

impl ClockJitter {
    pub fn new(config: JitterConfig, seed: u64) -> Self {
        ClockJitter {
            config,
            rng: StdRng::seed_from_u64(seed),
            stats: JitterStats::default(),
        }
    }

    /// Delta for the next frame
    pub fn next_delta(&mut self) -> Duration {
        self.stats.frames += 1;

        let delta = if self.rng.gen::<f64>() < self.config.zero_prob {
            self.stats.zero_frames += 1;
            Duration::ZERO
        } else if self.rng.gen::<f64>() < self.config.stall_prob {
            self.stats.stalls += 1;
            self.config.stall
        } else {
            self.config.frame + self.config.jitter.sample(&mut self.rng)
        };

        self.stats.total += delta;
        self.stats.max_frame = self.stats.max_frame.max(delta);
        delta
    }

    pub fn stats(&self) -> &JitterStats {
        &self.stats
    }
}

impl Iterator for ClockJitter {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delta())
    }
}
