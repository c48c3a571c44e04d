//! Burst generator shared by both renderers.
//!
//! One count, base duration and base speed are drawn per burst; each spark
//! then gets its own size, direction and jitter. Colors cycle by index.

use rand::Rng;

use crate::config::Config;
use crate::random::{random_float, random_int};

pub const SPEED_JITTER: (f32, f32) = (0.7, 1.15);
pub const DURATION_JITTER: (f32, f32) = (0.8, 1.2);
/// Floor on a spark's final lifetime.
pub const MIN_LIFE_MS: u32 = 150;

/// One sampled spark, not yet placed on any surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Spark {
    pub size: u32,
    pub color: String,
    /// Direction in radians, `[0, 2π)`.
    pub angle: f32,
    /// Base speed times this spark's jitter, px/sec.
    pub speed: f32,
    pub duration_ms: u32,
}

impl Spark {
    pub fn velocity(&self) -> (f32, f32) {
        (self.angle.cos() * self.speed, self.angle.sin() * self.speed)
    }

    /// Where the spark ends up after its whole lifetime.
    pub fn displacement(&self) -> (f32, f32) {
        let distance = self.speed * self.duration_ms as f32 / 1000.0;
        (self.angle.cos() * distance, self.angle.sin() * distance)
    }
}

pub fn sample<R: Rng>(rng: &mut R, config: &Config) -> Vec<Spark> {
    let count = random_int(rng, config.particle_count.min, config.particle_count.max);
    let base_duration = random_int(rng, config.duration_ms.min, config.duration_ms.max);
    let base_speed = random_float(
        rng,
        config.speed_px_per_second.min,
        config.speed_px_per_second.max,
    );

    (0..count as usize)
        .map(|i| {
            let size = random_int(rng, config.particle_size_px.min, config.particle_size_px.max);
            let color = config.colors[i % config.colors.len()].clone();
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed_jitter = random_float(rng, SPEED_JITTER.0, SPEED_JITTER.1);
            let duration_jitter = random_float(rng, DURATION_JITTER.0, DURATION_JITTER.1);
            let duration = (base_duration as f32 * duration_jitter).round() as u32;
            Spark {
                size,
                color,
                angle,
                speed: base_speed * speed_jitter,
                duration_ms: duration.max(MIN_LIFE_MS),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartialConfig, PartialSpan};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(count: u32, colors: &[&str]) -> Config {
        Config::merged(&PartialConfig {
            particle_count: Some(PartialSpan { min: Some(count), max: Some(count) }),
            colors: Some(colors.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        })
    }

    #[test]
    fn count_size_life_and_color_cycle() {
        let mut rng = StdRng::seed_from_u64(7);
        let cfg = config(9, &["a", "b", "c", "d"]);
        let sparks = sample(&mut rng, &cfg);
        assert_eq!(sparks.len(), 9);
        for (i, s) in sparks.iter().enumerate() {
            assert_eq!(s.color, cfg.colors[i % 4]);
            assert!((cfg.particle_size_px.min..=cfg.particle_size_px.max).contains(&s.size));
            assert!(s.duration_ms >= MIN_LIFE_MS);
            assert!((0.0..std::f32::consts::TAU).contains(&s.angle));
        }
    }

    #[test]
    fn short_durations_are_floored() {
        let mut rng = StdRng::seed_from_u64(8);
        let cfg = Config::merged(&PartialConfig {
            duration_ms: Some(PartialSpan { min: Some(10), max: Some(10) }),
            ..Default::default()
        });
        assert!(sample(&mut rng, &cfg).iter().all(|s| s.duration_ms == MIN_LIFE_MS));
    }

    #[test]
    fn speeds_share_one_base() {
        let mut rng = StdRng::seed_from_u64(9);
        let cfg = Config::merged(&PartialConfig {
            speed_px_per_second: Some(PartialSpan { min: Some(100.0), max: Some(100.0) }),
            ..Default::default()
        });
        for s in sample(&mut rng, &cfg) {
            assert!(s.speed >= 100.0 * SPEED_JITTER.0 - 1e-3);
            assert!(s.speed <= 100.0 * SPEED_JITTER.1 + 1e-3);
        }
    }

    #[test]
    fn displacement_matches_speed_and_duration() {
        let s = Spark { size: 4, color: "#fff".into(), angle: 0.0, speed: 200.0, duration_ms: 500 };
        let (dx, dy) = s.displacement();
        assert!((dx - 100.0).abs() < 1e-4);
        assert!(dy.abs() < 1e-4);
    }
}
