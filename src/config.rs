//! Effect configuration: the effective snapshot and the partial overlay
//! callers (or TOML files) supply.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Inclusive `{min, max}` pair. `min == max` is a valid single-value range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

/// Effective configuration, every field resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub burst_interval_ms: u32,
    pub size_check_interval_ms: u32,
    pub particle_count: Span<u32>,
    pub duration_ms: Span<u32>,
    pub speed_px_per_second: Span<f32>,
    pub particle_size_px: Span<u32>,
    pub colors: Vec<String>,
    pub z_index: i32,
    pub use_canvas: bool,
}

pub const DEFAULT_COLORS: [&str; 6] = [
    "#ff3b3b", "#ff9f1c", "#ffd93d", "#6bffb8", "#46b3ff", "#b15eff",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            burst_interval_ms: 400,
            size_check_interval_ms: 400,
            particle_count: Span::new(16, 40),
            duration_ms: Span::new(600, 2400),
            speed_px_per_second: Span::new(120.0, 200.0),
            particle_size_px: Span::new(2, 20),
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            z_index: 1,
            use_canvas: true,
        }
    }
}

/// Range with either bound optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSpan<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

/// What a caller hands to `create` / `update_config`. Each field defaults
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub burst_interval_ms: Option<u32>,
    pub size_check_interval_ms: Option<u32>,
    pub particle_count: Option<PartialSpan<u32>>,
    pub duration_ms: Option<PartialSpan<u32>>,
    pub speed_px_per_second: Option<PartialSpan<f32>>,
    pub particle_size_px: Option<PartialSpan<u32>>,
    pub colors: Option<Vec<String>>,
    pub z_index: Option<i32>,
    pub use_canvas: Option<bool>,
}

impl PartialConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Config {
    /// Overlay `partial` onto the defaults, field by field.
    pub fn merged(partial: &PartialConfig) -> Self {
        let d = Config::default();

        let colors = match &partial.colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => d.colors,
        };

        let speed = partial.speed_px_per_second.map(|s| PartialSpan {
            min: s.min.filter(|v| v.is_finite()),
            max: s.max.filter(|v| v.is_finite()),
        });
        let mut speed_px_per_second =
            merge_span("speed_px_per_second", speed, d.speed_px_per_second);
        if !(speed_px_per_second.max - speed_px_per_second.min).is_finite() {
            warn!("speed_px_per_second: range {speed_px_per_second:?} too wide, using defaults");
            speed_px_per_second = d.speed_px_per_second;
        }

        Self {
            burst_interval_ms: partial.burst_interval_ms.unwrap_or(d.burst_interval_ms).max(1),
            size_check_interval_ms: partial
                .size_check_interval_ms
                .unwrap_or(d.size_check_interval_ms)
                .max(1),
            particle_count: merge_span("particle_count", partial.particle_count, d.particle_count),
            duration_ms: merge_span("duration_ms", partial.duration_ms, d.duration_ms),
            speed_px_per_second,
            particle_size_px: merge_span("particle_size_px", partial.particle_size_px, d.particle_size_px),
            colors,
            z_index: partial.z_index.unwrap_or(d.z_index),
            use_canvas: partial.use_canvas.unwrap_or(d.use_canvas),
        }
    }
}

/// Overlay one range. A supplied bound always wins over a defaulted one, so
/// `{min: 50}` against a default max of 40 collapses to `50..=50`.
fn merge_span<T>(field: &str, partial: Option<PartialSpan<T>>, default: Span<T>) -> Span<T>
where
    T: Copy + PartialOrd + std::fmt::Debug,
{
    let partial = partial.unwrap_or(PartialSpan { min: None, max: None });
    let min = partial.min.unwrap_or(default.min);
    let max = partial.max.unwrap_or(default.max);
    if min <= max {
        return Span::new(min, max);
    }

    warn!("{field}: min {min:?} > max {max:?}, normalizing");
    match (partial.min.is_some(), partial.max.is_some()) {
        (true, false) => Span::new(min, min),
        (false, true) => Span::new(max, max),
        _ => Span::new(max, min),
    }
}
