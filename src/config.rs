use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Game configuration, loaded from a TOML file.
///
/// Every field has a default so a missing file or an empty document yields a
/// playable setup. Values here are tuning knobs, not invariants.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub refine: RefineConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub win: WinConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SegmentationConfig {
    /// Model input edge length (square)
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Probability above which a pixel counts as foreground
    #[serde(default = "default_foreground_threshold")]
    pub foreground_threshold: f32,
    /// Foreground fraction above which the model mask is assumed inverted
    #[serde(default = "default_inversion_fraction")]
    pub inversion_fraction: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackgroundConfig {
    /// Frames spent seeding the background model before any detection
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
    /// Blend factor while seeding
    #[serde(default = "default_seed_alpha")]
    pub seed_alpha: f32,
    /// Blend factor after warm-up (slow drift adaptation)
    #[serde(default = "default_adapt_alpha")]
    pub adapt_alpha: f32,
    /// Absolute intensity difference that marks a pixel as moving
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: u8,
    /// Gaussian blur sigma applied to the grayscale frame
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefineConfig {
    /// Square kernel edge for the estimator smoothing pass
    #[serde(default = "default_smooth_kernel")]
    pub smooth_kernel: u32,
    #[serde(default = "default_smooth_dilate_iters")]
    pub smooth_dilate_iters: u32,
    #[serde(default = "default_smooth_close_iters")]
    pub smooth_close_iters: u32,
    /// Square kernel edge for the scoring expand-and-trim pass
    #[serde(default = "default_score_kernel")]
    pub score_kernel: u32,
    #[serde(default = "default_score_dilate_iters")]
    pub score_dilate_iters: u32,
    #[serde(default = "default_score_erode_iters")]
    pub score_erode_iters: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Multiplier applied to raw coverage to offset under-segmentation
    #[serde(default = "default_coverage_boost")]
    pub coverage_boost: f32,
    /// Coverage is scaled by (1 - excess_percent * excess_damping); 0 = off
    #[serde(default = "default_excess_damping")]
    pub excess_damping: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WinConfig {
    /// Coverage percent required to enter the won state
    #[serde(default = "default_win_threshold")]
    pub threshold: f32,
    /// Excess percent at or above which a win is refused
    #[serde(default = "default_excess_ceiling")]
    pub excess_ceiling: f32,
    /// Seconds the won state holds before resetting
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f32,
}

fn default_input_size() -> u32 { 256 }
fn default_foreground_threshold() -> f32 { 0.5 }
fn default_inversion_fraction() -> f32 { 0.7 }
fn default_warmup_frames() -> u32 { 10 }
fn default_seed_alpha() -> f32 { 0.5 }
fn default_adapt_alpha() -> f32 { 0.01 }
fn default_diff_threshold() -> u8 { 15 }
fn default_blur_sigma() -> f32 { 3.5 }
fn default_smooth_kernel() -> u32 { 9 }
fn default_smooth_dilate_iters() -> u32 { 3 }
fn default_smooth_close_iters() -> u32 { 3 }
fn default_score_kernel() -> u32 { 11 }
fn default_score_dilate_iters() -> u32 { 5 }
fn default_score_erode_iters() -> u32 { 1 }
fn default_coverage_boost() -> f32 { 1.25 }
fn default_excess_damping() -> f32 { 0.0 }
fn default_win_threshold() -> f32 { 95.0 }
fn default_excess_ceiling() -> f32 { 50.0 }
fn default_cooldown_secs() -> f32 { 3.0 }

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            input_size: default_input_size(),
            foreground_threshold: default_foreground_threshold(),
            inversion_fraction: default_inversion_fraction(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            warmup_frames: default_warmup_frames(),
            seed_alpha: default_seed_alpha(),
            adapt_alpha: default_adapt_alpha(),
            diff_threshold: default_diff_threshold(),
            blur_sigma: default_blur_sigma(),
        }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            smooth_kernel: default_smooth_kernel(),
            smooth_dilate_iters: default_smooth_dilate_iters(),
            smooth_close_iters: default_smooth_close_iters(),
            score_kernel: default_score_kernel(),
            score_dilate_iters: default_score_dilate_iters(),
            score_erode_iters: default_score_erode_iters(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            coverage_boost: default_coverage_boost(),
            excess_damping: default_excess_damping(),
        }
    }
}

impl Default for WinConfig {
    fn default() -> Self {
        Self {
            threshold: default_win_threshold(),
            excess_ceiling: default_excess_ceiling(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {}", path.as_ref().display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config")?;
        Ok(config)
    }
}
