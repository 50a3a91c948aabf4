use crate::config::{RefineConfig, ScoringConfig};
use crate::mask::{self, morphology, Mask};

/// Metrics for one frame, derived purely from a (body, target) mask pair.
/// Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub overlap_pixels: u64,
    pub target_area_pixels: u64,
    pub body_area_pixels: u64,
    /// Share of the target silhouette covered by the body, boosted and
    /// clamped to [0, 100]. The primary win metric.
    pub coverage_percent: f32,
    /// Body pixels outside the target, relative to target area, clamped to
    /// [0, 100].
    pub excess_percent: f32,
}

/// Quantifies how well a body mask fills the target silhouette.
///
/// The body mask is resized to the target's dimensions (nearest neighbor)
/// and run through the expand-and-trim refinement before counting, so the
/// metrics are comparable across capture resolutions.
pub struct Scorer {
    target: Mask,
    target_area: u64,
    scoring: ScoringConfig,
    refine: RefineConfig,
}

impl Scorer {
    pub fn new(target: Mask, scoring: ScoringConfig, refine: RefineConfig) -> Self {
        let target_area = mask::foreground_pixels(&target);
        Self {
            target,
            target_area,
            scoring,
            refine,
        }
    }

    pub fn target(&self) -> &Mask {
        &self.target
    }

    /// Score one body mask against the target.
    pub fn score(&self, body: &Mask) -> ScoreResult {
        let (width, height) = self.target.dimensions();
        let resized = mask::resize_nearest(body, width, height);
        let refined = morphology::expand_and_trim(
            &resized,
            self.refine.score_kernel,
            self.refine.score_dilate_iters,
            self.refine.score_erode_iters,
        );

        let mut overlap: u64 = 0;
        let mut body_area: u64 = 0;
        for (b, t) in refined.pixels().zip(self.target.pixels()) {
            if b[0] > 0 {
                body_area += 1;
                if t[0] > 0 {
                    overlap += 1;
                }
            }
        }

        // Zero-area target: both percentages are defined as 0
        let (coverage, excess) = if self.target_area == 0 {
            (0.0, 0.0)
        } else {
            let excess = ((body_area - overlap) as f32 / self.target_area as f32 * 100.0)
                .clamp(0.0, 100.0);
            let raw = overlap as f32 / self.target_area as f32 * 100.0;
            // Optional penalty for spilling outside the target, then the
            // calibration boost that offsets systematic under-segmentation
            let damped = raw * (1.0 - excess * self.scoring.excess_damping).max(0.0);
            let boosted = (damped * self.scoring.coverage_boost).clamp(0.0, 100.0);
            (boosted, excess)
        };

        tracing::debug!(
            "score: overlap={} target={} body={} coverage={:.1}% excess={:.1}%",
            overlap,
            self.target_area,
            body_area,
            coverage,
            excess
        );

        ScoreResult {
            overlap_pixels: overlap,
            target_area_pixels: self.target_area,
            body_area_pixels: body_area,
            coverage_percent: coverage,
            excess_percent: excess,
        }
    }
}
