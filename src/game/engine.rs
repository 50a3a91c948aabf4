use super::win::{WinJudge, WinState};
use crate::mask::Mask;
use crate::scoring::{ScoreResult, Scorer};
use crate::segmentation::ForegroundEstimator;
use image::RgbImage;
use std::time::Instant;

/// Callback fired once per `Idle -> Won` transition with the winning frame.
pub type OnWin = Box<dyn FnMut(&RgbImage)>;

/// Outcome of processing one frame.
pub struct TickResult {
    pub score: ScoreResult,
    /// Refined body mask at frame resolution, for visualization
    pub body_mask: Mask,
    /// True exactly on the tick that entered the won state
    pub won_this_tick: bool,
}

/// Frame-synchronous scoring engine: estimate -> score -> debounce.
///
/// Owns every piece of long-lived mutable state in the core: the background
/// model (inside the estimator), the win state (inside the judge), the last
/// score snapshot, and the injected on-win side effect. Ticks with no
/// available frame never reach the engine, so a dropped frame mutates
/// nothing.
pub struct GameEngine {
    estimator: ForegroundEstimator,
    scorer: Scorer,
    judge: WinJudge,
    on_win: Option<OnWin>,
    last_score: Option<ScoreResult>,
}

impl GameEngine {
    pub fn new(estimator: ForegroundEstimator, scorer: Scorer, judge: WinJudge) -> Self {
        Self {
            estimator,
            scorer,
            judge,
            on_win: None,
            last_score: None,
        }
    }

    /// Inject the side effect to run when a win is entered (e.g. saving a
    /// snapshot of the triggering frame).
    pub fn set_on_win(&mut self, callback: OnWin) {
        self.on_win = Some(callback);
    }

    /// Process one captured frame.
    pub fn tick(&mut self, frame: &RgbImage, now: Instant) -> TickResult {
        let body_mask = self.estimator.estimate(frame);
        let score = self.scorer.score(&body_mask);
        let won_this_tick = self.judge.update(&score, now);

        if won_this_tick {
            tracing::info!(
                "Win entered: coverage {:.1}%, excess {:.1}%",
                score.coverage_percent,
                score.excess_percent
            );
            if let Some(on_win) = self.on_win.as_mut() {
                on_win(frame);
            }
        }

        self.last_score = Some(score);
        TickResult {
            score,
            body_mask,
            won_this_tick,
        }
    }

    pub fn win_state(&self) -> WinState {
        self.judge.state()
    }

    /// Most recent scoring snapshot, for consumers that render between ticks.
    pub fn last_score(&self) -> Option<ScoreResult> {
        self.last_score
    }

    pub fn target(&self) -> &Mask {
        self.scorer.target()
    }

    /// Drop all temporal state and return to idle.
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.judge.reset();
        self.last_score = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BackgroundConfig, RefineConfig, ScoringConfig, SegmentationConfig, WinConfig,
    };
    use crate::mask::FOREGROUND;
    use crate::segmentation::{BackgroundModel, SegmentationModel};
    use anyhow::Result;
    use image::Luma;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    struct FullFrameModel;

    impl SegmentationModel for FullFrameModel {
        fn segment(&mut self, frame: &RgbImage) -> Result<Mask> {
            let (w, h) = frame.dimensions();
            Ok(Mask::from_pixel(w, h, Luma([FOREGROUND])))
        }

        fn input_size(&self) -> (u32, u32) {
            (8, 8)
        }
    }

    fn test_engine() -> GameEngine {
        let estimator = ForegroundEstimator::new(
            Some(Box::new(FullFrameModel)),
            BackgroundModel::new(BackgroundConfig {
                warmup_frames: 0,
                blur_sigma: 0.0,
                ..BackgroundConfig::default()
            }),
            SegmentationConfig {
                // The fake model legitimately fills the whole frame; keep
                // the inversion heuristic out of the way
                inversion_fraction: 1.1,
                ..SegmentationConfig::default()
            },
            RefineConfig {
                smooth_dilate_iters: 0,
                smooth_close_iters: 0,
                score_dilate_iters: 0,
                score_erode_iters: 0,
                ..RefineConfig::default()
            },
        );
        let target = Mask::from_pixel(8, 8, Luma([FOREGROUND]));
        let scorer = Scorer::new(
            target,
            ScoringConfig {
                coverage_boost: 1.0,
                excess_damping: 0.0,
            },
            RefineConfig {
                score_dilate_iters: 0,
                score_erode_iters: 0,
                ..RefineConfig::default()
            },
        );
        let judge = WinJudge::new(&WinConfig {
            threshold: 95.0,
            excess_ceiling: 50.0,
            cooldown_secs: 3.0,
        });
        GameEngine::new(estimator, scorer, judge)
    }

    #[test]
    fn test_on_win_fires_exactly_once_per_entry() {
        let mut engine = test_engine();
        let fired = Rc::new(Cell::new(0u32));
        let counter = fired.clone();
        engine.set_on_win(Box::new(move |_frame| {
            counter.set(counter.get() + 1);
        }));

        let frame = RgbImage::new(8, 8);
        let t0 = Instant::now();

        let first = engine.tick(&frame, t0);
        assert!(first.won_this_tick);
        assert!((first.score.coverage_percent - 100.0).abs() < 1e-4);

        // Coverage stays at 100 but the celebration suppresses re-entry
        for i in 1..5 {
            let tick = engine.tick(&frame, t0 + Duration::from_millis(33 * i));
            assert!(!tick.won_this_tick);
            assert!(engine.win_state().is_winning);
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_last_score_snapshot_persists() {
        let mut engine = test_engine();
        assert!(engine.last_score().is_none());
        let frame = RgbImage::new(8, 8);
        engine.tick(&frame, Instant::now());
        let snapshot = engine.last_score().unwrap();
        assert!((snapshot.coverage_percent - 100.0).abs() < 1e-4);
        assert_eq!(snapshot.excess_percent, 0.0);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut engine = test_engine();
        let frame = RgbImage::new(8, 8);
        engine.tick(&frame, Instant::now());
        assert!(engine.win_state().is_winning);

        engine.reset();
        assert!(!engine.win_state().is_winning);
        assert!(engine.last_score().is_none());
    }
}
