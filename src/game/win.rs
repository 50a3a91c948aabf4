use crate::config::WinConfig;
use crate::scoring::ScoreResult;
use std::time::{Duration, Instant};

/// Win/lose state as seen by consumers.
///
/// `won_at` is set exactly while `is_winning` is true (the won state spans
/// the cooldown window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinState {
    pub is_winning: bool,
    pub won_at: Option<Instant>,
}

/// Debounces the coverage stream into a win signal with hysteresis.
///
/// `Idle -> Won` when coverage clears the threshold with acceptable excess;
/// `Won -> Idle` once the cooldown elapses. While won, re-entry is
/// suppressed so score jitter around the threshold cannot re-trigger the
/// side effect.
///
/// Time is passed in by the caller, which keeps the state machine
/// deterministic under test.
pub struct WinJudge {
    threshold: f32,
    excess_ceiling: f32,
    cooldown: Duration,
    won_at: Option<Instant>,
}

impl WinJudge {
    pub fn new(config: &WinConfig) -> Self {
        Self {
            threshold: config.threshold,
            excess_ceiling: config.excess_ceiling,
            cooldown: Duration::from_secs_f32(config.cooldown_secs),
            won_at: None,
        }
    }

    /// Advance the state machine by one scored frame. Returns true exactly
    /// when the `Idle -> Won` transition happens.
    pub fn update(&mut self, score: &ScoreResult, now: Instant) -> bool {
        let mut entered = false;
        if self.won_at.is_none()
            && score.coverage_percent >= self.threshold
            && score.excess_percent < self.excess_ceiling
        {
            self.won_at = Some(now);
            entered = true;
        }

        // The celebration holds for the full cooldown, then resets. A
        // sustained high score can win again on the following tick.
        if let Some(at) = self.won_at {
            if !entered && now.duration_since(at) > self.cooldown {
                self.won_at = None;
            }
        }

        entered
    }

    pub fn is_winning(&self) -> bool {
        self.won_at.is_some()
    }

    pub fn state(&self) -> WinState {
        WinState {
            is_winning: self.won_at.is_some(),
            won_at: self.won_at,
        }
    }

    pub fn reset(&mut self) {
        self.won_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(coverage: f32, excess: f32) -> ScoreResult {
        ScoreResult {
            overlap_pixels: 0,
            target_area_pixels: 0,
            body_area_pixels: 0,
            coverage_percent: coverage,
            excess_percent: excess,
        }
    }

    fn judge() -> WinJudge {
        WinJudge::new(&WinConfig {
            threshold: 95.0,
            excess_ceiling: 50.0,
            cooldown_secs: 3.0,
        })
    }

    #[test]
    fn test_fires_once_for_sustained_coverage() {
        let mut j = judge();
        let t0 = Instant::now();
        let stream = [0.0, 0.0, 96.0, 96.0, 96.0];
        let mut transitions = 0;
        for (i, &coverage) in stream.iter().enumerate() {
            let entered = j.update(&score(coverage, 0.0), t0 + Duration::from_millis(33 * i as u64));
            if entered {
                transitions += 1;
                assert_eq!(i, 2, "must enter at the first frame over threshold");
            }
        }
        assert_eq!(transitions, 1);
        assert!(j.is_winning());
    }

    #[test]
    fn test_excess_ceiling_blocks_win() {
        let mut j = judge();
        let t0 = Instant::now();
        assert!(!j.update(&score(100.0, 60.0), t0));
        assert!(!j.is_winning());

        // Same coverage with acceptable excess wins
        assert!(j.update(&score(100.0, 10.0), t0 + Duration::from_millis(33)));
    }

    #[test]
    fn test_cooldown_holds_then_resets() {
        let mut j = judge();
        let t0 = Instant::now();
        assert!(j.update(&score(96.0, 0.0), t0));

        // Coverage collapses immediately, but the won state holds
        assert!(!j.update(&score(0.0, 0.0), t0 + Duration::from_secs(1)));
        assert!(j.is_winning());
        assert!(!j.update(&score(0.0, 0.0), t0 + Duration::from_secs(2)));
        assert!(j.is_winning());

        // Past the cooldown the state returns to idle
        assert!(!j.update(&score(0.0, 0.0), t0 + Duration::from_millis(3100)));
        assert!(!j.is_winning());
        assert_eq!(j.state().won_at, None);
    }

    #[test]
    fn test_sustained_coverage_rewins_after_cooldown() {
        let mut j = judge();
        let t0 = Instant::now();
        assert!(j.update(&score(96.0, 0.0), t0));

        // Still over threshold when the cooldown expires: this tick only
        // resets, the next one enters again
        assert!(!j.update(&score(96.0, 0.0), t0 + Duration::from_millis(3100)));
        assert!(!j.is_winning());
        assert!(j.update(&score(96.0, 0.0), t0 + Duration::from_millis(3133)));
    }

    #[test]
    fn test_won_at_tracks_winning_state() {
        let mut j = judge();
        let t0 = Instant::now();
        assert_eq!(j.state().won_at, None);
        j.update(&score(96.0, 0.0), t0);
        assert_eq!(j.state().won_at, Some(t0));
        assert!(j.state().is_winning);
        j.reset();
        assert_eq!(j.state().won_at, None);
    }
}
