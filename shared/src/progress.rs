//! Perceived loading progress
//!
//! Turns raw asset-load progress into a percentage that is pleasant to watch: it follows a
//! synthetic decelerating curve so it never stalls, never moves backwards, and finishes at
//! exactly 100 once loading stops.
//!
//! [`ProgressState::step`] is a pure transition function. [`ProgressSimulator`] owns one
//! state and feeds it fixed-interval ticks from frame updates.

use std::time::Duration;

use tracing::debug;

/// Interval between simulation ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Delay between reaching 100 and hiding the overlay
pub const HIDE_DELAY: Duration = Duration::from_millis(150);
/// Ceiling for the displayed value while assets are still loading
pub const LOADING_CAP: f64 = 98.0;
/// Fraction of the remaining gap closed per loading tick
pub const EASE_FACTOR: f64 = 0.35;
pub const MIN_STEP: f64 = 0.4;
pub const MAX_STEP: f64 = 3.0;
/// Fraction of the remaining gap to 100 closed per completion tick
pub const COMPLETION_FACTOR: f64 = 0.25;
/// Completion snaps to 100 at or above this value
pub const SNAP_THRESHOLD: f64 = 99.8;
/// Upper bound on ticks replayed after a long frame
const MAX_CATCH_UP_TICKS: u32 = 10;

/// Expected percentage after `elapsed` of loading.
///
/// Piecewise linear and concave: 60 at 6 s, 85 at 12 s, 95 at 20 s, then 98 from 35 s on.
pub fn synthetic_floor(elapsed: Duration) -> f64 {
    let t = elapsed.as_secs_f64();
    if t <= 6.0 {
        (t / 6.0) * 60.0
    } else if t <= 12.0 {
        60.0 + ((t - 6.0) / 6.0) * 25.0
    } else if t <= 20.0 {
        85.0 + ((t - 12.0) / 8.0) * 10.0
    } else if t <= 35.0 {
        95.0 + ((t - 20.0) / 15.0) * 3.0
    } else {
        LOADING_CAP
    }
}

/// Lifecycle of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Hidden, nothing loading
    Idle,
    /// Assets loading, following the synthetic curve
    Loading,
    /// Loading finished, easing towards 100
    Completing,
    /// At 100, waiting to hide
    Complete,
}

/// Inputs observed at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInput {
    /// Monotonic time since an arbitrary origin
    pub now: Duration,
    /// Real asset progress, 0-100
    pub real: f64,
    /// Whether anything is still loading
    pub active: bool,
}

impl ProgressInput {
    pub fn new(now: Duration, real: f64, active: bool) -> Self {
        Self { now, real, active }
    }
}

/// Snapshot of the simulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    pub phase: Phase,
    /// Percentage shown to the user
    pub displayed: f64,
    /// Last real progress seen
    pub real: f64,
    /// Last activity flag seen
    pub active: bool,
    /// When loading started
    pub started_at: Option<Duration>,
    /// When the displayed value reached 100
    pub completed_at: Option<Duration>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::idle()
    }
}

impl ProgressState {
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            displayed: 0.0,
            real: 0.0,
            active: false,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn visible(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Displayed value rounded for labels
    pub fn percent_label(&self) -> u32 {
        self.displayed.round().clamp(0.0, 100.0) as u32
    }

    /// Value the loading phase is heading towards at `now`
    pub fn loading_target(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.started_at.unwrap_or(now));
        synthetic_floor(elapsed).max(self.real).max(self.displayed)
    }

    /// Advance one tick
    pub fn step(self, input: ProgressInput) -> Self {
        let real = sanitize(input.real);
        let mut next = Self {
            real,
            active: input.active,
            ..self
        };

        match self.phase {
            Phase::Idle => {
                if input.active {
                    next.phase = Phase::Loading;
                    next.displayed = 0.0;
                    next.started_at = Some(input.now);
                }
            }
            Phase::Loading if input.active => {
                let target = next.loading_target(input.now);
                let step = ((target - next.displayed) * EASE_FACTOR).clamp(MIN_STEP, MAX_STEP);
                let eased = (next.displayed + step).min(LOADING_CAP);
                next.displayed = eased.max(real.min(LOADING_CAP)).max(self.displayed);
            }
            // Completion runs to the end even if activity resumes; a new load starts from Idle
            Phase::Loading | Phase::Completing => {
                next.phase = Phase::Completing;
                let finished = next.displayed + (100.0 - next.displayed) * COMPLETION_FACTOR;
                if finished >= SNAP_THRESHOLD {
                    next.displayed = 100.0;
                    next.phase = Phase::Complete;
                    next.completed_at = Some(input.now);
                } else {
                    next.displayed = finished;
                }
            }
            Phase::Complete => {
                let completed_at = self.completed_at.unwrap_or(input.now);
                if input.now.saturating_sub(completed_at) >= HIDE_DELAY {
                    next = Self::idle();
                }
            }
        }

        next
    }
}

fn sanitize(real: f64) -> f64 {
    if real.is_nan() {
        0.0
    } else {
        real.clamp(0.0, 100.0)
    }
}

/// Owns a [`ProgressState`] and ticks it at [`TICK_INTERVAL`]
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    state: ProgressState,
    /// Time of the last tick; `None` when no ticker is scheduled
    last_tick: Option<Duration>,
    interval: Duration,
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl ProgressSimulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: ProgressState::idle(),
            last_tick: None,
            interval,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn displayed(&self) -> f64 {
        self.state.displayed
    }

    pub fn visible(&self) -> bool {
        self.state.visible()
    }

    /// Whether a periodic tick is scheduled
    pub fn is_ticking(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Feed the latest observation. Call once per frame.
    pub fn update(&mut self, now: Duration, real: f64, active: bool) -> &ProgressState {
        let input = ProgressInput::new(now, real, active);

        if self.state.phase == Phase::Idle {
            self.transition(input);
            if self.state.visible() {
                self.last_tick = Some(now);
            }
            return &self.state;
        }

        let mut ticks = 0;
        while let Some(last) = self.last_tick {
            let due = last + self.interval;
            if due > now || ticks == MAX_CATCH_UP_TICKS {
                break;
            }
            self.last_tick = Some(due);
            self.transition(ProgressInput { now: due, ..input });
            ticks += 1;
            // Hidden overlays cancel their ticker; reactivation waits for the next update
            if !self.state.visible() {
                self.last_tick = None;
                return &self.state;
            }
        }
        if ticks == MAX_CATCH_UP_TICKS {
            self.last_tick = Some(now);
        }

        if self.state.phase == Phase::Complete {
            self.transition(input);
        }
        if !self.state.visible() {
            self.last_tick = None;
        }

        &self.state
    }

    /// Stop ticking and forget everything, as when the overlay's owner goes away
    pub fn cancel(&mut self) {
        self.last_tick = None;
        self.state = ProgressState::idle();
    }

    fn transition(&mut self, input: ProgressInput) {
        let next = self.state.step(input);
        if next.phase != self.state.phase {
            debug!(
                from = ?self.state.phase,
                to = ?next.phase,
                displayed = next.displayed,
                "progress phase changed"
            );
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn loading_at(started: Duration, displayed: f64) -> ProgressState {
        ProgressState {
            phase: Phase::Loading,
            displayed,
            real: 0.0,
            active: true,
            started_at: Some(started),
            completed_at: None,
        }
    }

    #[test]
    fn test_floor_curve_shape() {
        assert_eq!(synthetic_floor(Duration::ZERO), 0.0);
        assert!((synthetic_floor(ms(6_000)) - 60.0).abs() < 1e-9);
        assert!((synthetic_floor(ms(12_000)) - 85.0).abs() < 1e-9);
        assert!((synthetic_floor(ms(20_000)) - 95.0).abs() < 1e-9);
        assert!((synthetic_floor(ms(35_000)) - 98.0).abs() < 1e-9);
        assert_eq!(synthetic_floor(ms(120_000)), 98.0);
    }

    #[test]
    fn test_idle_until_active() {
        let state = ProgressState::idle().step(ProgressInput::new(ms(10), 0.0, false));
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.visible());

        let state = state.step(ProgressInput::new(ms(20), 0.0, true));
        assert_eq!(state.phase, Phase::Loading);
        assert_eq!(state.started_at, Some(ms(20)));
        assert_eq!(state.displayed, 0.0);
        assert!(state.visible());
    }

    #[test]
    fn test_real_progress_is_a_lower_bound() {
        let state = loading_at(Duration::ZERO, 0.0).step(ProgressInput::new(ms(100), 70.0, true));
        assert_eq!(state.displayed, 70.0);
    }

    #[test]
    fn test_floor_wins_over_lagging_real_progress() {
        let now = ms(5_500);
        let mut state = loading_at(Duration::ZERO, 40.0);
        state.real = 40.0;
        assert!((state.loading_target(now) - 55.0).abs() < 1e-9);

        let mut previous = state.displayed;
        for _ in 0..30 {
            state = state.step(ProgressInput::new(now, 40.0, true));
            assert!(state.displayed >= previous);
            assert!(state.displayed >= 40.0);
            previous = state.displayed;
        }
        assert!(state.displayed >= 55.0);
    }

    #[test]
    fn test_step_is_bounded() {
        let state = loading_at(Duration::ZERO, 0.0).step(ProgressInput::new(ms(30_000), 0.0, true));
        assert_eq!(state.displayed, MAX_STEP);

        let state =
            loading_at(Duration::ZERO, 10.0).step(ProgressInput::new(Duration::ZERO, 0.0, true));
        assert!((state.displayed - (10.0 + MIN_STEP)).abs() < 1e-12);
    }

    #[test]
    fn test_loading_never_exceeds_cap() {
        let mut state = loading_at(Duration::ZERO, 97.9);
        for i in 0..20 {
            state = state.step(ProgressInput::new(ms(40_000 + i * 100), 100.0, true));
            assert!(state.displayed <= LOADING_CAP);
        }
        assert_eq!(state.displayed, LOADING_CAP);
    }

    #[test]
    fn test_completion_snaps_to_exactly_100() {
        let mut state = loading_at(Duration::ZERO, 30.0);
        let mut ticks = 0;
        while state.phase != Phase::Complete {
            state = state.step(ProgressInput::new(ms(1_000 + ticks * 100), 100.0, false));
            ticks += 1;
            assert!(ticks <= 25, "completion took too many ticks");
        }
        assert_eq!(state.displayed, 100.0);
        assert!(state.visible());
    }

    #[test]
    fn test_hides_after_delay() {
        let mut state = loading_at(Duration::ZERO, 99.9);
        state = state.step(ProgressInput::new(ms(1_000), 100.0, false));
        assert_eq!(state.phase, Phase::Complete);

        state = state.step(ProgressInput::new(ms(1_100), 100.0, false));
        assert_eq!(state.phase, Phase::Complete);

        state = state.step(ProgressInput::new(ms(1_150), 100.0, false));
        assert_eq!(state, ProgressState::idle());
    }

    #[test]
    fn test_completion_ignores_renewed_activity() {
        let mut state = loading_at(Duration::ZERO, 90.0);
        state = state.step(ProgressInput::new(ms(100), 100.0, false));
        assert_eq!(state.phase, Phase::Completing);
        let before = state.displayed;

        state = state.step(ProgressInput::new(ms(200), 10.0, true));
        assert!(state.displayed > before);
    }

    #[test]
    fn test_nan_progress_is_ignored() {
        let state =
            loading_at(Duration::ZERO, 5.0).step(ProgressInput::new(ms(100), f64::NAN, true));
        assert!(state.displayed.is_finite());
        assert_eq!(state.real, 0.0);
    }

    #[test]
    fn test_simulator_full_cycle() {
        let mut sim = ProgressSimulator::default();
        assert!(!sim.visible());

        sim.update(ms(0), 0.0, true);
        assert!(sim.visible());
        assert!(sim.is_ticking());

        // Frames at ~60 Hz for three seconds of loading
        let mut now = 0;
        while now < 3_000 {
            now += 16;
            sim.update(ms(now), 20.0, true);
        }
        assert!(sim.displayed() >= 20.0 && sim.displayed() <= LOADING_CAP);

        while sim.visible() {
            now += 16;
            sim.update(ms(now), 100.0, false);
            assert!(now < 6_000, "overlay never hid");
        }
        assert_eq!(sim.displayed(), 0.0);
        assert!(!sim.is_ticking());
    }

    #[test]
    fn test_simulator_ticks_at_interval() {
        let mut sim = ProgressSimulator::default();
        sim.update(ms(0), 0.0, true);
        sim.update(ms(50), 0.0, true);
        assert_eq!(sim.displayed(), 0.0);
        sim.update(ms(100), 0.0, true);
        assert!(sim.displayed() > 0.0);
    }

    #[test]
    fn test_simulator_caps_catch_up() {
        let mut sim = ProgressSimulator::default();
        sim.update(ms(0), 0.0, true);
        sim.update(ms(60_000), 0.0, true);
        assert!(sim.displayed() <= MAX_STEP * MAX_CATCH_UP_TICKS as f64);
        assert!(sim.is_ticking());
    }

    #[test]
    fn test_cancel_resets() {
        let mut sim = ProgressSimulator::default();
        sim.update(ms(0), 0.0, true);
        sim.update(ms(500), 50.0, true);
        sim.cancel();
        assert!(!sim.visible());
        assert!(!sim.is_ticking());
        assert_eq!(*sim.state(), ProgressState::idle());
    }

    proptest! {
        #[test]
        fn displayed_never_decreases_while_visible(
            events in prop::collection::vec((1u64..400, 0.0f64..100.0, any::<bool>()), 1..300)
        ) {
            let mut sim = ProgressSimulator::default();
            let mut now = 0u64;
            let mut previous = 0.0;
            for (dt, real, active) in events {
                now += dt;
                let state = *sim.update(ms(now), real, active);
                if state.visible() {
                    prop_assert!(state.displayed >= previous);
                    prop_assert!(state.displayed <= 100.0);
                    if state.phase == Phase::Loading {
                        prop_assert!(state.displayed <= LOADING_CAP);
                    }
                    previous = state.displayed;
                } else {
                    prop_assert_eq!(state.displayed, 0.0);
                    previous = 0.0;
                }
            }
        }

        #[test]
        fn completion_is_bounded(start in 0.0f64..98.0) {
            let mut state = loading_at(Duration::ZERO, start);
            let mut ticks = 0u64;
            while state.phase != Phase::Complete {
                state = state.step(ProgressInput::new(ms(ticks * 100), 0.0, false));
                ticks += 1;
                prop_assert!(ticks <= 25);
            }
            prop_assert_eq!(state.displayed, 100.0);
        }
    }
}
