//! Hysteresis-based rep state machine.
//!
//! Consumes one primary angle per frame and turns it into discrete
//! rep / set / rest / workout events. Movements whose angle closes toward the
//! peak (curls, squats) and movements whose angle opens toward it (presses,
//! raises) share one implementation: every angle is mapped onto a "progress"
//! axis on which the peak always lies above the start.
//!
//! The rest countdown is advanced by [`RepStateMachine::tick`]; there is no
//! timer to cancel, so a skipped or reset rest can never fire late.

use crate::{Error, MovementDirection, RepThresholds, Result};
use serde::Serialize;

/// Phase of the current rep
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    /// Rep not begun; waiting for the angle to leave the start position
    Start,
    /// Travelling toward the peak threshold
    MovingToPeak,
    /// Peak reached and counted; waiting for the return
    AtPeak,
    /// Returning toward the start threshold
    MovingToStart,
}

/// Events emitted by the rep state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RepEvent {
    RepCompleted { set: u32, rep: u32 },
    SetCompleted { set: u32 },
    RestStarted { seconds: u32 },
    RestTick { remaining: u32 },
    RestCompleted { skipped: bool, next_set: u32 },
    WorkoutCompleted,
}

/// Targets and thresholds for one workout
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepConfig {
    pub target_reps: u32,
    pub target_sets: u32,
    pub rest_seconds: u32,
    /// None for hold poses, which count seconds instead of angles
    pub thresholds: Option<RepThresholds>,
}

impl RepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_reps == 0 {
            return Err(Error::Config("target reps must be at least 1".into()));
        }
        if self.target_sets == 0 {
            return Err(Error::Config("target sets must be at least 1".into()));
        }
        match &self.thresholds {
            Some(thresholds) => validate_thresholds(thresholds),
            None => Ok(()),
        }
    }
}

/// Check that thresholds describe a movement the machine can count
pub fn validate_thresholds(thresholds: &RepThresholds) -> Result<()> {
    let RepThresholds {
        start_angle,
        peak_angle,
        hysteresis,
    } = *thresholds;

    if ![start_angle, peak_angle, hysteresis]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(Error::Config("thresholds must be finite".into()));
    }
    if !(0.0..=180.0).contains(&start_angle) || !(0.0..=180.0).contains(&peak_angle) {
        return Err(Error::Config(format!(
            "thresholds must lie within 0-180°, got start {} / peak {}",
            start_angle, peak_angle
        )));
    }
    if hysteresis < 0.0 {
        return Err(Error::Config("hysteresis must not be negative".into()));
    }
    // Both the start and the peak carry a band
    if (start_angle - peak_angle).abs() <= 2.0 * hysteresis {
        return Err(Error::Config(format!(
            "start {}° and peak {}° must be more than twice the {}° hysteresis apart",
            start_angle, peak_angle, hysteresis
        )));
    }
    Ok(())
}

/// Rep/set counter for one workout
#[derive(Debug)]
pub struct RepStateMachine {
    config: RepConfig,
    phase: RepPhase,
    current_reps: u32,
    current_set: u32,
    rest_remaining: Option<u32>,
    finished: bool,
}

impl RepStateMachine {
    pub fn new(config: RepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: RepPhase::Start,
            current_reps: 0,
            current_set: 1,
            rest_remaining: None,
            finished: false,
        })
    }

    pub fn config(&self) -> &RepConfig {
        &self.config
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn current_reps(&self) -> u32 {
        self.current_reps
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn is_resting(&self) -> bool {
        self.rest_remaining.is_some()
    }

    pub fn rest_remaining(&self) -> Option<u32> {
        self.rest_remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Back to set 1, rep 0, no rest pending
    pub fn reset(&mut self) {
        self.phase = RepPhase::Start;
        self.current_reps = 0;
        self.current_set = 1;
        self.rest_remaining = None;
        self.finished = false;
    }

    fn is_counting(&self) -> bool {
        !self.finished && self.rest_remaining.is_none()
    }

    /// Map an angle onto the axis where the peak lies above the start
    fn progress(thresholds: &RepThresholds, angle: f64) -> f64 {
        match thresholds.direction() {
            MovementDirection::Closing => -angle,
            MovementDirection::Opening => angle,
        }
    }

    /// Feed one frame's primary angle in degrees
    ///
    /// Ignored while resting, after the workout completes and for hold poses.
    pub fn feed_angle(&mut self, angle: f64) -> Vec<RepEvent> {
        let mut events = Vec::new();
        let Some(thresholds) = self.config.thresholds else {
            return events;
        };
        if !self.is_counting() {
            return events;
        }

        let p = Self::progress(&thresholds, angle);
        let start = Self::progress(&thresholds, thresholds.start_angle);
        let peak = Self::progress(&thresholds, thresholds.peak_angle);
        let band = thresholds.hysteresis;

        // A single frame may cross several thresholds at once (a fast curl
        // between two frames), so keep stepping until the phase settles.
        loop {
            let next = match self.phase {
                RepPhase::Start if p > start + band => RepPhase::MovingToPeak,
                RepPhase::MovingToPeak if p >= peak - band => {
                    self.phase = RepPhase::AtPeak;
                    self.complete_rep(&mut events);
                    break;
                }
                RepPhase::MovingToPeak if p <= start => RepPhase::Start,
                RepPhase::AtPeak if p <= start + band => RepPhase::MovingToStart,
                RepPhase::MovingToStart if p <= start => RepPhase::Start,
                RepPhase::MovingToStart if p > start + band => RepPhase::AtPeak,
                _ => break,
            };
            tracing::debug!("Rep phase {:?} -> {:?} at {:.1}°", self.phase, next, angle);
            self.phase = next;
        }

        events
    }

    /// Count one second of a held pose as a rep
    pub fn record_hold_second(&mut self) -> Vec<RepEvent> {
        let mut events = Vec::new();
        if self.is_counting() {
            self.complete_rep(&mut events);
        }
        events
    }

    fn complete_rep(&mut self, events: &mut Vec<RepEvent>) {
        self.current_reps += 1;
        events.push(RepEvent::RepCompleted {
            set: self.current_set,
            rep: self.current_reps,
        });

        if self.current_reps < self.config.target_reps {
            return;
        }

        let finished_set = self.current_set;
        events.push(RepEvent::SetCompleted { set: finished_set });
        tracing::info!("Set {} of {} complete", finished_set, self.config.target_sets);

        if finished_set >= self.config.target_sets {
            self.finished = true;
            events.push(RepEvent::WorkoutCompleted);
            return;
        }

        self.current_set += 1;
        self.current_reps = 0;
        self.phase = RepPhase::Start;

        events.push(RepEvent::RestStarted {
            seconds: self.config.rest_seconds,
        });
        if self.config.rest_seconds == 0 {
            self.end_rest(false, events);
        } else {
            self.rest_remaining = Some(self.config.rest_seconds);
        }
    }

    /// Advance the rest countdown by one second
    pub fn tick(&mut self) -> Vec<RepEvent> {
        let mut events = Vec::new();
        let Some(remaining) = self.rest_remaining else {
            return events;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.end_rest(false, &mut events);
        } else {
            self.rest_remaining = Some(remaining);
            events.push(RepEvent::RestTick { remaining });
        }
        events
    }

    /// Cut the rest short. A no-op when not resting.
    pub fn skip_rest(&mut self) -> Vec<RepEvent> {
        let mut events = Vec::new();
        if self.rest_remaining.is_some() {
            self.end_rest(true, &mut events);
        }
        events
    }

    fn end_rest(&mut self, skipped: bool, events: &mut Vec<RepEvent>) {
        self.rest_remaining = None;
        self.phase = RepPhase::Start;
        tracing::debug!("Rest over (skipped: {}), starting set {}", skipped, self.current_set);
        events.push(RepEvent::RestCompleted {
            skipped,
            next_set: self.current_set,
        });
    }
}
