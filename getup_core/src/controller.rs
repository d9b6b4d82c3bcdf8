//! Workout session controller.
//!
//! Owns one workout from setup to completion:
//!
//! ```text
//! setup -> countdown -> active <-> resting -> complete
//! ```
//!
//! Frames go through the posture analyzer (feedback and form score) and the
//! rep state machine (counting). Time only advances through [`tick`], called
//! once per second by whoever owns the controller; countdown, rest and
//! hold-pose seconds all hang off it.
//!
//! [`tick`]: WorkoutController::tick

use crate::config::MAX_REST_SECONDS;
use crate::geometry::primary_angle;
use crate::posture;
use crate::rep_counter::{RepConfig, RepEvent, RepPhase, RepStateMachine};
use crate::wal::SessionSink;
use crate::{
    Catalog, Error, ExerciseDefinition, ExerciseSet, JointSnapshot, PostureFeedback, RepTracking,
    Result, WorkoutSession,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Frames averaged for the live form score
pub const LIVE_SCORE_WINDOW: usize = 30;

/// Default countdown before a workout goes active
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;

/// Start/stop signals for the external camera
pub trait CaptureControl {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Capture control for sources that run regardless, such as a recorded replay
#[derive(Debug, Default)]
pub struct NoCapture;

impl CaptureControl for NoCapture {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Lifecycle of one workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Setup,
    Countdown,
    Active,
    Resting,
    Complete,
}

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkoutPlan {
    pub exercise_id: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_seconds: u32,
}

/// Events surfaced to the UI, in the order they happened
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutEvent {
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    CountdownTick {
        remaining: u32,
    },
    Rep(RepEvent),
    SessionSaved {
        id: Uuid,
    },
}

/// Result of processing one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub feedback: PostureFeedback,
    pub primary_angle: Option<f64>,
    pub events: Vec<WorkoutEvent>,
}

pub struct WorkoutController<C: CaptureControl, S: SessionSink> {
    definition: ExerciseDefinition,
    plan: WorkoutPlan,
    countdown_seconds: u32,
    capture: C,
    sink: S,

    state: LifecycleState,
    counter: RepStateMachine,
    countdown_remaining: u32,
    elapsed_seconds: u64,
    feedback: PostureFeedback,
    held_this_second: bool,
    set_scores: Vec<f64>,
    recent_scores: VecDeque<f64>,
    sets: Vec<ExerciseSet>,
    /// Finished session the sink has not accepted yet
    unsaved: Option<WorkoutSession>,
    last_session: Option<WorkoutSession>,
}

fn build_counter(definition: &ExerciseDefinition, plan: &WorkoutPlan) -> Result<RepStateMachine> {
    if plan.rest_seconds > MAX_REST_SECONDS {
        return Err(Error::Config(format!(
            "rest must be at most {} seconds, got {}",
            MAX_REST_SECONDS, plan.rest_seconds
        )));
    }
    RepStateMachine::new(RepConfig {
        target_reps: plan.target_reps,
        target_sets: plan.target_sets,
        rest_seconds: plan.rest_seconds,
        thresholds: definition.thresholds(),
    })
}

fn mean(scores: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = scores.fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));
    (count > 0).then(|| sum / count as f64)
}

impl<C: CaptureControl, S: SessionSink> WorkoutController<C, S> {
    /// Build a controller in `setup` for a validated plan
    pub fn new(plan: WorkoutPlan, catalog: &Catalog, capture: C, sink: S) -> Result<Self> {
        let definition = catalog.get(&plan.exercise_id)?.clone();
        let counter = build_counter(&definition, &plan)?;

        Ok(Self {
            definition,
            plan,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            capture,
            sink,
            state: LifecycleState::Setup,
            counter,
            countdown_remaining: 0,
            elapsed_seconds: 0,
            feedback: PostureFeedback::waiting(),
            held_this_second: false,
            set_scores: Vec::new(),
            recent_scores: VecDeque::with_capacity(LIVE_SCORE_WINDOW),
            sets: Vec::new(),
            unsaved: None,
            last_session: None,
        })
    }

    pub fn with_countdown(mut self, seconds: u32) -> Self {
        self.countdown_seconds = seconds.max(1);
        self
    }

    /// Replace the plan. Only allowed in `setup`.
    pub fn configure(&mut self, plan: WorkoutPlan, catalog: &Catalog) -> Result<()> {
        self.require(LifecycleState::Setup, "configure")?;
        let definition = catalog.get(&plan.exercise_id)?.clone();
        self.counter = build_counter(&definition, &plan)?;
        self.definition = definition;
        self.plan = plan;
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        &self.definition
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn feedback(&self) -> PostureFeedback {
        self.feedback
    }

    pub fn current_set(&self) -> u32 {
        self.counter.current_set()
    }

    pub fn current_reps(&self) -> u32 {
        self.counter.current_reps()
    }

    pub fn rep_phase(&self) -> RepPhase {
        self.counter.phase()
    }

    pub fn rest_remaining(&self) -> Option<u32> {
        self.counter.rest_remaining()
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Mean score of the last [`LIVE_SCORE_WINDOW`] analysed frames
    pub fn current_set_form_score(&self) -> Option<f64> {
        mean(self.recent_scores.iter().copied())
    }

    pub fn completed_sets(&self) -> &[ExerciseSet] {
        &self.sets
    }

    /// A completed workout whose save failed; see [`retry_save`](Self::retry_save)
    pub fn unsaved_session(&self) -> Option<&WorkoutSession> {
        self.unsaved.as_ref()
    }

    /// The session most recently accepted by the sink
    pub fn last_session(&self) -> Option<&WorkoutSession> {
        self.last_session.as_ref()
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    fn require(&self, expected: LifecycleState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::State(format!(
                "cannot {} while {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    fn transition(&mut self, to: LifecycleState, events: &mut Vec<WorkoutEvent>) {
        if self.state == to {
            return;
        }
        tracing::info!("Workout {:?} -> {:?}", self.state, to);
        events.push(WorkoutEvent::StateChanged {
            from: self.state,
            to,
        });
        self.state = to;
    }

    fn clear_progress(&mut self) {
        self.counter.reset();
        self.countdown_remaining = 0;
        self.elapsed_seconds = 0;
        self.feedback = PostureFeedback::waiting();
        self.held_this_second = false;
        self.set_scores.clear();
        self.recent_scores.clear();
        self.sets.clear();
        self.unsaved = None;
    }

    pub fn start_countdown(&mut self) -> Result<Vec<WorkoutEvent>> {
        self.require(LifecycleState::Setup, "start a countdown")?;
        self.clear_progress();
        self.countdown_remaining = self.countdown_seconds;

        let mut events = Vec::new();
        self.transition(LifecycleState::Countdown, &mut events);
        events.push(WorkoutEvent::CountdownTick {
            remaining: self.countdown_remaining,
        });
        Ok(events)
    }

    /// Advance one second
    pub fn tick(&mut self) -> Result<Vec<WorkoutEvent>> {
        let mut events = Vec::new();
        match self.state {
            LifecycleState::Countdown => {
                self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
                if self.countdown_remaining == 0 {
                    self.transition(LifecycleState::Active, &mut events);
                    self.capture.start();
                } else {
                    events.push(WorkoutEvent::CountdownTick {
                        remaining: self.countdown_remaining,
                    });
                }
            }
            LifecycleState::Active => {
                self.elapsed_seconds += 1;
                if self.definition.is_hold_pose() && self.held_this_second {
                    self.held_this_second = false;
                    let rep_events = self.counter.record_hold_second();
                    self.apply_rep_events(rep_events, &mut events)?;
                }
            }
            LifecycleState::Resting => {
                self.elapsed_seconds += 1;
                let rep_events = self.counter.tick();
                self.apply_rep_events(rep_events, &mut events)?;
            }
            LifecycleState::Setup | LifecycleState::Complete => {}
        }
        Ok(events)
    }

    /// Analyse one snapshot and feed the rep counter
    pub fn process_frame(&mut self, snapshot: &JointSnapshot) -> Result<FrameOutcome> {
        let feedback = posture::analyze(&self.definition, snapshot);
        self.feedback = feedback;

        let mut outcome = FrameOutcome {
            feedback,
            primary_angle: None,
            events: Vec::new(),
        };
        if self.state != LifecycleState::Active {
            return Ok(outcome);
        }

        if !feedback.is_waiting() {
            let score = feedback.quality.score();
            self.set_scores.push(score);
            if self.recent_scores.len() == LIVE_SCORE_WINDOW {
                self.recent_scores.pop_front();
            }
            self.recent_scores.push_back(score);
        }

        match self.definition.tracking {
            RepTracking::Motion { angle, .. } => {
                // Unreliable joints withhold the angle; the rep stalls in place
                if let Some(degrees) = primary_angle(snapshot, &angle) {
                    outcome.primary_angle = Some(degrees);
                    let rep_events = self.counter.feed_angle(degrees);
                    self.apply_rep_events(rep_events, &mut outcome.events)?;
                }
            }
            RepTracking::Hold => {
                if !feedback.is_waiting() && feedback.quality.is_acceptable() {
                    self.held_this_second = true;
                }
            }
        }

        Ok(outcome)
    }

    /// Cut the rest short. A no-op outside `resting`.
    pub fn skip_rest(&mut self) -> Result<Vec<WorkoutEvent>> {
        let mut events = Vec::new();
        if self.state == LifecycleState::Resting {
            let rep_events = self.counter.skip_rest();
            self.apply_rep_events(rep_events, &mut events)?;
        }
        Ok(events)
    }

    /// Stop early, saving the sets done so far, and return to `setup`
    pub fn end_workout(&mut self) -> Result<Vec<WorkoutEvent>> {
        let mut events = Vec::new();
        match self.state {
            LifecycleState::Setup => {
                return Err(Error::State("no workout in progress".into()));
            }
            LifecycleState::Countdown | LifecycleState::Complete => {}
            LifecycleState::Active | LifecycleState::Resting if self.unsaved.is_some() => {
                self.save_completed(&mut events)?;
            }
            LifecycleState::Active | LifecycleState::Resting => {
                // Nothing changes until the sink has accepted the session
                let mut sets = self.sets.clone();
                let in_progress = self.counter.current_reps();
                if self.state == LifecycleState::Active && in_progress > 0 {
                    sets.push(self.scored_set(self.counter.current_set(), in_progress));
                }
                if sets.is_empty() {
                    tracing::info!("Workout ended before any rep, nothing to save");
                } else {
                    let session = self.finalize(sets, true);
                    self.save_session(session, &mut events)?;
                }
                self.capture.stop();
            }
        }

        self.clear_progress();
        self.transition(LifecycleState::Setup, &mut events);
        Ok(events)
    }

    /// Save a completed workout again after the sink failed
    pub fn retry_save(&mut self) -> Result<Vec<WorkoutEvent>> {
        if self.unsaved.is_none() {
            return Err(Error::State("no unsaved workout".into()));
        }
        let mut events = Vec::new();
        self.save_completed(&mut events)?;
        Ok(events)
    }

    /// Leave `complete` (or abandon anything else without saving)
    pub fn reset_to_setup(&mut self) -> Vec<WorkoutEvent> {
        let mut events = Vec::new();
        if matches!(self.state, LifecycleState::Active | LifecycleState::Resting) {
            self.capture.stop();
        }
        self.clear_progress();
        self.transition(LifecycleState::Setup, &mut events);
        events
    }

    // ── Rep events ──────────────────────────────────────────────────────────

    fn apply_rep_events(
        &mut self,
        rep_events: Vec<RepEvent>,
        events: &mut Vec<WorkoutEvent>,
    ) -> Result<()> {
        for event in rep_events {
            events.push(WorkoutEvent::Rep(event));
            match event {
                RepEvent::SetCompleted { set } => {
                    self.record_set(set, self.plan.target_reps);
                    // The final set is closed out by WorkoutCompleted alone
                    if set < self.plan.target_sets {
                        self.transition(LifecycleState::Resting, events);
                    }
                }
                RepEvent::RestCompleted { .. } => {
                    self.held_this_second = false;
                    self.transition(LifecycleState::Active, events);
                }
                RepEvent::WorkoutCompleted => {
                    self.unsaved = Some(self.finalize(self.sets.clone(), false));
                    self.save_completed(events)?;
                }
                RepEvent::RepCompleted { .. }
                | RepEvent::RestStarted { .. }
                | RepEvent::RestTick { .. } => {}
            }
        }
        Ok(())
    }

    /// The set so far, scored from the frames seen since the last one
    fn scored_set(&self, set_number: u32, reps_completed: u32) -> ExerciseSet {
        ExerciseSet {
            set_number,
            reps_completed,
            form_score: mean(self.set_scores.iter().copied()).unwrap_or(0.0),
            completed_at: Utc::now(),
        }
    }

    fn record_set(&mut self, set_number: u32, reps_completed: u32) {
        let set = self.scored_set(set_number, reps_completed);
        tracing::debug!(
            "Recording set {}: {} reps, form {:.2}",
            set_number,
            reps_completed,
            set.form_score
        );
        self.set_scores.clear();
        self.sets.push(set);
    }

    fn finalize(&self, sets: Vec<ExerciseSet>, ended_early: bool) -> WorkoutSession {
        let completed_sets = sets
            .iter()
            .filter(|s| s.reps_completed >= self.plan.target_reps)
            .count() as u32;

        WorkoutSession {
            id: Uuid::new_v4(),
            performed_at: Utc::now(),
            exercise_id: self.definition.id.to_string(),
            exercise_name: self.definition.name.to_string(),
            target_sets: self.plan.target_sets,
            target_reps: self.plan.target_reps,
            duration_seconds: self.elapsed_seconds,
            completed_sets,
            total_reps_completed: sets.iter().map(|s| s.reps_completed).sum(),
            average_form_score: mean(sets.iter().map(|s| s.form_score)).unwrap_or(0.0),
            ended_early,
            sets,
        }
    }

    /// Hand the finished workout to the sink, then move to `complete`.
    /// On failure it stays unsaved and the state is left alone.
    fn save_completed(&mut self, events: &mut Vec<WorkoutEvent>) -> Result<()> {
        let Some(session) = self.unsaved.take() else {
            return Ok(());
        };
        if let Err(e) = self.sink.append(&session) {
            tracing::warn!("Could not save workout {}: {}", session.id, e);
            self.unsaved = Some(session);
            return Err(e);
        }
        self.capture.stop();
        self.transition(LifecycleState::Complete, events);
        self.accept_saved(session, events);
        Ok(())
    }

    fn save_session(
        &mut self,
        session: WorkoutSession,
        events: &mut Vec<WorkoutEvent>,
    ) -> Result<()> {
        self.sink.append(&session)?;
        self.accept_saved(session, events);
        Ok(())
    }

    fn accept_saved(&mut self, session: WorkoutSession, events: &mut Vec<WorkoutEvent>) {
        tracing::info!("Saved workout {}: {}", session.id, session.summary());
        events.push(WorkoutEvent::SessionSaved { id: session.id });
        self.last_session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::posture::fixtures::{standing, with_confidence};
    use crate::wal::MemorySink;
    use crate::{Joint, JointName, PostureQuality, RepTracking};

    #[derive(Debug, Default)]
    struct RecordingCapture {
        starts: u32,
        stops: u32,
    }

    impl CaptureControl for RecordingCapture {
        fn start(&mut self) {
            self.starts += 1;
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    type TestController = WorkoutController<RecordingCapture, MemorySink>;

    fn plan(exercise_id: &str, sets: u32, reps: u32, rest: u32) -> WorkoutPlan {
        WorkoutPlan {
            exercise_id: exercise_id.into(),
            target_sets: sets,
            target_reps: reps,
            rest_seconds: rest,
        }
    }

    fn controller(catalog: &Catalog, plan: WorkoutPlan) -> TestController {
        WorkoutController::new(plan, catalog, RecordingCapture::default(), MemorySink::default())
            .unwrap()
    }

    fn activate(c: &mut TestController) {
        c.start_countdown().unwrap();
        for _ in 0..DEFAULT_COUNTDOWN_SECONDS {
            c.tick().unwrap();
        }
        assert_eq!(c.state(), LifecycleState::Active);
    }

    /// Right arm with the elbow bent to `degrees`, torso upright
    fn curl_frame(degrees: f64) -> JointSnapshot {
        let rad = degrees.to_radians();
        JointSnapshot::empty()
            .with_joint(JointName::RightShoulder, Joint::new(0.6, 0.8, 0.9))
            .with_joint(JointName::RightElbow, Joint::new(0.6, 0.6, 0.9))
            .with_joint(
                JointName::RightWrist,
                Joint::new(0.6 + 0.15 * rad.sin(), 0.6 + 0.15 * rad.cos(), 0.9),
            )
            .with_joint(JointName::RightHip, Joint::new(0.6, 0.4, 0.9))
    }

    fn curl_rep(c: &mut TestController) -> Vec<WorkoutEvent> {
        let mut events = Vec::new();
        for degrees in [170.0, 35.0, 170.0] {
            events.extend(c.process_frame(&curl_frame(degrees)).unwrap().events);
        }
        events
    }

    fn entered(events: &[WorkoutEvent], state: LifecycleState) -> bool {
        events
            .iter()
            .any(|e| matches!(e, WorkoutEvent::StateChanged { to, .. } if *to == state))
    }

    #[test]
    fn test_countdown_then_active_starts_capture() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 1, 3, 10));

        let events = c.start_countdown().unwrap();
        assert_eq!(c.state(), LifecycleState::Countdown);
        assert_eq!(events.last(), Some(&WorkoutEvent::CountdownTick { remaining: 3 }));

        assert_eq!(c.tick().unwrap(), vec![WorkoutEvent::CountdownTick { remaining: 2 }]);
        assert_eq!(c.tick().unwrap(), vec![WorkoutEvent::CountdownTick { remaining: 1 }]);
        assert_eq!(c.capture().starts, 0);

        let events = c.tick().unwrap();
        assert!(entered(&events, LifecycleState::Active));
        assert_eq!(c.capture().starts, 1);
    }

    #[test]
    fn test_start_countdown_twice_is_state_error() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("squat", 1, 3, 10));
        c.start_countdown().unwrap();
        assert!(matches!(c.start_countdown(), Err(Error::State(_))));
        assert!(matches!(
            c.configure(plan("squat", 2, 3, 10), &catalog),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn test_configure_in_setup() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("squat", 1, 3, 10));
        c.configure(plan("tree_pose", 2, 30, 15), &catalog).unwrap();
        assert_eq!(c.definition().id, "tree_pose");
        assert_eq!(c.plan().target_sets, 2);

        assert!(matches!(
            c.configure(plan("moonwalk", 1, 1, 0), &catalog),
            Err(Error::UnknownExercise(_))
        ));
        assert_eq!(c.definition().id, "tree_pose");
    }

    #[test]
    fn test_rejects_bad_plans() {
        let catalog = build_default_catalog();
        let new = |p| {
            WorkoutController::new(p, &catalog, NoCapture, MemorySink::default()).map(|_| ())
        };
        assert!(matches!(
            new(plan("moonwalk", 1, 1, 0)),
            Err(Error::UnknownExercise(_))
        ));
        assert!(matches!(new(plan("squat", 1, 0, 0)), Err(Error::Config(_))));
        assert!(matches!(new(plan("squat", 0, 5, 0)), Err(Error::Config(_))));
        assert!(matches!(new(plan("squat", 2, 5, 601)), Err(Error::Config(_))));
    }

    #[test]
    fn test_frames_outside_active_do_not_count() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 1, 1, 0));
        let events = curl_rep(&mut c);
        assert!(events.is_empty());
        assert_eq!(c.current_reps(), 0);
        assert_eq!(c.feedback().message, "Full extension ✓");
    }

    #[test]
    fn test_final_set_completes_without_resting() {
        crate::logging::init_test();
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 2, 2, 5));
        activate(&mut c);

        curl_rep(&mut c);
        let events = curl_rep(&mut c);
        assert!(events.contains(&WorkoutEvent::Rep(RepEvent::SetCompleted { set: 1 })));
        assert!(entered(&events, LifecycleState::Resting));
        assert_eq!(c.state(), LifecycleState::Resting);
        assert_eq!(c.rest_remaining(), Some(5));

        let events = c.skip_rest().unwrap();
        assert!(entered(&events, LifecycleState::Active));
        assert_eq!(c.current_set(), 2);

        let mut events = curl_rep(&mut c);
        events.extend(curl_rep(&mut c));
        assert!(!entered(&events, LifecycleState::Resting));
        assert!(entered(&events, LifecycleState::Complete));
        assert!(events.contains(&WorkoutEvent::Rep(RepEvent::WorkoutCompleted)));
        assert_eq!(c.state(), LifecycleState::Complete);
        assert_eq!(c.capture().stops, 1);

        let saved = &c.sink().sessions;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].completed_sets, 2);
        assert_eq!(saved[0].total_reps_completed, 4);
        assert!(!saved[0].ended_early);
        assert_eq!(saved[0].sets.len(), 2);
        assert_eq!(saved[0].sets[1].set_number, 2);

        c.reset_to_setup();
        assert_eq!(c.state(), LifecycleState::Setup);
        assert_eq!(c.current_set(), 1);
    }

    #[test]
    fn test_rest_expires_through_ticks() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 2, 1, 2));
        activate(&mut c);
        curl_rep(&mut c);
        assert_eq!(c.state(), LifecycleState::Resting);

        assert_eq!(
            c.tick().unwrap(),
            vec![WorkoutEvent::Rep(RepEvent::RestTick { remaining: 1 })]
        );
        let events = c.tick().unwrap();
        assert!(entered(&events, LifecycleState::Active));
        assert_eq!(c.rep_phase(), RepPhase::Start);

        // Skip after expiry changes nothing
        assert!(c.skip_rest().unwrap().is_empty());
    }

    #[test]
    fn test_unreliable_joints_stall_rep() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 1, 5, 0));
        activate(&mut c);

        c.process_frame(&curl_frame(170.0)).unwrap();
        c.process_frame(&curl_frame(100.0)).unwrap();
        assert_eq!(c.rep_phase(), RepPhase::MovingToPeak);

        let blind = with_confidence(&curl_frame(100.0), 0.0);
        for _ in 0..5 {
            let outcome = c.process_frame(&blind).unwrap();
            assert!(outcome.feedback.is_waiting());
            assert_eq!(outcome.primary_angle, None);
            assert!(outcome.events.is_empty());
        }
        assert_eq!(c.rep_phase(), RepPhase::MovingToPeak);

        c.process_frame(&curl_frame(100.0)).unwrap();
        let outcome = c.process_frame(&curl_frame(35.0)).unwrap();
        assert!(outcome
            .events
            .contains(&WorkoutEvent::Rep(RepEvent::RepCompleted { set: 1, rep: 1 })));
    }

    #[test]
    fn test_collapsed_limb_stalls_rep() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 1, 5, 0));
        activate(&mut c);
        c.process_frame(&curl_frame(170.0)).unwrap();

        // Wrist reported on top of the elbow: no angle, not a full curl
        let collapsed =
            curl_frame(170.0).with_joint(JointName::RightWrist, Joint::new(0.6, 0.6, 0.9));
        let outcome = c.process_frame(&collapsed).unwrap();
        assert_eq!(outcome.primary_angle, None);
        assert!(outcome.events.is_empty());
        assert_eq!(c.current_reps(), 0);
        assert_eq!(c.rep_phase(), RepPhase::Start);

        c.process_frame(&curl_frame(35.0)).unwrap();
        assert_eq!(c.current_reps(), 1);
    }

    #[test]
    fn test_waiting_frames_are_not_scored() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 1, 5, 0));
        activate(&mut c);

        let outcome = c.process_frame(&JointSnapshot::empty()).unwrap();
        assert_eq!(outcome.feedback, PostureFeedback::waiting());
        assert_eq!(c.current_set_form_score(), None);

        c.process_frame(&curl_frame(170.0)).unwrap();
        c.process_frame(&curl_frame(100.0)).unwrap();
        let score = c.current_set_form_score().unwrap();
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_end_workout_saves_partial_progress() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 3, 3, 30));
        activate(&mut c);

        for _ in 0..3 {
            curl_rep(&mut c);
        }
        c.skip_rest().unwrap();
        curl_rep(&mut c);
        assert_eq!(c.current_reps(), 1);

        let events = c.end_workout().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, WorkoutEvent::SessionSaved { .. })));
        assert!(entered(&events, LifecycleState::Setup));
        assert_eq!(c.state(), LifecycleState::Setup);
        assert_eq!(c.capture().stops, 1);

        let session = c.last_session().unwrap();
        assert!(session.ended_early);
        assert_eq!(session.sets.len(), 2);
        assert_eq!(session.sets[1].reps_completed, 1);
        assert_eq!(session.completed_sets, 1);
        assert_eq!(session.total_reps_completed, 4);
        assert_eq!(c.sink().sessions.len(), 1);
    }

    #[test]
    fn test_end_workout_while_resting_keeps_finished_sets() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 3, 1, 30));
        activate(&mut c);
        curl_rep(&mut c);
        assert_eq!(c.state(), LifecycleState::Resting);

        c.end_workout().unwrap();
        let session = c.last_session().unwrap();
        assert_eq!(session.sets.len(), 1);
        assert_eq!(session.completed_sets, 1);

        // No stale rest tick after ending
        assert!(c.tick().unwrap().is_empty());
        assert_eq!(c.state(), LifecycleState::Setup);
    }

    #[test]
    fn test_end_workout_before_any_rep_saves_nothing() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("squat", 2, 5, 30));
        c.start_countdown().unwrap();
        c.end_workout().unwrap();
        assert_eq!(c.state(), LifecycleState::Setup);
        assert!(c.sink().sessions.is_empty());

        activate(&mut c);
        c.end_workout().unwrap();
        assert!(c.sink().sessions.is_empty());
        assert!(matches!(c.end_workout(), Err(Error::State(_))));
    }

    /// Sink that rejects the first `failures` appends
    #[derive(Debug, Default)]
    struct FlakySink {
        failures: u32,
        sessions: Vec<WorkoutSession>,
    }

    impl SessionSink for FlakySink {
        fn append(&mut self, session: &WorkoutSession) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(Error::Other("disk full".into()));
            }
            self.sessions.push(session.clone());
            Ok(())
        }
    }

    fn flaky_controller(
        catalog: &Catalog,
        plan: WorkoutPlan,
        failures: u32,
    ) -> WorkoutController<RecordingCapture, FlakySink> {
        let sink = FlakySink {
            failures,
            ..FlakySink::default()
        };
        let mut c =
            WorkoutController::new(plan, catalog, RecordingCapture::default(), sink).unwrap();
        c.start_countdown().unwrap();
        for _ in 0..DEFAULT_COUNTDOWN_SECONDS {
            c.tick().unwrap();
        }
        c
    }

    fn flaky_curl(c: &mut WorkoutController<RecordingCapture, FlakySink>) -> Result<()> {
        for degrees in [170.0, 35.0, 170.0] {
            c.process_frame(&curl_frame(degrees))?;
        }
        Ok(())
    }

    #[test]
    fn test_failed_end_workout_save_changes_nothing() {
        let catalog = build_default_catalog();
        let mut c = flaky_controller(&catalog, plan("bicep_curl", 2, 5, 30), 1);
        flaky_curl(&mut c).unwrap();
        flaky_curl(&mut c).unwrap();

        assert!(c.end_workout().is_err());
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(c.current_reps(), 2);
        assert!(c.completed_sets().is_empty());
        assert_eq!(c.capture().stops, 0);
        assert!(c.last_session().is_none());

        let events = c.end_workout().unwrap();
        assert!(entered(&events, LifecycleState::Setup));
        assert_eq!(c.capture().stops, 1);

        let saved = &c.sink().sessions;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].sets.len(), 1);
        assert_eq!(saved[0].sets[0].reps_completed, 2);
        assert!(saved[0].ended_early);
    }

    #[test]
    fn test_failed_completion_save_can_be_retried() {
        let catalog = build_default_catalog();
        let mut c = flaky_controller(&catalog, plan("bicep_curl", 1, 1, 0), 2);

        assert!(flaky_curl(&mut c).is_err());
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(c.capture().stops, 0);
        assert_eq!(c.unsaved_session().map(|s| s.sets.len()), Some(1));

        // Further frames cannot add reps to a finished workout
        flaky_curl(&mut c).unwrap();
        assert!(c.retry_save().is_err());
        assert!(c.unsaved_session().is_some());

        let events = c.retry_save().unwrap();
        assert!(entered(&events, LifecycleState::Complete));
        assert!(events
            .iter()
            .any(|e| matches!(e, WorkoutEvent::SessionSaved { .. })));
        assert_eq!(c.state(), LifecycleState::Complete);
        assert_eq!(c.capture().stops, 1);
        assert!(c.unsaved_session().is_none());

        let saved = &c.sink().sessions;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].total_reps_completed, 1);
        assert!(!saved[0].ended_early);
        assert!(matches!(c.retry_save(), Err(Error::State(_))));
    }

    #[test]
    fn test_end_workout_saves_unsaved_completion() {
        let catalog = build_default_catalog();
        let mut c = flaky_controller(&catalog, plan("bicep_curl", 1, 1, 0), 1);
        assert!(flaky_curl(&mut c).is_err());

        c.end_workout().unwrap();
        assert_eq!(c.state(), LifecycleState::Setup);
        let saved = &c.sink().sessions;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].sets.len(), 1);
        assert!(!saved[0].ended_early);
    }

    fn steady_hold(_: &JointSnapshot) -> PostureFeedback {
        PostureFeedback::new(PostureQuality::Excellent, "Hold it", "Breathe")
    }

    fn catalog_with_hold() -> Catalog {
        let mut catalog = build_default_catalog();
        let mut hold = catalog.get("tree_pose").unwrap().clone();
        hold.id = "steady_hold";
        hold.tracking = RepTracking::Hold;
        hold.analyze = steady_hold;
        catalog.register(hold).unwrap();
        catalog
    }

    #[test]
    fn test_hold_seconds_count_only_with_good_frames() {
        let catalog = catalog_with_hold();
        let mut c = controller(&catalog, plan("steady_hold", 1, 3, 0));
        activate(&mut c);

        // A second without any usable frame does not count
        c.process_frame(&JointSnapshot::empty()).unwrap();
        assert!(c.tick().unwrap().is_empty());
        assert_eq!(c.current_reps(), 0);

        let mut events = Vec::new();
        for _ in 0..3 {
            c.process_frame(&standing()).unwrap();
            c.process_frame(&standing()).unwrap();
            events.extend(c.tick().unwrap());
        }
        let reps = events
            .iter()
            .filter(|e| matches!(e, WorkoutEvent::Rep(RepEvent::RepCompleted { .. })))
            .count();
        assert_eq!(reps, 3);
        assert_eq!(c.state(), LifecycleState::Complete);
        assert_eq!(c.sink().sessions[0].average_form_score, 1.0);
    }

    #[test]
    fn test_elapsed_seconds_cover_active_and_rest() {
        let catalog = build_default_catalog();
        let mut c = controller(&catalog, plan("bicep_curl", 2, 1, 3));
        activate(&mut c);
        c.tick().unwrap();
        curl_rep(&mut c);
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert_eq!(c.state(), LifecycleState::Active);
        curl_rep(&mut c);
        assert_eq!(c.last_session().unwrap().duration_seconds, 4);
    }
}
