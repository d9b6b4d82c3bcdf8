//! Core domain types for the GetUp exercise-analysis engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Body joints and per-frame joint snapshots
//! - Posture feedback tiers
//! - Exercise definitions and their rep-tracking parameters
//! - Finalized workout sessions and sets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::geometry;

// ============================================================================
// Joint Types
// ============================================================================

/// Body joints reported by the external pose source
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum JointName {
    Nose,
    Neck,
    Root,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// Body side
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// A joint that exists once per side of the body
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimbJoint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl JointName {
    /// Resolve a limb joint on a given side of the body
    pub fn sided(limb: LimbJoint, side: Side) -> JointName {
        match (limb, side) {
            (LimbJoint::Shoulder, Side::Left) => JointName::LeftShoulder,
            (LimbJoint::Shoulder, Side::Right) => JointName::RightShoulder,
            (LimbJoint::Elbow, Side::Left) => JointName::LeftElbow,
            (LimbJoint::Elbow, Side::Right) => JointName::RightElbow,
            (LimbJoint::Wrist, Side::Left) => JointName::LeftWrist,
            (LimbJoint::Wrist, Side::Right) => JointName::RightWrist,
            (LimbJoint::Hip, Side::Left) => JointName::LeftHip,
            (LimbJoint::Hip, Side::Right) => JointName::RightHip,
            (LimbJoint::Knee, Side::Left) => JointName::LeftKnee,
            (LimbJoint::Knee, Side::Right) => JointName::RightKnee,
            (LimbJoint::Ankle, Side::Left) => JointName::LeftAnkle,
            (LimbJoint::Ankle, Side::Right) => JointName::RightAnkle,
        }
    }
}

/// One detected joint: normalized position plus detection confidence
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Joint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Joint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// One frame's worth of detected joints
///
/// An empty snapshot means the pose source saw nobody in the frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JointSnapshot {
    #[serde(default)]
    joints: HashMap<JointName, Joint>,
}

impl JointSnapshot {
    /// Snapshot with no detected person
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful for fixtures
    pub fn with_joint(mut self, name: JointName, joint: Joint) -> Self {
        self.joints.insert(name, joint);
        self
    }

    pub fn insert(&mut self, name: JointName, joint: Joint) {
        self.joints.insert(name, joint);
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Raw joint regardless of confidence
    pub fn get(&self, name: JointName) -> Option<&Joint> {
        self.joints.get(&name)
    }

    /// Joint if detected with at least the default confidence
    pub fn reliable(&self, name: JointName) -> Option<Joint> {
        self.reliable_with(name, geometry::DEFAULT_MIN_CONFIDENCE)
    }

    /// Joint if detected with at least `min_confidence`
    pub fn reliable_with(&self, name: JointName, min_confidence: f64) -> Option<Joint> {
        self.joints
            .get(&name)
            .copied()
            .filter(|joint| geometry::is_reliable(joint, min_confidence))
    }

    /// Reliable limb joint, right side preferred
    pub fn either_side(&self, limb: LimbJoint) -> Option<Joint> {
        self.reliable(JointName::sided(limb, Side::Right))
            .or_else(|| self.reliable(JointName::sided(limb, Side::Left)))
    }
}

// ============================================================================
// Posture Feedback
// ============================================================================

/// Qualitative form tier
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostureQuality {
    Excellent,
    Good,
    NeedsWork,
    Incorrect,
}

impl PostureQuality {
    /// Numeric form score used for set and session averages
    pub fn score(self) -> f64 {
        match self {
            PostureQuality::Excellent => 1.0,
            PostureQuality::Good => 0.8,
            PostureQuality::NeedsWork => 0.5,
            PostureQuality::Incorrect => 0.2,
        }
    }

    /// Whether this tier counts as holding a pose
    pub fn is_acceptable(self) -> bool {
        matches!(self, PostureQuality::Excellent | PostureQuality::Good)
    }
}

/// Per-frame verdict from the posture analyzer
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PostureFeedback {
    pub quality: PostureQuality,
    pub message: &'static str,
    pub detail: &'static str,
}

impl PostureFeedback {
    pub const fn new(quality: PostureQuality, message: &'static str, detail: &'static str) -> Self {
        Self {
            quality,
            message,
            detail,
        }
    }

    /// Neutral verdict for frames without the joints an exercise needs
    pub const fn waiting() -> Self {
        Self::new(
            PostureQuality::Good,
            "Get into position",
            "Stand so your full body is visible",
        )
    }

    pub fn is_waiting(&self) -> bool {
        *self == Self::waiting()
    }
}

impl Default for PostureFeedback {
    fn default() -> Self {
        Self::waiting()
    }
}

// ============================================================================
// Exercise Definitions
// ============================================================================

/// Category of exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Yoga,
}

impl ExerciseCategory {
    pub fn label(self) -> &'static str {
        match self {
            ExerciseCategory::Strength => "Strength",
            ExerciseCategory::Yoga => "Yoga",
        }
    }
}

/// The three joints whose angle drives rep detection, taken from one side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimaryAngle {
    pub endpoint_a: LimbJoint,
    pub vertex: LimbJoint,
    pub endpoint_b: LimbJoint,
}

/// Direction in which the primary angle travels from start to peak
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementDirection {
    /// Angle shrinks toward the peak (curl, squat)
    Closing,
    /// Angle grows toward the peak (press, raise)
    Opening,
}

/// Angle thresholds for the rep state machine, in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    pub start_angle: f64,
    pub peak_angle: f64,
    pub hysteresis: f64,
}

impl RepThresholds {
    pub const DEFAULT_HYSTERESIS: f64 = 10.0;

    pub const fn new(start_angle: f64, peak_angle: f64) -> Self {
        Self {
            start_angle,
            peak_angle,
            hysteresis: Self::DEFAULT_HYSTERESIS,
        }
    }

    pub fn direction(&self) -> MovementDirection {
        if self.start_angle > self.peak_angle {
            MovementDirection::Closing
        } else {
            MovementDirection::Opening
        }
    }
}

/// How reps are counted for an exercise
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RepTracking {
    /// Reps are full start → peak excursions of the primary angle
    Motion {
        angle: PrimaryAngle,
        thresholds: RepThresholds,
    },
    /// Reps are seconds spent holding the pose with acceptable form
    Hold,
}

/// Posture rule set for one exercise
pub type Analyzer = fn(&JointSnapshot) -> PostureFeedback;

/// A static exercise definition
#[derive(Clone, Debug)]
pub struct ExerciseDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub muscle_groups: &'static [&'static str],
    pub camera_setup: &'static str,
    pub category: ExerciseCategory,
    pub default_sets: u32,
    pub default_reps: u32,
    pub tracking: RepTracking,
    pub analyze: Analyzer,
}

impl ExerciseDefinition {
    pub fn is_hold_pose(&self) -> bool {
        matches!(self.tracking, RepTracking::Hold)
    }

    /// Rep thresholds, or None for hold poses
    pub fn thresholds(&self) -> Option<RepThresholds> {
        match self.tracking {
            RepTracking::Motion { thresholds, .. } => Some(thresholds),
            RepTracking::Hold => None,
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// One completed (or cut short) set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    pub set_number: u32,
    pub reps_completed: u32,
    pub form_score: f64,
    pub completed_at: DateTime<Utc>,
}

/// A finalized workout handed to persistence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub exercise_id: String,
    pub exercise_name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub duration_seconds: u64,
    pub completed_sets: u32,
    pub total_reps_completed: u32,
    pub average_form_score: f64,
    pub ended_early: bool,
    pub sets: Vec<ExerciseSet>,
}

impl WorkoutSession {
    /// Form score as a whole percentage, e.g. "87%"
    pub fn form_score_text(&self) -> String {
        format!("{}%", (self.average_form_score * 100.0).round() as u32)
    }

    /// One-line summary for history listings
    pub fn summary(&self) -> String {
        format!(
            "{}/{} sets · {} reps · {} form",
            self.completed_sets,
            self.target_sets,
            self.total_reps_completed,
            self.form_score_text()
        )
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Registry of exercise definitions keyed by id
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: HashMap<&'static str, ExerciseDefinition>,
}
