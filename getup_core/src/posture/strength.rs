//! Strength exercise rule sets.

use super::{pair, same_side};
use crate::geometry::{angle, torso_lean};
use crate::PostureQuality::{Excellent, Good, Incorrect, NeedsWork};
use crate::{JointSnapshot, LimbJoint, PostureFeedback};

// ── Bicep Curl ──────────────────────────────────────────────────────────────

/// Max horizontal shoulder/hip offset before the curl counts as swinging
const CURL_MAX_SWING: f64 = 0.08;

pub fn bicep_curl(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some([shoulder, elbow, wrist, hip]) = same_side(
        snapshot,
        [
            LimbJoint::Shoulder,
            LimbJoint::Elbow,
            LimbJoint::Wrist,
            LimbJoint::Hip,
        ],
    ) else {
        return PostureFeedback::waiting();
    };

    if (shoulder.x - hip.x).abs() >= CURL_MAX_SWING {
        return PostureFeedback::new(
            Incorrect,
            "Stop swinging!",
            "Keep your upper body still. Only your forearm should move.",
        );
    }

    let elbow_angle = angle(&shoulder, &elbow, &wrist);
    match elbow_angle {
        a if a < 50.0 => PostureFeedback::new(
            Excellent,
            "Perfect curl!",
            "Great contraction at the top. Now lower slowly.",
        ),
        a if a < 80.0 => PostureFeedback::new(
            Good,
            "Good, curl higher",
            "Squeeze the bicep and bring the weight a little closer.",
        ),
        a if a < 130.0 => PostureFeedback::new(
            NeedsWork,
            "Keep going...",
            "Halfway there. Keep curling upward.",
        ),
        a if a < 160.0 => PostureFeedback::new(
            Good,
            "Good start position",
            "Curl the weight up toward your shoulder.",
        ),
        _ => PostureFeedback::new(
            Excellent,
            "Full extension ✓",
            "Arms fully lowered. Start the next rep.",
        ),
    }
}

// ── Shoulder Press ──────────────────────────────────────────────────────────

const PRESS_MAX_LEAN: f64 = 0.12;

pub fn shoulder_press(snapshot: &JointSnapshot) -> PostureFeedback {
    let (
        Some(shoulders),
        Some(elbows),
        Some(wrists),
        Some(hips),
    ) = (
        pair(snapshot, LimbJoint::Shoulder),
        pair(snapshot, LimbJoint::Elbow),
        pair(snapshot, LimbJoint::Wrist),
        pair(snapshot, LimbJoint::Hip),
    )
    else {
        return PostureFeedback::waiting();
    };

    if torso_lean(&shoulders.0, &shoulders.1, &hips.0, &hips.1) > PRESS_MAX_LEAN {
        return PostureFeedback::new(
            Incorrect,
            "Straighten your back",
            "Avoid arching. Engage your core throughout the press.",
        );
    }

    let left = angle(&shoulders.0, &elbows.0, &wrists.0);
    let right = angle(&shoulders.1, &elbows.1, &wrists.1);
    match (left + right) / 2.0 {
        a if a >= 160.0 => PostureFeedback::new(
            Excellent,
            "Arms fully extended!",
            "Excellent lockout. Lower with control.",
        ),
        a if a >= 120.0 => PostureFeedback::new(
            Good,
            "Nearly there!",
            "Press all the way up until arms are straight.",
        ),
        a if a >= 100.0 => PostureFeedback::new(
            NeedsWork,
            "Keep pressing up",
            "Drive through the top, don't stop halfway.",
        ),
        _ => PostureFeedback::new(
            Good,
            "Start position ✓",
            "Elbows at 90°. Press the dumbbells overhead.",
        ),
    }
}

// ── Lateral Raise ───────────────────────────────────────────────────────────

const RAISE_LOCKED_ELBOW: f64 = 170.0;

pub fn lateral_raise(snapshot: &JointSnapshot) -> PostureFeedback {
    let (Some(shoulders), Some(elbows), Some(wrists)) = (
        pair(snapshot, LimbJoint::Shoulder),
        pair(snapshot, LimbJoint::Elbow),
        pair(snapshot, LimbJoint::Wrist),
    ) else {
        return PostureFeedback::waiting();
    };

    let left = angle(&shoulders.0, &elbows.0, &wrists.0);
    let right = angle(&shoulders.1, &elbows.1, &wrists.1);
    if left > RAISE_LOCKED_ELBOW || right > RAISE_LOCKED_ELBOW {
        return PostureFeedback::new(
            NeedsWork,
            "Soften your elbows",
            "Keep a slight bend in the elbows throughout.",
        );
    }

    let elevation = ((wrists.0.y - shoulders.0.y) + (wrists.1.y - shoulders.1.y)) / 2.0;
    match elevation {
        e if e >= 0.05 => PostureFeedback::new(
            Excellent,
            "Parallel! Great raise",
            "Arms at shoulder height. Lower slowly with control.",
        ),
        e if e >= -0.02 => PostureFeedback::new(
            Good,
            "Raise a little higher",
            "Aim for shoulder height, about parallel to the floor.",
        ),
        _ => PostureFeedback::new(
            Good,
            "Starting position ✓",
            "Lift both arms out to your sides simultaneously.",
        ),
    }
}

// ── Squat ───────────────────────────────────────────────────────────────────

/// Knees narrower than this fraction of the ankle width are caving in
const SQUAT_KNEE_CAVE_RATIO: f64 = 0.8;
const SQUAT_MAX_LEAN: f64 = 0.15;

pub fn squat(snapshot: &JointSnapshot) -> PostureFeedback {
    let (Some(hips), Some(knees), Some(ankles)) = (
        pair(snapshot, LimbJoint::Hip),
        pair(snapshot, LimbJoint::Knee),
        pair(snapshot, LimbJoint::Ankle),
    ) else {
        return PostureFeedback::waiting();
    };

    let knee_width = (knees.0.x - knees.1.x).abs();
    let ankle_width = (ankles.0.x - ankles.1.x).abs();
    if knee_width < ankle_width * SQUAT_KNEE_CAVE_RATIO {
        return PostureFeedback::new(
            Incorrect,
            "Push knees out!",
            "Your knees are caving inward. Drive them out over your toes.",
        );
    }

    // Shoulders are optional: a side-on camera often loses one of them.
    if let Some(shoulders) = pair(snapshot, LimbJoint::Shoulder) {
        if torso_lean(&shoulders.0, &shoulders.1, &hips.0, &hips.1) > SQUAT_MAX_LEAN {
            return PostureFeedback::new(
                Incorrect,
                "Keep chest up",
                "You're leaning too far forward. Lift your chest.",
            );
        }
    }

    let left = angle(&hips.0, &knees.0, &ankles.0);
    let right = angle(&hips.1, &knees.1, &ankles.1);
    match (left + right) / 2.0 {
        a if a < 100.0 => PostureFeedback::new(
            Excellent,
            "Depth achieved!",
            "Thighs parallel or below. Drive through heels to stand.",
        ),
        a if a < 130.0 => PostureFeedback::new(
            Good,
            "Go a little deeper",
            "Try to get thighs parallel to the floor.",
        ),
        a if a < 160.0 => PostureFeedback::new(
            NeedsWork,
            "Squat lower",
            "You're only part way down. Continue descending with control.",
        ),
        _ => PostureFeedback::new(
            Excellent,
            "Standing tall ✓",
            "Feet hip-width. Toes slightly out. Begin your squat.",
        ),
    }
}

// ── Overhead Tricep Extension ───────────────────────────────────────────────

/// How far below the shoulder the elbow may drop before it counts as drifting
const TRICEP_ELBOW_DROP: f64 = 0.05;

pub fn tricep_extension(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some([shoulder, elbow, wrist]) = same_side(
        snapshot,
        [LimbJoint::Shoulder, LimbJoint::Elbow, LimbJoint::Wrist],
    ) else {
        return PostureFeedback::waiting();
    };

    if elbow.y <= shoulder.y - TRICEP_ELBOW_DROP {
        return PostureFeedback::new(
            NeedsWork,
            "Elbow drifting down",
            "Keep your elbows high and pointing toward the ceiling.",
        );
    }

    match angle(&shoulder, &elbow, &wrist) {
        a if a < 50.0 => PostureFeedback::new(
            NeedsWork,
            "Lower the weight more",
            "Let the dumbbell descend behind your head before pressing up.",
        ),
        a if a < 100.0 => PostureFeedback::new(
            Good,
            "Good stretch",
            "Now press upward to extend the arms.",
        ),
        a if a >= 150.0 => PostureFeedback::new(
            Excellent,
            "Full extension!",
            "Arms locked out. Lower slowly behind the head.",
        ),
        _ => PostureFeedback::new(
            Good,
            "Keep extending",
            "Press all the way up until arms are straight.",
        ),
    }
}
