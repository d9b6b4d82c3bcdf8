//! Yoga hold rule sets.
//!
//! Hold poses have no rep motion; the verdict decides whether the current
//! second counts toward the hold target.

use super::{arms_overhead, pair};
use crate::geometry::{angle, midpoint, torso_lean};
use crate::PostureQuality::{Excellent, Good, Incorrect, NeedsWork};
use crate::{Joint, JointName, JointSnapshot, LimbJoint, PostureFeedback, Side};

/// Knee angle of whichever leg is fully visible, left leg first
fn front_knee_angle(snapshot: &JointSnapshot, hips: (Joint, Joint)) -> Option<f64> {
    [(Side::Left, hips.0), (Side::Right, hips.1)]
        .into_iter()
        .find_map(|(side, hip)| {
            let knee = snapshot.reliable(JointName::sided(LimbJoint::Knee, side))?;
            let ankle = snapshot.reliable(JointName::sided(LimbJoint::Ankle, side))?;
            Some(angle(&hip, &knee, &ankle))
        })
}

fn torso(snapshot: &JointSnapshot) -> Option<((Joint, Joint), (Joint, Joint))> {
    Some((
        pair(snapshot, LimbJoint::Shoulder)?,
        pair(snapshot, LimbJoint::Hip)?,
    ))
}

// ── Warrior I ───────────────────────────────────────────────────────────────

pub fn warrior_one(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some((shoulders, hips)) = torso(snapshot) else {
        return PostureFeedback::waiting();
    };

    if !arms_overhead(shoulders, pair(snapshot, LimbJoint::Wrist), 0.1) {
        return PostureFeedback::new(
            NeedsWork,
            "Raise your arms higher",
            "Reach both arms straight up, palms facing each other.",
        );
    }

    if (hips.0.y - hips.1.y).abs() >= 0.06 {
        return PostureFeedback::new(
            NeedsWork,
            "Square your hips",
            "Rotate your back hip forward so both hips face the front.",
        );
    }

    match front_knee_angle(snapshot, hips) {
        Some(a) if a < 80.0 => PostureFeedback::new(
            NeedsWork,
            "Knee too far forward",
            "Your front knee should be directly over your ankle.",
        ),
        Some(a) if a < 100.0 => PostureFeedback::new(
            Excellent,
            "Warrior I ✓ Hold strong!",
            "Perfect 90° bend. Arms high, hips square. Breathe deeply.",
        ),
        Some(a) if a < 130.0 => PostureFeedback::new(
            Good,
            "Bend front knee deeper",
            "Lower your hips until front knee reaches 90°.",
        ),
        Some(_) => PostureFeedback::new(
            Good,
            "Great stance width",
            "Now bend your front knee toward 90°.",
        ),
        None => PostureFeedback::new(
            Good,
            "Hold the pose",
            "Keep arms raised, hips square, breathe steadily.",
        ),
    }
}

// ── Warrior II ──────────────────────────────────────────────────────────────

const WARRIOR_TWO_ARM_LEVEL: f64 = 0.08;
const WARRIOR_TWO_MAX_LEAN: f64 = 0.08;

pub fn warrior_two(snapshot: &JointSnapshot) -> PostureFeedback {
    let (Some((shoulders, hips)), Some(wrists)) = (torso(snapshot), pair(snapshot, LimbJoint::Wrist))
    else {
        return PostureFeedback::waiting();
    };

    if torso_lean(&shoulders.0, &shoulders.1, &hips.0, &hips.1) >= WARRIOR_TWO_MAX_LEAN {
        return PostureFeedback::new(
            Incorrect,
            "Torso is leaning",
            "Keep your torso upright directly over your hips. Don't lean forward.",
        );
    }

    let arms_parallel = (wrists.0.y - shoulders.0.y).abs() < WARRIOR_TWO_ARM_LEVEL
        && (wrists.1.y - shoulders.1.y).abs() < WARRIOR_TWO_ARM_LEVEL;
    if !arms_parallel {
        return PostureFeedback::new(
            NeedsWork,
            "Arms parallel to floor",
            "Extend both arms out at shoulder height, palms facing down.",
        );
    }

    match front_knee_angle(snapshot, hips) {
        Some(a) if a < 80.0 => PostureFeedback::new(
            NeedsWork,
            "Knee past ankle",
            "Stack your front knee directly over your ankle, not beyond.",
        ),
        Some(a) if a < 100.0 => PostureFeedback::new(
            Excellent,
            "Warrior II ✓ Beautiful!",
            "Strong 90° bend, arms parallel, torso tall. Hold and breathe.",
        ),
        Some(_) => PostureFeedback::new(
            Good,
            "Sink lower into the pose",
            "Bend your front knee deeper toward 90°.",
        ),
        None => PostureFeedback::new(
            Good,
            "Hold Warrior II",
            "Arms wide, gaze over front fingertips, breathe.",
        ),
    }
}

// ── Tree Pose ───────────────────────────────────────────────────────────────

/// Horizontal distance a knee must swing outside its hip to count as raised
const TREE_KNEE_OUT: f64 = 0.05;

pub fn tree_pose(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some((shoulders, hips)) = torso(snapshot) else {
        return PostureFeedback::waiting();
    };

    let left_raised = snapshot
        .reliable(JointName::LeftKnee)
        .is_some_and(|knee| knee.x < hips.0.x - TREE_KNEE_OUT);
    let right_raised = snapshot
        .reliable(JointName::RightKnee)
        .is_some_and(|knee| knee.x > hips.1.x + TREE_KNEE_OUT);

    if !(left_raised || right_raised) {
        return PostureFeedback::new(
            NeedsWork,
            "Lift one foot",
            "Place the sole of one foot on your inner calf or thigh. Avoid the knee.",
        );
    }

    if (shoulders.0.y - shoulders.1.y).abs() >= 0.05 {
        return PostureFeedback::new(
            NeedsWork,
            "Level your shoulders",
            "Keep both shoulders even. Engage your core to stay balanced.",
        );
    }

    if !arms_overhead(shoulders, pair(snapshot, LimbJoint::Wrist), 0.15) {
        return PostureFeedback::new(
            Good,
            "Raise your arms",
            "Bring both arms overhead, palms together or shoulder-width.",
        );
    }

    PostureFeedback::new(
        Excellent,
        "Tree Pose, rooted!",
        "Balanced, arms high, shoulders level. Breathe and hold steady.",
    )
}

// ── Downward Dog ────────────────────────────────────────────────────────────

pub fn downward_dog(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some((shoulders, hips)) = torso(snapshot) else {
        return PostureFeedback::waiting();
    };

    let (_, hip_y) = midpoint(&hips.0, &hips.1);
    let (_, shoulder_y) = midpoint(&shoulders.0, &shoulders.1);
    if hip_y <= shoulder_y + 0.1 {
        return PostureFeedback::new(
            NeedsWork,
            "Push hips up higher",
            "Drive your tailbone toward the ceiling to form an inverted V.",
        );
    }

    // Legs the camera cannot see are given the benefit of the doubt.
    let knees_straight = match (
        pair(snapshot, LimbJoint::Knee),
        pair(snapshot, LimbJoint::Ankle),
    ) {
        (Some(knees), Some(ankles)) => {
            angle(&hips.0, &knees.0, &ankles.0) > 140.0
                && angle(&hips.1, &knees.1, &ankles.1) > 140.0
        }
        _ => true,
    };
    if !knees_straight {
        return PostureFeedback::new(
            Good,
            "Straighten your legs",
            "Try to straighten the knees. Bend slightly if hamstrings are tight.",
        );
    }

    let hands_down = pair(snapshot, LimbJoint::Wrist)
        .map(|(left, right)| midpoint(&left, &right).1 < shoulder_y)
        .unwrap_or(true);
    if !hands_down {
        return PostureFeedback::new(
            NeedsWork,
            "Lengthen your spine",
            "Press hands into floor and pull chest toward thighs.",
        );
    }

    PostureFeedback::new(
        Excellent,
        "Downward Dog, perfect!",
        "Hips high, spine long, heels reaching down. Hold and breathe.",
    )
}

// ── Chair Pose ──────────────────────────────────────────────────────────────

const CHAIR_MAX_LEAN: f64 = 0.18;

pub fn chair_pose(snapshot: &JointSnapshot) -> PostureFeedback {
    let Some((shoulders, hips)) = torso(snapshot) else {
        return PostureFeedback::waiting();
    };

    if torso_lean(&shoulders.0, &shoulders.1, &hips.0, &hips.1) > CHAIR_MAX_LEAN {
        return PostureFeedback::new(
            Incorrect,
            "Too much forward lean",
            "Keep your torso relatively upright, weight in your heels.",
        );
    }

    if !arms_overhead(shoulders, pair(snapshot, LimbJoint::Wrist), 0.1) {
        return PostureFeedback::new(
            NeedsWork,
            "Raise your arms",
            "Reach both arms straight overhead, biceps beside your ears.",
        );
    }

    let knee_angle = match (
        pair(snapshot, LimbJoint::Knee),
        pair(snapshot, LimbJoint::Ankle),
    ) {
        (Some(knees), Some(ankles)) => Some(
            (angle(&hips.0, &knees.0, &ankles.0) + angle(&hips.1, &knees.1, &ankles.1)) / 2.0,
        ),
        _ => None,
    };

    match knee_angle {
        Some(a) if a < 80.0 => PostureFeedback::new(
            NeedsWork,
            "Knees past toes",
            "Sit back more. Keep knees over ankles, not beyond.",
        ),
        Some(a) if a < 130.0 => PostureFeedback::new(
            Excellent,
            "Chair Pose, strong!",
            "Sitting low, arms high, weight in heels. Hold and breathe.",
        ),
        Some(_) => PostureFeedback::new(
            Good,
            "Sit lower",
            "Bend knees deeper as if sitting in an invisible chair.",
        ),
        None => PostureFeedback::new(
            Good,
            "Bend your knees",
            "Lower your hips as if sitting back into a chair.",
        ),
    }
}
