//! Posture analysis: one rule set per exercise.
//!
//! Every analyzer maps a joint snapshot to a [`PostureFeedback`]. Analyzers
//! gather the joints they need first and fall back to
//! [`PostureFeedback::waiting`] when any of them is missing or unreliable.
//! Safety checks (leaning, knees caving, swinging) run before the angle
//! buckets and short-circuit.
//!
//! Vertical comparisons assume the pose source's y axis grows upward.

pub mod strength;
pub mod yoga;

use crate::{ExerciseDefinition, Joint, JointName, JointSnapshot, LimbJoint, PostureFeedback, Side};

/// Run the exercise's rule set against one snapshot
pub fn analyze(definition: &ExerciseDefinition, snapshot: &JointSnapshot) -> PostureFeedback {
    if snapshot.is_empty() {
        return PostureFeedback::waiting();
    }
    (definition.analyze)(snapshot)
}

/// Reliable left/right pair of a limb joint
pub(crate) fn pair(snapshot: &JointSnapshot, limb: LimbJoint) -> Option<(Joint, Joint)> {
    let left = snapshot.reliable(JointName::sided(limb, Side::Left))?;
    let right = snapshot.reliable(JointName::sided(limb, Side::Right))?;
    Some((left, right))
}

/// Several limb joints taken from the same side, right side first
pub(crate) fn same_side<const N: usize>(
    snapshot: &JointSnapshot,
    limbs: [LimbJoint; N],
) -> Option<[Joint; N]> {
    [Side::Right, Side::Left].into_iter().find_map(|side| {
        let mut joints = [Joint::new(0.0, 0.0, 0.0); N];
        for (slot, limb) in joints.iter_mut().zip(limbs) {
            *slot = snapshot.reliable(JointName::sided(limb, side))?;
        }
        Some(joints)
    })
}

/// Both wrists at least `margin` above their shoulders
pub(crate) fn arms_overhead(
    shoulders: (Joint, Joint),
    wrists: Option<(Joint, Joint)>,
    margin: f64,
) -> bool {
    match wrists {
        Some((left_wrist, right_wrist)) => {
            left_wrist.y > shoulders.0.y + margin && right_wrist.y > shoulders.1.y + margin
        }
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Snapshot builders shared by the analyzer tests.

    use crate::{Joint, JointName, JointSnapshot};

    pub fn snapshot(joints: &[(JointName, f64, f64)]) -> JointSnapshot {
        joints
            .iter()
            .fold(JointSnapshot::empty(), |snap, &(name, x, y)| {
                snap.with_joint(name, Joint::new(x, y, 0.9))
            })
    }

    /// Same snapshot with every confidence forced to `confidence`
    pub fn with_confidence(snapshot: &JointSnapshot, confidence: f64) -> JointSnapshot {
        use JointName::*;
        let mut out = JointSnapshot::empty();
        for name in [
            Nose, Neck, Root, LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftWrist,
            RightWrist, LeftHip, RightHip, LeftKnee, RightKnee, LeftAnkle, RightAnkle,
        ] {
            if let Some(joint) = snapshot.get(name) {
                out.insert(name, Joint::new(joint.x, joint.y, confidence));
            }
        }
        out
    }

    /// Upright figure facing the camera, arms hanging, legs straight
    pub fn standing() -> JointSnapshot {
        use JointName::*;
        snapshot(&[
            (Nose, 0.50, 0.90),
            (Neck, 0.50, 0.80),
            (LeftShoulder, 0.42, 0.78),
            (RightShoulder, 0.58, 0.78),
            (LeftElbow, 0.40, 0.62),
            (RightElbow, 0.60, 0.62),
            (LeftWrist, 0.40, 0.48),
            (RightWrist, 0.60, 0.48),
            (Root, 0.50, 0.50),
            (LeftHip, 0.45, 0.50),
            (RightHip, 0.55, 0.50),
            (LeftKnee, 0.45, 0.30),
            (RightKnee, 0.55, 0.30),
            (LeftAnkle, 0.45, 0.10),
            (RightAnkle, 0.55, 0.10),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::catalog::get_default_catalog;

    #[test]
    fn test_empty_snapshot_waits_for_every_exercise() {
        for definition in get_default_catalog().exercises.values() {
            assert_eq!(
                analyze(definition, &JointSnapshot::empty()),
                PostureFeedback::waiting(),
                "{} should wait on an empty frame",
                definition.id
            );
        }
    }

    #[test]
    fn test_low_confidence_waits_for_every_exercise() {
        let dim = with_confidence(&standing(), 0.1);
        for definition in get_default_catalog().exercises.values() {
            assert!(
                analyze(definition, &dim).is_waiting(),
                "{} should wait when no joint is reliable",
                definition.id
            );
        }
    }

    #[test]
    fn test_same_side_requires_one_complete_side() {
        use JointName::*;
        let snap = snapshot(&[
            (LeftShoulder, 0.4, 0.8),
            (LeftElbow, 0.4, 0.6),
            (RightShoulder, 0.6, 0.8),
        ]);
        let [shoulder, elbow] =
            same_side(&snap, [LimbJoint::Shoulder, LimbJoint::Elbow]).unwrap();
        assert_eq!(shoulder.x, 0.4);
        assert_eq!(elbow.y, 0.6);

        assert!(same_side(&snap, [LimbJoint::Shoulder, LimbJoint::Wrist]).is_none());
    }
}
