//! Joint geometry primitives.
//!
//! Stateless helpers over normalized joint positions. [`angle`] never fails:
//! a zero-length ray yields 0°. [`try_angle`] and [`primary_angle`] report
//! that case as `None` instead.

use crate::{Joint, JointName, JointSnapshot, PrimaryAngle, Side};

/// Confidence a joint needs before any analyzer trusts it
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Angle at `vertex` between the rays to `a` and `b`, in degrees `[0, 180]`
pub fn angle(a: &Joint, vertex: &Joint, b: &Joint) -> f64 {
    try_angle(a, vertex, b).unwrap_or(0.0)
}

/// Like [`angle`], but `None` when either ray has zero length
pub fn try_angle(a: &Joint, vertex: &Joint, b: &Joint) -> Option<f64> {
    let (ax, ay) = (a.x - vertex.x, a.y - vertex.y);
    let (bx, by) = (b.x - vertex.x, b.y - vertex.y);

    let mag_a = (ax * ax + ay * ay).sqrt();
    let mag_b = (bx * bx + by * by).sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return None;
    }

    let cos_angle = ((ax * bx + ay * by) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Confidence gate
pub fn is_reliable(joint: &Joint, threshold: f64) -> bool {
    joint.confidence >= threshold
}

/// Midpoint of two joints as `(x, y)`
pub fn midpoint(a: &Joint, b: &Joint) -> (f64, f64) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Horizontal distance between the shoulder and hip midpoints.
///
/// Large values mean the torso is leaning or swinging.
pub fn torso_lean(
    left_shoulder: &Joint,
    right_shoulder: &Joint,
    left_hip: &Joint,
    right_hip: &Joint,
) -> f64 {
    let (shoulder_x, _) = midpoint(left_shoulder, right_shoulder);
    let (hip_x, _) = midpoint(left_hip, right_hip);
    (shoulder_x - hip_x).abs()
}

/// Primary angle of an exercise, measured on the right side if all three
/// joints are reliable there and both rays have length, otherwise on the
/// left side.
pub fn primary_angle(snapshot: &JointSnapshot, spec: &PrimaryAngle) -> Option<f64> {
    [Side::Right, Side::Left].into_iter().find_map(|side| {
        let a = snapshot.reliable(JointName::sided(spec.endpoint_a, side))?;
        let vertex = snapshot.reliable(JointName::sided(spec.vertex, side))?;
        let b = snapshot.reliable(JointName::sided(spec.endpoint_b, side))?;
        try_angle(&a, &vertex, &b)
    })
}
