//! Translation of [`Constraint`] descriptors into rapier joints, and the
//! inverse measurement of how far a joint has rotated.
//!
//! rapier only pushes back on an angular limit once it is already violated,
//! so a joint driven hard enough can travel far past it within one step.
//! [`guard_limits`] closes that gap: before each solver substep it pulls a
//! limit in to the joint's current angle when the joint is about to cross it.

use rapier3d::prelude::{GenericJoint, GenericJointBuilder, JointAxesMask, JointAxis};

use crate::constraint::{AxisRange, Constraint, ConstraintKind};
use crate::convert::to_isometry;
use crate::types::{Quat, Transform, Vec3};

const LINEAR_AXES: [(JointAxis, JointAxesMask); 3] = [
    (JointAxis::X, JointAxesMask::X),
    (JointAxis::Y, JointAxesMask::Y),
    (JointAxis::Z, JointAxesMask::Z),
];

const ANGULAR_AXES: [(JointAxis, JointAxesMask); 3] = [
    (JointAxis::AngX, JointAxesMask::ANG_X),
    (JointAxis::AngY, JointAxesMask::ANG_Y),
    (JointAxis::AngZ, JointAxesMask::ANG_Z),
];

/// Damping gain of velocity motors. Higher tracks the target velocity
/// more tightly, bounded by the motor's max force.
const MOTOR_DAMPING: f32 = 10.0;

/// Travel allowance added to the predicted angle when deciding whether a
/// limit is about to be crossed.
const LIMIT_MARGIN: f32 = 0.02;
/// Offset of an engaged limit from the current angle. Keeps it strictly
/// violated so the solver treats it as active.
const ENGAGE_EPS: f32 = 1e-4;

/// Joint frames expressed in each body's local space. Both frames coincide
/// in world space when the constraint is created.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointFrames {
    pub a: Transform,
    pub b: Transform,
}

impl JointFrames {
    /// `pose_b` is the world anchor's pose when the constraint has no body B.
    #[must_use]
    pub fn anchor(constraint: &Constraint, pose_a: &Transform, pose_b: &Transform) -> Self {
        let basis = match constraint.kind {
            ConstraintKind::Dof { .. } => Quat::IDENTITY,
            ConstraintKind::Hinge { axis, .. } => Quat::from_rotation_arc(Vec3::X, axis),
        };
        let world = Transform::new(constraint.pivot, basis);
        Self {
            a: pose_a.inverse().mul_transform(&world),
            b: pose_b.inverse().mul_transform(&world),
        }
    }

    /// Rotation of frame B relative to frame A, given current body poses.
    #[must_use]
    pub fn relative_rotation(&self, pose_a: &Transform, pose_b: &Transform) -> Quat {
        let frame_a = pose_a.mul_transform(&self.a);
        let frame_b = pose_b.mul_transform(&self.b);
        (frame_a.rotation.inverse() * frame_b.rotation).normalize()
    }

    /// Twist about the frame's x axis in `[-π, π]`; the hinge angle.
    #[must_use]
    pub fn twist(&self, pose_a: &Transform, pose_b: &Transform) -> f32 {
        self.axis_angles(pose_a, pose_b).x
    }

    /// Twist of the relative rotation about each of frame A's axes, each in
    /// `[-π, π]`. Exact when the joint turns about a single axis, so a
    /// turntable's yaw reads correctly over the whole circle.
    #[must_use]
    pub fn axis_angles(&self, pose_a: &Transform, pose_b: &Transform) -> Vec3 {
        let rel = positive_w(self.relative_rotation(pose_a, pose_b));
        Vec3::new(
            2.0 * rel.x.atan2(rel.w),
            2.0 * rel.y.atan2(rel.w),
            2.0 * rel.z.atan2(rel.w),
        )
    }

    /// Distance between the two anchors in world space.
    #[must_use]
    pub fn separation(&self, pose_a: &Transform, pose_b: &Transform) -> f32 {
        let anchor_a = pose_a.transform_point(self.a.position);
        let anchor_b = pose_b.transform_point(self.b.position);
        anchor_a.distance(anchor_b)
    }
}

/// Builds the solver joint for the descriptor's current configuration.
#[must_use]
pub fn build_joint(constraint: &Constraint, frames: &JointFrames) -> GenericJoint {
    let linear = constraint.linear_ranges();
    let angular = constraint.angular_ranges();

    let mut locked = JointAxesMask::empty();
    for ((_, mask), range) in LINEAR_AXES.iter().zip(&linear) {
        if *range == AxisRange::Locked {
            locked |= *mask;
        }
    }
    for ((_, mask), range) in ANGULAR_AXES.iter().zip(&angular) {
        if *range == AxisRange::Locked {
            locked |= *mask;
        }
    }

    let mut builder = GenericJointBuilder::new(locked)
        .local_frame1(to_isometry(&frames.a))
        .local_frame2(to_isometry(&frames.b))
        .contacts_enabled(false);

    let ranges = LINEAR_AXES.iter().zip(&linear).chain(ANGULAR_AXES.iter().zip(&angular));
    for ((axis, _), range) in ranges {
        if let AxisRange::Limited { lower, upper } = *range {
            builder = builder.limits(*axis, [lower, upper]);
        }
    }

    for (i, (axis, _)) in ANGULAR_AXES.iter().enumerate() {
        if let Some(motor) = constraint.motor(i).filter(|m| m.enabled) {
            builder = builder
                .motor_velocity(*axis, motor.target_velocity, MOTOR_DAMPING)
                .motor_max_force(*axis, motor.max_force);
        }
    }

    builder.build()
}

/// Narrows the angular limits of `joint` that would be crossed within the
/// next `h` seconds. `relative_rate` is body B's angular velocity minus body
/// A's, in world space.
///
/// Angles are measured the way rapier measures them (`2·asin` of the
/// relative rotation's imaginary part) so an engaged limit is seen as
/// violated by the solver. [`build_joint`] restores the configured limits.
pub(crate) fn guard_limits(
    joint: &mut GenericJoint,
    ranges: &[AxisRange; 3],
    frames: &JointFrames,
    pose_a: &Transform,
    pose_b: &Transform,
    relative_rate: Vec3,
    h: f32,
) {
    let frame_a = pose_a.mul_transform(&frames.a).rotation;
    let rel = positive_w(frames.relative_rotation(pose_a, pose_b));
    let imag = [rel.x, rel.y, rel.z];
    for (i, ((axis, _), range)) in ANGULAR_AXES.iter().zip(ranges).enumerate() {
        let AxisRange::Limited { lower, upper } = *range else {
            continue;
        };
        let angle = 2.0 * imag[i].clamp(-1.0, 1.0).asin();
        let rate = relative_rate.dot(frame_a * unit_axis(i));
        joint.set_limits(*axis, guarded_bounds(angle, rate, h, lower, upper));
    }
}

/// Limits for one substep. A side the joint is heading into is pulled in to
/// the current angle when the predicted angle comes within
/// [`LIMIT_MARGIN`] of it; the other side keeps its configured value.
fn guarded_bounds(angle: f32, rate: f32, h: f32, lower: f32, upper: f32) -> [f32; 2] {
    let ahead = angle + rate * h;
    if rate >= 0.0 && angle < upper && ahead + LIMIT_MARGIN >= upper {
        [lower, (angle - ENGAGE_EPS).max(lower)]
    } else if rate < 0.0 && angle > lower && ahead - LIMIT_MARGIN <= lower {
        [(angle + ENGAGE_EPS).min(upper), upper]
    } else {
        [lower, upper]
    }
}

fn positive_w(q: Quat) -> Quat {
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

fn unit_axis(i: usize) -> Vec3 {
    match i {
        0 => Vec3::X,
        1 => Vec3::Y,
        _ => Vec3::Z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BodyId;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn frames_coincide_at_creation() {
        let c = Constraint::hinge(BodyId(0), Some(BodyId(1)), Vec3::new(0.0, 4.75, 0.0), Vec3::Z)
            .unwrap();
        let pose_a = Transform::from_position(Vec3::new(0.0, 8.25, 0.0));
        let pose_b = Transform::from_position(Vec3::new(0.0, 0.75, 0.0));
        let frames = JointFrames::anchor(&c, &pose_a, &pose_b);
        assert!(frames.separation(&pose_a, &pose_b) < 1e-5);
        assert!(frames.twist(&pose_a, &pose_b).abs() < 1e-5);
    }

    #[test]
    fn twist_measures_rotation_about_hinge_axis() {
        let c = Constraint::hinge(BodyId(0), Some(BodyId(1)), Vec3::ZERO, Vec3::Z).unwrap();
        let pose_a = Transform::IDENTITY;
        let frames = JointFrames::anchor(&c, &pose_a, &pose_a);
        let turned = Transform::IDENTITY.with_rotation(Quat::from_rotation_z(FRAC_PI_4));
        assert!((frames.twist(&pose_a, &turned).abs() - FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn dof_angles_report_each_axis() {
        let c = Constraint::dof(BodyId(0), Some(BodyId(1)), Vec3::Y);
        let frames = JointFrames::anchor(&c, &Transform::IDENTITY, &Transform::IDENTITY);
        let turned = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(0.3));
        let angles = frames.axis_angles(&Transform::IDENTITY, &turned);
        assert!(angles.x.abs() < 1e-5);
        assert!((angles.y - 0.3).abs() < 1e-5);
        assert!(angles.z.abs() < 1e-5);
    }

    #[test]
    fn yaw_reads_past_a_quarter_turn() {
        let c = Constraint::dof(BodyId(0), Some(BodyId(1)), Vec3::Y);
        let frames = JointFrames::anchor(&c, &Transform::IDENTITY, &Transform::IDENTITY);
        for yaw in [2.0_f32, -2.0, 3.0, -3.0] {
            let turned = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(yaw));
            let angles = frames.axis_angles(&Transform::IDENTITY, &turned);
            assert!((angles.y - yaw).abs() < 1e-4, "yaw {yaw} read back as {}", angles.y);
            assert!(angles.x.abs() < 1e-4 && angles.z.abs() < 1e-4);
        }
    }

    #[test]
    fn limit_is_pulled_in_only_on_the_approached_side() {
        // far from both limits
        assert_eq!(guarded_bounds(0.0, 1.0, 0.01, -1.0, 1.0), [-1.0, 1.0]);
        // would cross the upper limit this substep
        let [lo, hi] = guarded_bounds(0.9, 20.0, 0.01, -1.0, 1.0);
        assert_eq!(lo, -1.0);
        assert!((hi - (0.9 - ENGAGE_EPS)).abs() < 1e-6);
        // same position, moving away
        assert_eq!(guarded_bounds(0.9, -20.0, 0.01, -1.0, 1.0), [-1.0, 1.0]);
        // approaching the lower limit
        let [lo, hi] = guarded_bounds(-0.99, -0.5, 0.01, -1.0, 1.0);
        assert!((lo - (-0.99 + ENGAGE_EPS)).abs() < 1e-6);
        assert_eq!(hi, 1.0);
        // already past the limit keeps it as configured
        assert_eq!(guarded_bounds(1.2, 5.0, 0.01, -1.0, 1.0), [-1.0, 1.0]);
    }

    #[test]
    fn guard_rewrites_only_limited_axes() {
        let c = Constraint::hinge(BodyId(0), Some(BodyId(1)), Vec3::ZERO, Vec3::Z).unwrap();
        let frames = JointFrames::anchor(&c, &Transform::IDENTITY, &Transform::IDENTITY);
        let ranges = [
            AxisRange::Limited { lower: -0.5, upper: 0.5 },
            AxisRange::Locked,
            AxisRange::Locked,
        ];
        let mut joint = build_joint(&c, &frames);
        let turned = Transform::IDENTITY.with_rotation(Quat::from_rotation_z(0.45));
        guard_limits(
            &mut joint,
            &ranges,
            &frames,
            &Transform::IDENTITY,
            &turned,
            Vec3::Z * 10.0,
            0.01,
        );

        let limits = joint.limits(JointAxis::AngX).unwrap();
        assert!((limits.max - (0.45 - ENGAGE_EPS)).abs() < 1e-4, "max={}", limits.max);
        assert!((limits.min + 0.5).abs() < 1e-6);
        assert!(joint.limits(JointAxis::AngY).is_none());
    }
}
