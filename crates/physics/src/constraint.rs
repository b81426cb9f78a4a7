//! # Constraint Descriptors
//!
//! Joints are built inert: a DOF joint pins its pivot (linear axes locked)
//! and leaves every rotation free, a hinge rotates freely about its one axis.
//! Limits and motors are layered on afterwards and can be changed at any
//! time; the scene rebuilds the solver joint from this descriptor whenever it
//! changes, so the descriptor is the single source of truth.

use crate::error::SceneError;
use crate::types::{BodyId, Vec3};

/// Bounds along one axis. Radians for rotations, metres for translations.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AxisRange {
    Free,
    Locked,
    Limited { lower: f32, upper: f32 },
}

impl AxisRange {
    /// Bullet-style interpretation of a `(lower, upper)` pair.
    #[must_use]
    pub fn from_bounds(lower: f32, upper: f32) -> Self {
        if lower == upper {
            AxisRange::Locked
        } else if lower > upper {
            AxisRange::Free
        } else {
            AxisRange::Limited { lower, upper }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HingeLimits {
    pub lower: f32,
    pub upper: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AngularMotor {
    pub low_angle: f32,
    pub high_angle: f32,
    pub target_velocity: f32,
    pub max_force: f32,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    Dof {
        linear_lower: Vec3,
        linear_upper: Vec3,
        angular_lower: Option<Vec3>,
        angular_upper: Option<Vec3>,
        motors: [Option<AngularMotor>; 3],
    },
    Hinge {
        /// Unit length, world space at construction time.
        axis: Vec3,
        limits: Option<HingeLimits>,
        motor: Option<AngularMotor>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintState {
    Unconfigured,
    Limited,
    Motorized,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub body_a: BodyId,
    /// `None` constrains `body_a` to the world.
    pub body_b: Option<BodyId>,
    /// World-space anchor at construction time.
    pub pivot: Vec3,
    pub kind: ConstraintKind,
}

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

impl Constraint {
    /// Per-axis joint. Pins `pivot`, every rotation free until limited.
    #[must_use]
    pub fn dof(body_a: BodyId, body_b: Option<BodyId>, pivot: Vec3) -> Self {
        Self {
            body_a,
            body_b,
            pivot,
            kind: ConstraintKind::Dof {
                linear_lower: Vec3::ZERO,
                linear_upper: Vec3::ZERO,
                angular_lower: None,
                angular_upper: None,
                motors: [None; 3],
            },
        }
    }

    /// Single-axis rotation about `axis` through `pivot`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DegenerateAxis`] if `axis` is zero or not finite.
    pub fn hinge(
        body_a: BodyId,
        body_b: Option<BodyId>,
        pivot: Vec3,
        axis: Vec3,
    ) -> Result<Self, SceneError> {
        let axis = axis.try_normalize().ok_or(SceneError::DegenerateAxis)?;
        Ok(Self {
            body_a,
            body_b,
            pivot,
            kind: ConstraintKind::Hinge {
                axis,
                limits: None,
                motor: None,
            },
        })
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self.kind {
            ConstraintKind::Dof { .. } => "dof",
            ConstraintKind::Hinge { .. } => "hinge",
        }
    }

    #[must_use]
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> {
        std::iter::once(self.body_a).chain(self.body_b)
    }

    #[must_use]
    pub fn references(&self, body: BodyId) -> bool {
        self.bodies().any(|b| b == body)
    }

    #[must_use]
    pub fn state(&self) -> ConstraintState {
        let (limited, motorized) = match &self.kind {
            ConstraintKind::Dof {
                angular_lower,
                angular_upper,
                linear_lower,
                linear_upper,
                motors,
            } => (
                angular_lower.is_some()
                    || angular_upper.is_some()
                    || *linear_lower != Vec3::ZERO
                    || *linear_upper != Vec3::ZERO,
                motors.iter().flatten().any(|m| m.enabled),
            ),
            ConstraintKind::Hinge { limits, motor, .. } => {
                (limits.is_some(), motor.is_some_and(|m| m.enabled))
            }
        };
        if motorized {
            ConstraintState::Motorized
        } else if limited {
            ConstraintState::Limited
        } else {
            ConstraintState::Unconfigured
        }
    }

    /// Restricts hinge rotation to `[lower, upper]` radians. Limits are
    /// rigid and inelastic: `softness` and `bounce` must be 0, the solver has
    /// no per-joint setting for either.
    ///
    /// # Errors
    ///
    /// [`SceneError::Unsupported`] on a DOF joint or for a non-zero
    /// `softness` or `bounce`, [`SceneError::InvalidLimits`] if
    /// `lower > upper` or a bound is not finite.
    pub fn set_limits(
        &mut self,
        lower: f32,
        upper: f32,
        softness: f32,
        bounce: f32,
    ) -> Result<(), SceneError> {
        let ConstraintKind::Hinge { limits, .. } = &mut self.kind else {
            return Err(SceneError::Unsupported("set_limits", "dof"));
        };
        if !(lower.is_finite() && upper.is_finite()) || lower > upper {
            return Err(SceneError::InvalidLimits(format!(
                "hinge range [{lower}, {upper}] must be finite with lower <= upper"
            )));
        }
        if softness != 0.0 {
            return Err(SceneError::Unsupported("limit softness", "hinge"));
        }
        if bounce != 0.0 {
            return Err(SceneError::Unsupported("limit bounce", "hinge"));
        }
        *limits = Some(HingeLimits { lower, upper });
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Constraint::set_angular_upper_limit`].
    pub fn set_angular_lower_limit(&mut self, lower: Vec3) -> Result<(), SceneError> {
        let slot = self.dof_angular_slot("set_angular_lower_limit", lower)?;
        *slot.0 = Some(lower);
        Ok(())
    }

    /// Per-axis rotation bounds in radians. Equal bounds lock an axis,
    /// `lower > upper` leaves it free.
    ///
    /// # Errors
    ///
    /// [`SceneError::Unsupported`] on a hinge, [`SceneError::InvalidLimits`]
    /// for non-finite values.
    pub fn set_angular_upper_limit(&mut self, upper: Vec3) -> Result<(), SceneError> {
        let slot = self.dof_angular_slot("set_angular_upper_limit", upper)?;
        *slot.1 = Some(upper);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Constraint::set_linear_upper_limit`].
    pub fn set_linear_lower_limit(&mut self, lower: Vec3) -> Result<(), SceneError> {
        let (slot, _) = self.dof_linear_slots("set_linear_lower_limit", lower)?;
        *slot = lower;
        Ok(())
    }

    /// Per-axis translation bounds of body B relative to the pivot. Both
    /// start at zero, which pins the pivot.
    ///
    /// # Errors
    ///
    /// [`SceneError::Unsupported`] on a hinge, [`SceneError::InvalidLimits`]
    /// for non-finite values.
    pub fn set_linear_upper_limit(&mut self, upper: Vec3) -> Result<(), SceneError> {
        let (_, slot) = self.dof_linear_slots("set_linear_upper_limit", upper)?;
        *slot = upper;
        Ok(())
    }

    /// Stores a velocity motor for one rotational axis without enabling it.
    /// While enabled, the axis is clamped to `[low_angle, high_angle]`.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidAxis`] for an axis the joint does not have,
    /// [`SceneError::InvalidMotor`] for non-finite values, an empty range or
    /// a negative `max_force`.
    pub fn configure_angular_motor(
        &mut self,
        axis: usize,
        low_angle: f32,
        high_angle: f32,
        target_velocity: f32,
        max_force: f32,
    ) -> Result<(), SceneError> {
        let finite = [low_angle, high_angle, target_velocity, max_force]
            .iter()
            .all(|v| v.is_finite());
        if !finite || low_angle > high_angle || max_force < 0.0 {
            return Err(SceneError::InvalidMotor(format!(
                "axis {axis}: range [{low_angle}, {high_angle}], velocity {target_velocity}, max force {max_force}"
            )));
        }
        let slot = self.motor_slot(axis)?;
        let enabled = slot.is_some_and(|m| m.enabled);
        *slot = Some(AngularMotor {
            low_angle,
            high_angle,
            target_velocity,
            max_force,
            enabled,
        });
        Ok(())
    }

    /// # Errors
    ///
    /// [`SceneError::InvalidAxis`] or [`SceneError::MotorNotConfigured`].
    pub fn enable_angular_motor(&mut self, axis: usize) -> Result<(), SceneError> {
        self.set_motor_enabled(axis, true)
    }

    /// Stops driving the axis. Configured limits stay in force.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidAxis`] or [`SceneError::MotorNotConfigured`].
    pub fn disable_angular_motor(&mut self, axis: usize) -> Result<(), SceneError> {
        self.set_motor_enabled(axis, false)
    }

    #[must_use]
    pub fn motor(&self, axis: usize) -> Option<&AngularMotor> {
        match &self.kind {
            ConstraintKind::Dof { motors, .. } => motors.get(axis).and_then(Option::as_ref),
            ConstraintKind::Hinge { motor, .. } if axis == 0 => motor.as_ref(),
            ConstraintKind::Hinge { .. } => None,
        }
    }

    /// Effective rotational ranges about the joint frame's x, y, z axes.
    /// For a hinge, x is the hinge axis and y, z are locked.
    #[must_use]
    pub fn angular_ranges(&self) -> [AxisRange; 3] {
        match &self.kind {
            ConstraintKind::Dof {
                angular_lower,
                angular_upper,
                motors,
                ..
            } => {
                let lower = angular_lower.unwrap_or(Vec3::ONE);
                let upper = angular_upper.unwrap_or(Vec3::NEG_ONE);
                std::array::from_fn(|i| match motors[i] {
                    Some(m) if m.enabled => AxisRange::Limited {
                        lower: m.low_angle,
                        upper: m.high_angle,
                    },
                    _ => AxisRange::from_bounds(lower[i], upper[i]),
                })
            }
            ConstraintKind::Hinge { limits, motor, .. } => {
                let hinge = match (motor, limits) {
                    (Some(m), _) if m.enabled => AxisRange::Limited {
                        lower: m.low_angle,
                        upper: m.high_angle,
                    },
                    (_, Some(l)) => AxisRange::Limited {
                        lower: l.lower,
                        upper: l.upper,
                    },
                    _ => AxisRange::Free,
                };
                [hinge, AxisRange::Locked, AxisRange::Locked]
            }
        }
    }

    /// Translational ranges about the joint frame's x, y, z axes.
    #[must_use]
    pub fn linear_ranges(&self) -> [AxisRange; 3] {
        match &self.kind {
            ConstraintKind::Dof {
                linear_lower,
                linear_upper,
                ..
            } => std::array::from_fn(|i| AxisRange::from_bounds(linear_lower[i], linear_upper[i])),
            ConstraintKind::Hinge { .. } => [AxisRange::Locked; 3],
        }
    }

    fn set_motor_enabled(&mut self, axis: usize, enabled: bool) -> Result<(), SceneError> {
        let slot = self.motor_slot(axis)?;
        let motor = slot.as_mut().ok_or(SceneError::MotorNotConfigured(axis))?;
        motor.enabled = enabled;
        Ok(())
    }

    fn motor_slot(&mut self, axis: usize) -> Result<&mut Option<AngularMotor>, SceneError> {
        match &mut self.kind {
            ConstraintKind::Dof { motors, .. } => motors
                .get_mut(axis)
                .ok_or(SceneError::InvalidAxis { index: axis, kind: "dof" }),
            ConstraintKind::Hinge { motor, .. } if axis == 0 => Ok(motor),
            ConstraintKind::Hinge { .. } => Err(SceneError::InvalidAxis {
                index: axis,
                kind: "hinge",
            }),
        }
    }

    fn dof_angular_slot(
        &mut self,
        op: &'static str,
        value: Vec3,
    ) -> Result<(&mut Option<Vec3>, &mut Option<Vec3>), SceneError> {
        check_finite(op, value)?;
        match &mut self.kind {
            ConstraintKind::Dof {
                angular_lower,
                angular_upper,
                ..
            } => Ok((angular_lower, angular_upper)),
            ConstraintKind::Hinge { .. } => Err(SceneError::Unsupported(op, "hinge")),
        }
    }

    fn dof_linear_slots(
        &mut self,
        op: &'static str,
        value: Vec3,
    ) -> Result<(&mut Vec3, &mut Vec3), SceneError> {
        check_finite(op, value)?;
        match &mut self.kind {
            ConstraintKind::Dof {
                linear_lower,
                linear_upper,
                ..
            } => Ok((linear_lower, linear_upper)),
            ConstraintKind::Hinge { .. } => Err(SceneError::Unsupported(op, "hinge")),
        }
    }
}

fn check_finite(op: &str, value: Vec3) -> Result<(), SceneError> {
    if let Some(i) = (0..3).find(|&i| !value[i].is_finite()) {
        return Err(SceneError::InvalidLimits(format!(
            "{op}: {} component {} is not finite",
            AXIS_NAMES[i], value[i]
        )));
    }
    Ok(())
}
