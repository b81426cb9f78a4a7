use thiserror::Error;

use crate::types::{BodyId, ConstraintId};

/// Configuration errors, reported when a body or constraint is added or
/// reconfigured rather than surfacing later inside the solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("body {0} is not part of the scene")]
    UnknownBody(BodyId),
    #[error("constraint {0} is not part of the scene")]
    UnknownConstraint(ConstraintId),
    #[error("body {0} is attached to a parent and cannot be constrained on its own")]
    AttachedBody(BodyId),
    #[error("constraint links body {0} to itself")]
    SelfConstraint(BodyId),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("invalid mass {0}: must be finite and non-negative")]
    InvalidMass(f32),
    #[error("invalid material: {0}")]
    InvalidMaterial(String),
    #[error("invalid limits: {0}")]
    InvalidLimits(String),
    #[error("invalid motor configuration: {0}")]
    InvalidMotor(String),
    #[error("axis index {index} out of range for {kind} constraint")]
    InvalidAxis { index: usize, kind: &'static str },
    #[error("angular motor on axis {0} has not been configured")]
    MotorNotConfigured(usize),
    #[error("hinge axis must be a finite, non-zero vector")]
    DegenerateAxis,
    #[error("{0} is not supported by {1} constraints")]
    Unsupported(&'static str, &'static str),
    #[error("invalid gravity vector")]
    InvalidGravity,
}

/// Failures of a single `simulate` call. None of these poison the scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("invalid timestep {0}: must be finite and positive")]
    InvalidTimestep(f32),
    #[error("solver diverged on body {body}; restored last valid transforms")]
    Diverged { body: BodyId },
}
