#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
//! # Articulated Scene Physics
//!
//! Scene construction and stepping for small articulated rigs: named rigid
//! shapes, joints between them, and a single `simulate` step. Dynamics,
//! contacts and constraint solving are delegated to rapier; this crate owns
//! the registries, validates configuration before it reaches the solver and
//! keeps the scene recoverable when a step goes wrong.
//!
//! ## Key Components
//!
//! -   **Bodies:** [`RigidBody`] descriptors (box or cylinder, material,
//!     mass, transform, attached children).
//! -   **Constraints:** [`Constraint`] descriptors for DOF and hinge joints,
//!     with limits and per-axis velocity motors.
//! -   **Scene:** [`Scene`] owns both registries, gravity and the step.
//! -   **Timestep:** [`FixedStepper`] turns frame time into fixed steps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use physics::{Constraint, Material, RigidBody, Scene, Vec3};
//!
//! let mut scene = Scene::new();
//! let ground = scene.add(RigidBody::cuboid(20.0, 0.5, 20.0, Material::default()).with_mass(0.0))?;
//! let arm = scene.add(RigidBody::cuboid(1.0, 5.0, 3.0, Material::default()).with_position(Vec3::new(0.0, 3.0, 0.0)))?;
//! let hinge = scene.add_constraint(Constraint::hinge(arm, Some(ground), Vec3::new(0.0, 0.5, 0.0), Vec3::Z)?)?;
//! scene.update_constraint(hinge, |c| c.set_limits(-1.0, 1.0, 0.0, 0.0))?;
//! scene.simulate(None)?;
//! ```

pub mod body;
pub mod constraint;
mod convert;
pub mod error;
pub mod joint;
pub mod simulation;
pub mod timestep;
pub mod types;
mod world;

pub use body::RigidBody;
pub use constraint::{AngularMotor, AxisRange, Constraint, ConstraintKind, ConstraintState, HingeLimits};
pub use error::{SceneError, StepError};
pub use simulation::{BodySnapshot, Scene, StepReport, DEFAULT_GRAVITY, DEFAULT_STEP, MAX_STEP};
pub use timestep::{FixedStepper, TimestepMode};
pub use types::{BodyId, ConstraintId, Mat4, Material, Quat, Shape, Transform, Vec3};
