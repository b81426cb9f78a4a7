//! Scene configuration.
//!
//! Everything tunable about the arm scene is read from JSON. Every field is
//! optional; missing fields take the values of the stock scene, so `{}` is a
//! valid configuration.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, PI};
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use physics::{TimestepMode, Vec3, DEFAULT_STEP, MAX_STEP};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub gravity: [f32; 3],
    pub timestep: TimestepConfig,
    pub ground: GroundConfig,
    pub arm: ArmConfig,
    pub motor: MotorConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// Packed `0xRRGGBB`.
    pub clear_color: u32,
    /// Initial viewport in pixels.
    pub viewport: [u32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -10.0, 0.0],
            timestep: TimestepConfig::default(),
            ground: GroundConfig::default(),
            arm: ArmConfig::default(),
            motor: MotorConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            clear_color: 0xe5_e5_e5,
            viewport: [1280, 720],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Constant steps fed from an accumulator.
    Fixed,
    /// One default-sized step per displayed frame.
    Display,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimestepConfig {
    pub mode: StepMode,
    pub step: f32,
    pub max_substeps: usize,
}

impl Default for TimestepConfig {
    fn default() -> Self {
        Self {
            mode: StepMode::Fixed,
            step: DEFAULT_STEP,
            max_substeps: 5,
        }
    }
}

impl TimestepConfig {
    #[must_use]
    pub fn to_mode(self) -> TimestepMode {
        match self.mode {
            StepMode::Fixed => TimestepMode::Fixed {
                step: self.step,
                max_substeps: self.max_substeps,
            },
            StepMode::Display => TimestepMode::Display,
        }
    }
}

/// Friction and restitution shared by a group of bodies.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    pub color: u32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            color: 0xff_ff_ff,
            friction: 0.9,
            restitution: 0.3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundConfig {
    pub size: [f32; 3],
    pub surface: SurfaceConfig,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: [20.0, 0.5, 20.0],
            surface: SurfaceConfig::default(),
        }
    }
}

/// Arm geometry. Masses left unset follow the bounding-volume rule; `0`
/// pins a part in place. The stock arm has a dynamic base under static
/// middle and end segments.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArmConfig {
    pub base_radius: f32,
    pub base_height: f32,
    pub base_segments: u32,
    pub base_mass: Option<f32>,
    /// Upright block carried by the base.
    pub mount_size: [f32; 3],
    pub middle_size: [f32; 3],
    pub middle_mass: Option<f32>,
    pub end_size: [f32; 3],
    pub end_mass: Option<f32>,
    pub joint_radius: f32,
    pub joint_length: f32,
    pub joint_segments: u32,
    /// Yaw range of the base, symmetric, radians.
    pub base_yaw_limit: f32,
    /// Range of both hinges, symmetric, radians.
    pub hinge_limit: f32,
    pub arm_surface: SurfaceConfig,
    pub joint_surface: SurfaceConfig,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            base_radius: 4.0,
            base_height: 1.0,
            base_segments: 50,
            base_mass: None,
            mount_size: [1.0, 3.0, 3.0],
            middle_size: [1.0, 5.0, 3.0],
            middle_mass: Some(0.0),
            end_size: [1.0, 3.0, 3.0],
            end_mass: Some(0.0),
            joint_radius: 1.0,
            joint_length: 3.0,
            joint_segments: 50,
            base_yaw_limit: PI,
            hinge_limit: FRAC_PI_3,
            arm_surface: SurfaceConfig::default(),
            joint_surface: SurfaceConfig {
                color: 0xff_ff_00,
                ..SurfaceConfig::default()
            },
        }
    }
}

/// Base motor armed from the keyboard.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotorConfig {
    pub axis: usize,
    pub low_angle: f32,
    pub high_angle: f32,
    /// Speed in rad/s; the key picks the direction.
    pub velocity: f32,
    pub max_force: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            axis: 1,
            low_angle: -FRAC_PI_2,
            high_angle: FRAC_PI_2,
            velocity: 1.0,
            max_force: 200.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 20.0, 100.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    pub color: u32,
    pub intensity: f32,
    pub distance: f32,
    pub position: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: 0xff_ff_ff,
            intensity: 1.0,
            distance: 500.0,
            position: [10.0, 10.0, 5.0],
        }
    }
}

impl SceneConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Malformed JSON, unknown fields, or values rejected by
    /// [`SceneConfig::validate`].
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid scene config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the scene and camera cannot recover from. Body and
    /// constraint parameters are validated again when the scene is built.
    ///
    /// # Errors
    ///
    /// The first offending value.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.gravity.iter().all(|g| g.is_finite()),
            "gravity must be finite, got {:?}",
            self.gravity
        );
        ensure!(
            self.timestep.step.is_finite()
                && self.timestep.step > 0.0
                && self.timestep.step <= MAX_STEP,
            "timestep.step must lie in (0, {MAX_STEP}], got {}",
            self.timestep.step
        );
        ensure!(
            self.timestep.max_substeps > 0,
            "timestep.max_substeps must be at least 1"
        );
        let camera = &self.camera;
        ensure!(
            camera.fov > 0.0 && camera.fov < 180.0,
            "camera.fov must lie in (0, 180), got {}",
            camera.fov
        );
        ensure!(
            camera.near > 0.0 && camera.far > camera.near,
            "camera planes must satisfy 0 < near < far, got {} and {}",
            camera.near,
            camera.far
        );
        ensure!(
            self.viewport[0] > 0 && self.viewport[1] > 0,
            "viewport must be non-empty, got {:?}",
            self.viewport
        );
        ensure!(
            self.arm.hinge_limit >= 0.0 && self.arm.base_yaw_limit >= 0.0,
            "arm limits must be non-negative"
        );
        Ok(())
    }

    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}

/// Reads and validates a config file.
///
/// # Errors
///
/// I/O and parse errors, with the path attached.
pub fn load(path: &Path) -> Result<SceneConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SceneConfig::from_json(&text).with_context(|| format!("failed to load config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_stock_scene() {
        assert_eq!(SceneConfig::from_json("{}").unwrap(), SceneConfig::default());
    }

    #[test]
    fn nested_fields_merge_with_defaults() {
        let config = SceneConfig::from_json(r#"{ "arm": { "middle_mass": 15.0 } }"#).unwrap();
        assert_eq!(config.arm.middle_mass, Some(15.0));
        assert_eq!(config.arm.end_mass, Some(0.0));
        assert_eq!(config.arm.base_mass, None);
        assert!((config.arm.hinge_limit - FRAC_PI_3).abs() < f32::EPSILON);
    }

    #[test]
    fn null_mass_restores_the_volume_rule() {
        let config =
            SceneConfig::from_json(r#"{ "arm": { "middle_mass": null, "end_mass": null } }"#).unwrap();
        assert_eq!(config.arm.middle_mass, None);
        assert_eq!(config.arm.end_mass, None);
    }

    #[test]
    fn step_above_the_scene_clamp_is_rejected() {
        let err = SceneConfig::from_json(r#"{ "timestep": { "step": 0.25 } }"#).unwrap_err();
        assert!(format!("{err:#}").contains("timestep.step"), "{err:#}");
        let edge = format!(r#"{{ "timestep": {{ "step": {MAX_STEP} }} }}"#);
        assert!(SceneConfig::from_json(&edge).is_ok());
        assert!(SceneConfig::from_json(r#"{ "timestep": { "step": 0.0 } }"#).is_err());
    }

    #[test]
    fn display_mode_parses_lowercase() {
        let config = SceneConfig::from_json(r#"{ "timestep": { "mode": "display" } }"#).unwrap();
        assert_eq!(config.timestep.to_mode(), TimestepMode::Display);
    }
}
