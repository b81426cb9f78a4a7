//! Renderer boundary.
//!
//! The frame loop hands a [`RenderScene`] and the [`Camera`] to a
//! [`SceneRenderer`] once per tick. [`TracingRenderer`] is the headless
//! implementation: it stages the frame exactly as a GPU upload would and
//! reports it through `tracing`.

use glam::Vec3;
use physics::BodySnapshot;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::camera::Camera;
use crate::gpu_types::{hex_rgba, CameraUniform, InstanceRaw};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The surface must be reconfigured; resizing to the current size does it.
    #[error("render surface lost")]
    SurfaceLost,
    #[error("renderer out of memory")]
    OutOfMemory,
    #[error("render backend error: {0}")]
    Backend(String),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    /// Packed `0xRRGGBB`.
    pub color: u32,
    pub intensity: f32,
    /// Range of the light; 0 means unlimited.
    pub distance: f32,
    pub position: Vec3,
}

impl PointLight {
    #[must_use]
    pub fn rgba(&self) -> [f32; 4] {
        hex_rgba(self.color)
    }
}

/// Everything drawn in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderScene {
    pub instances: Vec<InstanceRaw>,
    pub lights: Vec<PointLight>,
    pub clear_color: [f32; 4],
}

impl RenderScene {
    #[must_use]
    pub fn new(clear_color: u32) -> Self {
        Self {
            instances: Vec::new(),
            lights: Vec::new(),
            clear_color: hex_rgba(clear_color),
        }
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Replaces the instance list with the given bodies, keeping their order.
    pub fn update(&mut self, bodies: &[BodySnapshot]) {
        self.instances.clear();
        self.instances.extend(bodies.iter().map(InstanceRaw::from));
    }
}

pub trait SceneRenderer {
    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Backend failures. The caller decides whether the loop continues.
    fn render(&mut self, scene: &RenderScene, camera: &Camera) -> Result<(), RenderError>;

    /// New surface size in physical pixels. Zero sizes are ignored.
    fn resize(&mut self, width: u32, height: u32);
}

/// Headless renderer. Packs each frame into a staging buffer and logs a
/// summary every `log_every` frames.
#[derive(Debug)]
pub struct TracingRenderer {
    size: (u32, u32),
    frames: u64,
    log_every: u64,
    staging: Vec<u8>,
    uniform: CameraUniform,
}

impl TracingRenderer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: 0,
            log_every: 60,
            staging: Vec::new(),
            uniform: bytemuck::Zeroable::zeroed(),
        }
    }

    #[must_use]
    pub fn with_log_interval(mut self, frames: u64) -> Self {
        self.log_every = frames.max(1);
        self
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn log_interval(&self) -> u64 {
        self.log_every
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Bytes staged by the last frame: instances followed by the camera.
    #[must_use]
    pub fn staged_bytes(&self) -> &[u8] {
        &self.staging
    }

    #[must_use]
    pub fn camera_uniform(&self) -> &CameraUniform {
        &self.uniform
    }
}

impl SceneRenderer for TracingRenderer {
    fn render(&mut self, scene: &RenderScene, camera: &Camera) -> Result<(), RenderError> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(RenderError::SurfaceLost);
        }
        self.uniform = CameraUniform::from(camera);
        self.staging.clear();
        self.staging
            .extend_from_slice(bytemuck::cast_slice(&scene.instances));
        self.staging
            .extend_from_slice(bytemuck::bytes_of(&self.uniform));
        self.frames += 1;

        trace!(
            frame = self.frames,
            instances = scene.instances.len(),
            bytes = self.staging.len(),
            "frame staged"
        );
        if self.frames % self.log_every == 1 || self.log_every == 1 {
            info!(
                frame = self.frames,
                instances = scene.instances.len(),
                lights = scene.lights.len(),
                eye = ?camera.position,
                "rendered frame"
            );
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring zero-sized surface");
            return;
        }
        self.size = (width, height);
        debug!(width, height, "surface resized");
    }
}
