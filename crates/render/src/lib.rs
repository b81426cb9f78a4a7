#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
//! Viewing side of the arm lab: a perspective camera, an orbit controller
//! that moves it around a focal point, and the renderer boundary the frame
//! loop draws through.
//!
//! Drawing itself sits behind [`SceneRenderer`]. [`TracingRenderer`] packs
//! the frame into GPU-layout instance buffers and reports it through
//! `tracing` without opening a surface. With the `gpu` feature,
//! `WgpuRenderer` draws the same buffers into a window.

pub mod camera;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod gpu_types;
pub mod mesh;
pub mod orbit;
pub mod renderer;

pub use camera::Camera;
#[cfg(feature = "gpu")]
pub use gpu::WgpuRenderer;
pub use gpu_types::{CameraUniform, InstanceRaw, LightUniform};
pub use orbit::{OrbitController, PointerButton};
pub use renderer::{PointLight, RenderError, RenderScene, SceneRenderer, TracingRenderer};
