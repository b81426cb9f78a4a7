#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
//! # Arm Lab
//!
//! A robotic arm on a turntable, built from rigid bodies and joints and
//! stepped every frame.
//!
//! ## The Crates
//!
//! -   **[`physics`]:** bodies, constraints, the scene and its step. Solving is
//!     delegated to rapier.
//! -   **[`render`]:** camera, orbit controller and the renderer boundary.
//! -   **`armlab`:** this crate. Builds the arm from a [`config::SceneConfig`],
//!     owns the frame loop in [`app::AppContext`], maps keys to the base
//!     motor and optionally reloads the config when it changes on disk.
//!
//! ## Getting Started
//!
//! ```rust,ignore
//! use armlab::app::{run_headless, AppContext};
//! use armlab::config::SceneConfig;
//! use render::TracingRenderer;
//!
//! let mut ctx = AppContext::new(SceneConfig::default(), TracingRenderer::new(1280, 720))?;
//! ctx.handle_input(&armlab::input::InputEvent::Key('m'));
//! run_headless(&mut ctx, 600, None);
//! ```

pub mod app;
pub mod arm;
pub mod config;
pub mod input;
pub mod watcher;
#[cfg(feature = "window")]
pub mod window;

pub use physics;
pub use render;
