//! # Arm Lab Application Logic
//!
//! [`AppContext`] owns everything a frame touches: the physics scene, the arm
//! handles, the camera and its orbit controller, the renderer and the
//! timestep state. Front-ends (the headless loop below, the window in
//! [`crate::window`]) only feed it input events and frame times.
//!
//! One [`AppContext::tick`] is: advance physics, render, update the orbit
//! controller. Failures inside a tick are logged and the loop carries on with
//! the last valid state; only an out-of-memory renderer stops it.

use anyhow::{Context, Result};
use physics::{FixedStepper, Scene, StepError, TimestepMode, Vec3};
use render::{Camera, OrbitController, PointLight, RenderError, RenderScene, SceneRenderer};
use tracing::{debug, error, info, warn};

use crate::arm::{build_scene, ArmHandles};
use crate::config::SceneConfig;
use crate::input::{InputEvent, MotorCommand};
use crate::watcher::ConfigWatcher;

/// Frame time used by [`run_headless`].
pub const HEADLESS_FRAME: f32 = 1.0 / 60.0;

/// What one tick did.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub steps: usize,
    pub failed_steps: usize,
    /// Fraction of a fixed step left over after this tick's steps; `0` in
    /// display mode.
    pub alpha: f32,
    pub rendered: bool,
    pub camera_moved: bool,
}

pub struct AppContext<R> {
    config: SceneConfig,
    scene: Scene,
    arm: ArmHandles,
    camera: Camera,
    controls: OrbitController,
    renderer: R,
    frame: RenderScene,
    timestep: TimestepMode,
    stepper: FixedStepper,
    viewport: (u32, u32),
    frames: u64,
    running: bool,
}

impl<R: SceneRenderer> AppContext<R> {
    /// Builds the scene described by `config` and aims the camera.
    ///
    /// # Errors
    ///
    /// Invalid configuration or a scene the physics layer rejects.
    pub fn new(config: SceneConfig, mut renderer: R) -> Result<Self> {
        config.validate()?;
        let (scene, arm) = build_scene(&config)?;

        let [width, height] = config.viewport;
        let cam = &config.camera;
        let mut camera = Camera::perspective(
            cam.fov,
            width as f32 / height as f32,
            cam.near,
            cam.far,
        );
        camera.position = Vec3::from_array(cam.position);
        let mut controls = OrbitController::new(Vec3::from_array(cam.target));
        controls.set_viewport(width, height);
        controls.update(&mut camera);
        renderer.resize(width, height);

        let timestep = config.timestep.to_mode();
        info!(?timestep, width, height, "application initialised");
        Ok(Self {
            frame: frame_for(&config),
            stepper: stepper_for(timestep),
            config,
            scene,
            arm,
            camera,
            controls,
            renderer,
            timestep,
            viewport: (width, height),
            frames: 0,
            running: true,
        })
    }

    /// Overrides the configured timestep mode.
    pub fn set_timestep(&mut self, timestep: TimestepMode) {
        self.timestep = timestep;
        self.stepper = stepper_for(timestep);
        debug!(?timestep, "timestep mode changed");
    }

    /// Advances physics by `frame_dt` seconds of wall time, renders and
    /// updates the camera controller.
    pub fn tick(&mut self, frame_dt: f32) -> TickReport {
        let mut report = TickReport::default();

        let (steps, delta) = match self.timestep {
            TimestepMode::Display => (1, None),
            TimestepMode::Fixed { .. } => {
                (self.stepper.advance(frame_dt), Some(self.stepper.step()))
            }
        };
        if let TimestepMode::Fixed { .. } = self.timestep {
            report.alpha = self.stepper.alpha();
        }
        for _ in 0..steps {
            match self.scene.simulate(delta) {
                Ok(_) => report.steps += 1,
                Err(err @ StepError::Diverged { .. }) => {
                    // Remaining substeps would start from the same state.
                    warn!(frame = self.frames, "{err}");
                    report.failed_steps += 1;
                    break;
                }
                Err(err) => {
                    error!(frame = self.frames, "{err}");
                    report.failed_steps += 1;
                    break;
                }
            }
        }

        self.frame.update(&self.scene.snapshot());
        match self.renderer.render(&self.frame, &self.camera) {
            Ok(()) => report.rendered = true,
            Err(RenderError::SurfaceLost) => {
                warn!("render surface lost, reconfiguring");
                let (width, height) = self.viewport;
                self.renderer.resize(width, height);
            }
            Err(RenderError::OutOfMemory) => {
                error!("renderer out of memory, stopping");
                self.running = false;
            }
            Err(err) => warn!("{err}"),
        }

        report.camera_moved = self.controls.update(&mut self.camera);
        self.frames += 1;
        if self.frames % 60 == 0 {
            debug!(
                frame = self.frames,
                sim_time = self.scene.elapsed(),
                alpha = report.alpha,
                base_yaw = self.scene.joint_angles(self.arm.turntable).map(|a| a.y),
                "frame"
            );
        }
        report
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::PointerDown { button, x, y } => self.controls.pointer_down(button, x, y),
            InputEvent::PointerMove { x, y } => self.controls.pointer_move(&self.camera, x, y),
            InputEvent::PointerUp => self.controls.pointer_up(),
            InputEvent::Wheel { delta_y } => self.controls.wheel(delta_y),
            InputEvent::Resize { width, height } => {
                if width == 0 || height == 0 {
                    debug!(width, height, "ignoring zero-sized resize");
                    return;
                }
                self.viewport = (width, height);
                self.camera.resize(width, height);
                self.controls.set_viewport(width, height);
                self.renderer.resize(width, height);
            }
        }
    }

    fn handle_key(&mut self, key: char) {
        let Some(command) = MotorCommand::from_key(key) else {
            debug!(%key, "unbound key");
            return;
        };
        match command.apply(&mut self.scene, self.arm.turntable, &self.config.motor) {
            Ok(()) => info!(%key, ?command, "base motor updated"),
            Err(err) => warn!(%key, "base motor command rejected: {err}"),
        }
    }

    /// Rebuilds the scene from `config`. The camera and controller keep their
    /// state; on error the running scene is left untouched.
    ///
    /// # Errors
    ///
    /// Invalid configuration or a scene the physics layer rejects.
    pub fn reload(&mut self, config: SceneConfig) -> Result<()> {
        config.validate()?;
        let (scene, arm) = build_scene(&config).context("reload failed, keeping current scene")?;
        self.scene = scene;
        self.arm = arm;
        self.timestep = config.timestep.to_mode();
        self.stepper = stepper_for(self.timestep);
        self.frame = frame_for(&config);
        self.config = config;
        info!(bodies = self.scene.len(), "scene reloaded");
        Ok(())
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn arm(&self) -> &ArmHandles {
        &self.arm
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// For manual camera moves; the next tick re-syncs the controller.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[must_use]
    pub fn controls(&self) -> &OrbitController {
        &self.controls
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[must_use]
    pub fn timestep(&self) -> TimestepMode {
        self.timestep
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reloads from `watcher`'s file if it changed since the last call.
    /// Parse and build failures are logged; the current scene stays.
    pub fn poll_reload(&mut self, watcher: &ConfigWatcher) {
        if !watcher.changed() {
            return;
        }
        match crate::config::load(watcher.path()).and_then(|config| self.reload(config)) {
            Ok(()) => {}
            Err(err) => error!("config reload failed: {err:#}"),
        }
    }
}

fn stepper_for(timestep: TimestepMode) -> FixedStepper {
    match timestep {
        TimestepMode::Fixed { step, max_substeps } => FixedStepper::new(step, max_substeps),
        TimestepMode::Display => FixedStepper::new(physics::DEFAULT_STEP, 1),
    }
}

fn frame_for(config: &SceneConfig) -> RenderScene {
    let mut frame = RenderScene::new(config.clear_color);
    frame.add_light(PointLight {
        color: config.light.color,
        intensity: config.light.intensity,
        distance: config.light.distance,
        position: Vec3::from_array(config.light.position),
    });
    frame
}

/// Totals of a headless run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub steps: usize,
    pub failed_steps: usize,
}

/// Drives `frames` ticks of [`HEADLESS_FRAME`] seconds each, as fast as
/// possible. Checks `watcher` for config changes between ticks.
pub fn run_headless<R: SceneRenderer>(
    ctx: &mut AppContext<R>,
    frames: u64,
    watcher: Option<&ConfigWatcher>,
) -> RunSummary {
    info!(frames, "starting headless run");
    let mut summary = RunSummary::default();
    for _ in 0..frames {
        if let Some(watcher) = watcher {
            ctx.poll_reload(watcher);
        }
        let report = ctx.tick(HEADLESS_FRAME);
        summary.frames += 1;
        summary.steps += report.steps;
        summary.failed_steps += report.failed_steps;
        if !ctx.is_running() {
            break;
        }
    }
    info!(
        frames = summary.frames,
        steps = summary.steps,
        failed = summary.failed_steps,
        sim_time = ctx.scene().elapsed(),
        "headless run finished"
    );
    summary
}
