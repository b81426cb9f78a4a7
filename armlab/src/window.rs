//! Windowed front-end.
//!
//! A `winit` window delivers input and pacing: every `RedrawRequested` runs one
//! [`AppContext::tick`] with the wall time since the previous one, and the
//! next redraw is requested as soon as the loop goes idle, so ticks follow the
//! display's refresh. Frames are drawn into the window by [`WgpuRenderer`].

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use physics::TimestepMode;
use render::{PointerButton, WgpuRenderer};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::Key;
use winit::window::WindowBuilder;

use crate::app::AppContext;
use crate::config::SceneConfig;
use crate::input::InputEvent;
use crate::watcher::ConfigWatcher;

/// Pixels per wheel line, to match pixel-based scrolling.
const LINE_HEIGHT: f32 = 100.0;

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Opens the window, builds the scene from `config` and runs until the
/// window is closed. `timestep` overrides the config's mode.
///
/// # Errors
///
/// If the event loop, window or GPU renderer cannot be created, or the
/// scene cannot be built.
pub fn run(
    config: SceneConfig,
    timestep: Option<TimestepMode>,
    watcher: Option<ConfigWatcher>,
) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let [width, height] = config.viewport;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Arm Lab")
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let renderer = WgpuRenderer::new(window.clone()).context("failed to start the GPU renderer")?;
    let mut ctx = AppContext::new(config, renderer).context("failed to build the arm scene")?;
    if let Some(timestep) = timestep {
        ctx.set_timestep(timestep);
    }

    let size = window.inner_size();
    ctx.handle_input(&InputEvent::Resize {
        width: size.width,
        height: size.height,
    });
    info!(width = size.width, height = size.height, "window opened");

    let mut last_frame = Instant::now();
    let mut cursor = (0.0_f32, 0.0_f32);

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => ctx.handle_input(&InputEvent::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(text),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                for key in text.chars() {
                    ctx.handle_input(&InputEvent::Key(key));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = (position.x as f32, position.y as f32);
                ctx.handle_input(&InputEvent::PointerMove {
                    x: cursor.0,
                    y: cursor.1,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => match (state, pointer_button(button)) {
                (ElementState::Pressed, Some(button)) => ctx.handle_input(&InputEvent::PointerDown {
                    button,
                    x: cursor.0,
                    y: cursor.1,
                }),
                (ElementState::Released, Some(_)) => ctx.handle_input(&InputEvent::PointerUp),
                (_, None) => debug!(?button, "unbound mouse button"),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
                };
                ctx.handle_input(&InputEvent::Wheel { delta_y });
            }
            WindowEvent::RedrawRequested => {
                if let Some(watcher) = &watcher {
                    ctx.poll_reload(watcher);
                }
                let now = Instant::now();
                let frame_dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;
                ctx.tick(frame_dt);
                if !ctx.is_running() {
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => window.request_redraw(),
        _ => {}
    })?;
    Ok(())
}
