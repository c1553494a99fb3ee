//! OpenGL renderer for quadview.
//!
//! The crate opens a window, compiles a vertex/fragment shader pair read from
//! disk, uploads a single textured quad, and draws it until the window is
//! closed or Escape is pressed. The overall flow is:
//!
//! ```text
//!   CLI / quadview
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                          │                                     │
//!                          ├─▶ ShaderProgram (vs + fs)  ◀── use ─┤
//!                          ├─▶ Quad (VAO/VBO/EBO)       ◀── draw ┤
//!                          └─▶ Texture                  ◀── bind ┘
//! ```
//!
//! [`ShaderProgram`] is the reusable piece. It talks to the driver through
//! the [`ShaderBackend`] trait, implemented here for `glow::Context`.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};

mod backend;
mod program;
mod quad;
mod texture;
mod types;
mod window;

pub use backend::{ShaderBackend, ShaderStage};
pub use program::{ShaderError, ShaderProgram, INFO_LOG_CAPACITY, PROGRAM_TAG};
pub use types::RendererConfig;

use window::WindowState;

/// High-level entry point that owns the renderer configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and drives the `winit` event loop until exit.
    ///
    /// Setup failures (no display, unsupported GL version, shader errors) are
    /// returned before the first frame. A failure while presenting ends the
    /// loop and is returned once the window has closed.
    pub fn run(&mut self) -> Result<()> {
        let event_loop = EventLoopBuilder::new()
            .build()
            .context("failed to initialize event loop")?;
        let mut state = WindowState::new(&event_loop, &self.config)?;
        state.window().request_redraw();
        info!(
            vertex = %self.config.vertex_shader.display(),
            fragment = %self.config.fragment_shader.display(),
            "entering render loop"
        );

        let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::new(RefCell::new(None));
        let loop_failure = Rc::clone(&failure);

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);

                match event {
                    Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::KeyboardInput {
                                event:
                                    KeyEvent {
                                        logical_key: Key::Named(NamedKey::Escape),
                                        state: ElementState::Pressed,
                                        ..
                                    },
                                ..
                            } => {
                                info!("escape pressed; closing window");
                                elwt.exit();
                            }
                            WindowEvent::Resized(new_size) => {
                                state.resize(new_size);
                            }
                            WindowEvent::RedrawRequested => {
                                if let Err(err) = state.render_frame() {
                                    error!("{err:#}");
                                    let mut first = loop_failure.borrow_mut();
                                    if first.is_none() {
                                        *first = Some(err);
                                    }
                                    elwt.exit();
                                }
                            }
                            _ => {}
                        }
                    }
                    Event::AboutToWait => {
                        state.window().request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))?;

        let failure = failure.borrow_mut().take();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
