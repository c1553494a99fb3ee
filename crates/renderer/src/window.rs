use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glow::HasContext;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::program::ShaderProgram;
use crate::quad::Quad;
use crate::texture::Texture;
use crate::types::RendererConfig;

/// Everything needed to present a frame in the preview window.
///
/// Field order is drop order: GL objects go first, while the context that
/// owns them is still current, then the context, surface and window.
pub(crate) struct WindowState {
    program: ShaderProgram<glow::Context>,
    quad: Quad,
    texture: Option<Texture>,
    gl: Arc<glow::Context>,
    clear_color: [f32; 4],
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    window: Window,
}

impl WindowState {
    /// Opens the window, makes a core-profile context current on this thread
    /// and uploads the shader program, quad and texture.
    pub(crate) fn new(event_loop: &EventLoop<()>, config: &RendererConfig) -> Result<Self> {
        let (width, height) = config.window_size;
        let window_builder = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(width, height));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(event_loop, template, pick_config)
            .map_err(|err| anyhow!("failed to create window: {err}"))?;
        let window = window.ok_or_else(|| anyhow!("display builder returned no window"))?;

        let gl_display = gl_config.display();
        let (major, minor) = config.gl_version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .with_context(|| format!("failed to create OpenGL {major}.{minor} core context"))?;

        let surface_attributes = window.build_surface_attributes(Default::default());
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("failed to create window surface")?;
        let context = not_current
            .make_current(&surface)
            .context("failed to make OpenGL context current")?;

        if config.vsync {
            if let Err(err) =
                surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                warn!(%err, "failed to enable vsync");
            }
        }

        let gl = Arc::new(unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        });
        let version = gl.version();
        info!(
            major = version.major,
            minor = version.minor,
            vendor = %version.vendor_info,
            "OpenGL context ready"
        );

        let program = ShaderProgram::from_files(
            Arc::clone(&gl),
            &config.vertex_shader,
            &config.fragment_shader,
        )
        .context("failed to build shader program")?;
        let quad = Quad::new(Arc::clone(&gl))?;
        let texture = match Texture::from_path(Arc::clone(&gl), &config.texture) {
            Ok(texture) => Some(texture),
            Err(err) => {
                warn!("{err:#}");
                None
            }
        };

        let state = Self {
            program,
            quad,
            texture,
            gl,
            clear_color: config.clear_color,
            context,
            surface,
            window,
        };
        state.set_viewport(state.window.inner_size());
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the surface and viewport. Zero-sized (minimised) windows are
    /// ignored.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) =
            (NonZeroU32::new(new_size.width), NonZeroU32::new(new_size.height))
        else {
            return;
        };
        self.surface.resize(&self.context, width, height);
        self.set_viewport(new_size);
        debug!(width = new_size.width, height = new_size.height, "resized surface");
    }

    /// Clears, draws the textured quad and presents.
    pub(crate) fn render_frame(&mut self) -> Result<()> {
        let [red, green, blue, alpha] = self.clear_color;
        unsafe {
            self.gl.clear_color(red, green, blue, alpha);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }

        if let Some(texture) = &self.texture {
            texture.bind();
        }
        self.program.use_program();
        self.quad.draw();

        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }

    fn set_viewport(&self, size: PhysicalSize<u32>) {
        let width = i32::try_from(size.width).unwrap_or(i32::MAX);
        let height = i32::try_from(size.height).unwrap_or(i32::MAX);
        unsafe {
            self.gl.viewport(0, 0, width, height);
        }
    }
}

/// Prefers the config with the most MSAA samples, like glutin's own example.
///
/// glutin-winit's picker must return a `Config` and has no error path. Both
/// the EGL and GLX backends report `BadConfig` from `find_configs` before the
/// picker runs when the driver matches nothing, but EGL can still filter the
/// matches down to none for an incompatible X11 visual. That case cannot be
/// recovered from and aborts with a message naming the cause.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    most_samples(configs, |config| config.num_samples())
        .expect("no OpenGL config is compatible with the window")
}

/// Returns the item with the highest sample count, keeping the earliest on ties.
fn most_samples<T>(items: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    items.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}
