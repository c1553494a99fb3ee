use std::path::PathBuf;

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the CLI flags: which shader pair and texture to
/// load, how large the window is, and which OpenGL context to request.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub window_size: (u32, u32),
    /// Window title.
    pub title: String,
    /// Requested OpenGL core profile version as `(major, minor)`.
    pub gl_version: (u8, u8),
    /// Vertex stage source file.
    pub vertex_shader: PathBuf,
    /// Fragment stage source file.
    pub fragment_shader: PathBuf,
    /// Image sampled by the quad. A missing or unreadable image only warns.
    pub texture: PathBuf,
    /// RGBA color the framebuffer is cleared to each frame.
    pub clear_color: [f32; 4],
    /// Wait for vblank between frames.
    pub vsync: bool,
}

impl Default for RendererConfig {
    /// A 1600x600 window on a 4.4 core context drawing `container.jpg`.
    fn default() -> Self {
        Self {
            window_size: (1600, 600),
            title: "openglt window".to_string(),
            gl_version: (4, 4),
            vertex_shader: PathBuf::from("shaders/vs.vert"),
            fragment_shader: PathBuf::from("shaders/fs.frag"),
            texture: PathBuf::from("container.jpg"),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            vsync: true,
        }
    }
}
