use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "quadview",
    author,
    version,
    about = "Draw a textured quad with a vertex/fragment shader pair"
)]
pub struct Cli {
    /// Vertex shader source file.
    #[arg(
        long,
        value_name = "PATH",
        env = "QUADVIEW_VERTEX",
        default_value = "shaders/vs.vert"
    )]
    pub vertex: PathBuf,

    /// Fragment shader source file.
    #[arg(
        long,
        value_name = "PATH",
        env = "QUADVIEW_FRAGMENT",
        default_value = "shaders/fs.frag"
    )]
    pub fragment: PathBuf,

    /// Image applied to the quad; a missing file only logs a warning.
    #[arg(
        long,
        value_name = "PATH",
        env = "QUADVIEW_TEXTURE",
        default_value = "container.jpg"
    )]
    pub texture: PathBuf,

    /// Window size in physical pixels (e.g. `1600x600`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "1600x600"
    )]
    pub size: (u32, u32),

    /// Window title.
    #[arg(long, default_value = "openglt window")]
    pub title: String,

    /// OpenGL core profile version to request (e.g. `3.3`).
    #[arg(
        long,
        value_name = "MAJOR.MINOR",
        value_parser = parse_gl_version,
        default_value = "4.4"
    )]
    pub gl_version: (u8, u8),

    /// Present frames as fast as possible instead of waiting for vblank.
    #[arg(long)]
    pub no_vsync: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("size must not be empty".to_string());
    }

    let (w, h) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_gl_version(value: &str) -> Result<(u8, u8), String> {
    let trimmed = value.trim();
    let (major, minor) = trimmed
        .split_once('.')
        .ok_or_else(|| format!("invalid GL version '{trimmed}'; expected MAJOR.MINOR"))?;
    let major = major
        .parse::<u8>()
        .map_err(|_| format!("invalid GL major version '{major}'"))?;
    let minor = minor
        .parse::<u8>()
        .map_err(|_| format!("invalid GL minor version '{minor}'"))?;

    // Core profiles only exist from 3.2 onward.
    if (major, minor) < (3, 2) {
        return Err(format!(
            "OpenGL {major}.{minor} has no core profile; request 3.2 or newer"
        ));
    }
    Ok((major, minor))
}
