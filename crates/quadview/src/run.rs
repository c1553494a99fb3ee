use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    let config = renderer_config(cli);
    tracing::debug!(?config, "resolved renderer configuration");
    tracing::info!(
        width = config.window_size.0,
        height = config.window_size.1,
        gl = %format!("{}.{}", config.gl_version.0, config.gl_version.1),
        "opening quadview window"
    );

    let mut renderer = Renderer::new(config);
    renderer.run().context("renderer exited with an error")
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn renderer_config(cli: Cli) -> RendererConfig {
    RendererConfig {
        window_size: cli.size,
        title: cli.title,
        gl_version: cli.gl_version,
        vertex_shader: cli.vertex,
        fragment_shader: cli.fragment,
        texture: cli.texture,
        vsync: !cli.no_vsync,
        ..RendererConfig::default()
    }
}
