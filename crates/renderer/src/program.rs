//! Vertex + fragment shader program loaded from disk.
//!
//! ```text
//!   vs.vert ──read──▶ compile (VERTEX)   ─┐
//!                                          ├─▶ link (PROGRAM) ─▶ ShaderProgram
//!   fs.frag ──read──▶ compile (FRAGMENT) ─┘
//! ```
//!
//! Every failure is logged with its stage tag and returned as a
//! [`ShaderError`]. Stage objects never outlive construction, and the program
//! object is deleted when the [`ShaderProgram`] is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::backend::{ShaderBackend, ShaderStage};

/// Upper bound on the driver diagnostic text kept per stage or link step.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// Tag used for link diagnostics.
pub const PROGRAM_TAG: &str = "PROGRAM";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader source at {}", .path.display())]
    SourceUnreadable {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("driver refused to create {what}: {message}")]
    Driver { what: &'static str, message: String },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("PROGRAM failed to link:\n{log}")]
    Link { log: String },
}

impl ShaderError {
    /// Diagnostic tag of the step that failed (`VERTEX`, `FRAGMENT` or `PROGRAM`).
    pub fn tag(&self) -> &'static str {
        match self {
            ShaderError::SourceUnreadable { stage, .. } | ShaderError::Compile { stage, .. } => {
                stage.tag()
            }
            ShaderError::Driver { .. } | ShaderError::Link { .. } => PROGRAM_TAG,
        }
    }
}

/// A linked, ready-to-use shader program.
///
/// Holding a `ShaderProgram` means linking succeeded; there is no
/// half-built state. Uniform names are resolved against the driver on every
/// setter call and unknown names are ignored.
pub struct ShaderProgram<B: ShaderBackend> {
    backend: Arc<B>,
    handle: B::Program,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    /// Reads both stage sources from disk, then compiles and links them.
    pub fn from_files(
        backend: Arc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex = read_source(ShaderStage::Vertex, vertex_path.as_ref())?;
        let fragment = read_source(ShaderStage::Fragment, fragment_path.as_ref())?;
        Self::from_sources(backend, &vertex, &fragment)
    }

    /// Compiles both stages and links them into a program.
    pub fn from_sources(
        backend: Arc<B>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let mut vertex = CompiledStage::new(&*backend, ShaderStage::Vertex, vertex_source)?;
        let mut fragment = CompiledStage::new(&*backend, ShaderStage::Fragment, fragment_source)?;

        // Both stages are compiled (and logged) before giving up so a broken
        // pair reports every problem in one run.
        if let Some(err) = vertex.failure.take().or_else(|| fragment.failure.take()) {
            return Err(err);
        }

        let handle = backend
            .create_program()
            .map_err(|message| driver_error("program object", message))?;
        let program = Self {
            backend: Arc::clone(&backend),
            handle,
        };

        program.backend.attach_shader(handle, vertex.shader);
        program.backend.attach_shader(handle, fragment.shader);
        program.backend.link_program(handle);

        if !program.backend.program_link_status(handle) {
            let log = bounded_log(program.backend.program_info_log(handle));
            error!(stage = PROGRAM_TAG, "{log}");
            return Err(ShaderError::Link { log });
        }

        debug!(program = ?handle, "linked shader program");
        Ok(program)
    }

    /// Driver handle of the linked program.
    pub fn handle(&self) -> B::Program {
        self.handle
    }

    /// Makes this program the active one for subsequent draw calls.
    pub fn use_program(&self) {
        self.backend.use_program(Some(self.handle));
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_int(name, i32::from(value));
    }

    pub fn set_int(&self, name: &str, value: i32) {
        if let Some(location) = self.backend.uniform_location(self.handle, name) {
            self.backend.set_uniform_i32(self.handle, &location, value);
        }
    }

    pub fn set_float(&self, name: &str, value: f32) {
        if let Some(location) = self.backend.uniform_location(self.handle, name) {
            self.backend.set_uniform_f32(self.handle, &location, value);
        }
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.backend.delete_program(self.handle);
    }
}

impl<B: ShaderBackend> std::fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Stage object that is deleted once construction is done with it.
struct CompiledStage<'a, B: ShaderBackend> {
    backend: &'a B,
    shader: B::Shader,
    failure: Option<ShaderError>,
}

impl<'a, B: ShaderBackend> CompiledStage<'a, B> {
    fn new(backend: &'a B, stage: ShaderStage, source: &str) -> Result<Self, ShaderError> {
        let shader = backend
            .create_shader(stage)
            .map_err(|message| driver_error(stage_object(stage), message))?;
        backend.compile_shader(shader, source);

        let failure = if backend.shader_compile_status(shader) {
            None
        } else {
            let log = bounded_log(backend.shader_info_log(shader));
            error!(stage = stage.tag(), "{log}");
            Some(ShaderError::Compile { stage, log })
        };

        Ok(Self {
            backend,
            shader,
            failure,
        })
    }
}

impl<B: ShaderBackend> Drop for CompiledStage<'_, B> {
    fn drop(&mut self) {
        self.backend.delete_shader(self.shader);
    }
}

fn read_source(stage: ShaderStage, path: &Path) -> Result<String, ShaderError> {
    fs::read_to_string(path).map_err(|source| {
        error!(stage = stage.tag(), path = %path.display(), %source, "failed to read shader source");
        ShaderError::SourceUnreadable {
            stage,
            path: path.to_path_buf(),
            source,
        }
    })
}

fn stage_object(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex shader object",
        ShaderStage::Fragment => "fragment shader object",
    }
}

fn driver_error(what: &'static str, message: String) -> ShaderError {
    error!(what, %message, "driver object creation failed");
    ShaderError::Driver { what, message }
}

/// Trims driver padding and caps the log at [`INFO_LOG_CAPACITY`] bytes on a
/// char boundary.
fn bounded_log(mut log: String) -> String {
    if log.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    let trimmed = log.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    trimmed.to_owned()
}
