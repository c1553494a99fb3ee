//! Driver seam consumed by [`ShaderProgram`](crate::ShaderProgram).
//!
//! The trait lists exactly the OpenGL entry points the program wrapper needs.
//! `glow::Context` implements it for real rendering; the unit tests swap in
//! an in-memory fake so compile/link/uniform behaviour can be checked without
//! a GPU.

use std::fmt;
use std::num::NonZeroU32;

use glow::HasContext;

#[cfg(test)]
pub(crate) mod fake;

/// One independently compiled unit of shading-language source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Tag attached to diagnostics emitted for this stage.
    pub fn tag(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        }
    }

    /// Matching `GL_*_SHADER` enum.
    pub fn gl_kind(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Shader and program operations the driver must provide.
///
/// All methods must be called on the thread that owns the current GL context.
pub trait ShaderBackend {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it.
    fn compile_shader(&self, shader: Self::Shader, source: &str);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Uploads an integer to `location` of `program`. The active program is
    /// the same before and after the call.
    fn set_uniform_i32(&self, program: Self::Program, location: &Self::UniformLocation, value: i32);
    /// Uploads a float to `location` of `program`. The active program is the
    /// same before and after the call.
    fn set_uniform_f32(&self, program: Self::Program, location: &Self::UniformLocation, value: f32);
}

// Every call below requires the context to be current on this thread, which
// the window bootstrap guarantees for the lifetime of the event loop.
impl ShaderBackend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_kind()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn set_uniform_i32(&self, program: Self::Program, location: &Self::UniformLocation, value: i32) {
        with_program_bound(self, program, || unsafe {
            self.uniform_1_i32(Some(location), value);
        });
    }

    fn set_uniform_f32(&self, program: Self::Program, location: &Self::UniformLocation, value: f32) {
        with_program_bound(self, program, || unsafe {
            self.uniform_1_f32(Some(location), value);
        });
    }
}

/// Runs `upload` with `program` bound, then rebinds whatever was active.
///
/// glow 0.13 exposes no `glProgramUniform*` wrappers, so the binding is
/// saved and restored around a plain `glUniform*` call instead.
fn with_program_bound(gl: &glow::Context, program: glow::Program, upload: impl FnOnce()) {
    unsafe {
        let current = gl.get_parameter_i32(glow::CURRENT_PROGRAM);
        let previous = NonZeroU32::new(current as u32).map(glow::NativeProgram);
        if previous == Some(program) {
            upload();
            return;
        }
        HasContext::use_program(gl, Some(program));
        upload();
        HasContext::use_program(gl, previous);
    }
}
