//! In-memory stand-in for the GL driver used by unit tests.
//!
//! The fake understands just enough GLSL to behave like a real driver for the
//! cases the tests care about: `#error` directives fail compilation,
//! fragment inputs without a matching vertex output fail linking, and
//! `uniform <type> <name>;` declarations become per-program locations with
//! GL's type rules on upload. Uploads never change the active program, and
//! object creation can be made to fail on demand.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use super::{ShaderBackend, ShaderStage};

pub(crate) const INVALID_OPERATION: u32 = 0x0502;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UniformValue {
    Int(i32),
    Float(f32),
}

#[derive(Debug)]
struct FakeShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<(String, String)>,
    values: HashMap<usize, UniformValue>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: BTreeMap<u32, FakeShader>,
    programs: BTreeMap<u32, FakeProgram>,
    current: Option<u32>,
    errors: Vec<u32>,
    shaders_created: usize,
    refused_stage: Option<ShaderStage>,
    refuse_programs: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FakeGl {
    state: RefCell<State>,
}

impl FakeGl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every later `create_shader` for `stage` fail.
    pub(crate) fn refuse_shader_creation(&self, stage: ShaderStage) {
        self.state.borrow_mut().refused_stage = Some(stage);
    }

    /// Makes every later `create_program` fail.
    pub(crate) fn refuse_program_creation(&self) {
        self.state.borrow_mut().refuse_programs = true;
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub(crate) fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    pub(crate) fn current_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    pub(crate) fn take_errors(&self) -> Vec<u32> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    pub(crate) fn uniform_value(&self, program: u32, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let index = program.uniforms.iter().position(|(n, _)| n == name)?;
        program.values.get(&index).copied()
    }

    fn upload(&self, program: u32, location: usize, value: UniformValue) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(target) = state.programs.get_mut(&program) else {
            state.errors.push(INVALID_OPERATION);
            return;
        };
        let Some((_, ty)) = target.uniforms.get(location) else {
            state.errors.push(INVALID_OPERATION);
            return;
        };
        let accepted = match (ty.as_str(), value) {
            ("bool", _) => true,
            ("float", UniformValue::Float(_)) => true,
            ("int" | "uint" | "sampler2D", UniformValue::Int(_)) => true,
            _ => false,
        };
        if accepted {
            target.values.insert(location, value);
        } else {
            state.errors.push(INVALID_OPERATION);
        }
    }
}

impl ShaderBackend for FakeGl {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = usize;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.refused_stage == Some(stage) {
            return Err(format!("out of memory creating {stage} shader"));
        }
        state.next_id += 1;
        state.shaders_created += 1;
        let id = state.next_id;
        state.shaders.insert(
            id,
            FakeShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn compile_shader(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.shaders.get_mut(&shader) {
            entry.source = source.to_owned();
            match compile_error(source) {
                Some(log) => {
                    entry.compiled = false;
                    entry.log = log;
                }
                None => {
                    entry.compiled = true;
                    entry.log.clear();
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|entry| entry.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return Err("out of memory creating program".to_owned());
        }
        state.next_id += 1;
        let id = state.next_id;
        state.programs.insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program) {
            entry.attached.push(shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let attached = match state.programs.get(&program) {
            Some(entry) => entry.attached.clone(),
            None => return,
        };
        let stages: Vec<&FakeShader> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect();
        let result = link_stages(&stages);
        let entry = state
            .programs
            .get_mut(&program)
            .expect("program looked up above");
        match result {
            Ok(uniforms) => {
                entry.linked = true;
                entry.log.clear();
                entry.uniforms = uniforms;
                entry.values.clear();
            }
            Err(log) => {
                entry.linked = false;
                entry.log = log;
            }
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|entry| entry.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().current = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<usize> {
        let state = self.state.borrow();
        let entry = state.programs.get(&program)?;
        if !entry.linked {
            return None;
        }
        entry.uniforms.iter().position(|(n, _)| n == name)
    }

    fn set_uniform_i32(&self, program: u32, location: &usize, value: i32) {
        self.upload(program, *location, UniformValue::Int(value));
    }

    fn set_uniform_f32(&self, program: u32, location: &usize, value: f32) {
        self.upload(program, *location, UniformValue::Float(value));
    }
}

fn compile_error(source: &str) -> Option<String> {
    if source.trim().is_empty() {
        return Some("0:1(1): error: syntax error, unexpected end of file".to_owned());
    }
    for (index, line) in source.lines().enumerate() {
        if let Some(message) = line.trim_start().strip_prefix("#error") {
            return Some(format!("0:{}(1): error: {}", index + 1, message.trim()));
        }
    }
    if !source.contains("void main") {
        return Some("0:1(1): error: no function with name 'main'".to_owned());
    }
    None
}

fn link_stages(stages: &[&FakeShader]) -> Result<Vec<(String, String)>, String> {
    let vertex = stages.iter().find(|s| s.stage == ShaderStage::Vertex);
    let fragment = stages.iter().find(|s| s.stage == ShaderStage::Fragment);
    let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
        return Err("error: program lacks a vertex or fragment shader".to_owned());
    };
    if !vertex.compiled || !fragment.compiled {
        return Err("error: linking with uncompiled shader".to_owned());
    }

    let outputs = declarations(&vertex.source, "out");
    for (_, name) in declarations(&fragment.source, "in") {
        if !outputs.iter().any(|(_, out)| *out == name) {
            return Err(format!(
                "error: fragment shader input `{name}' has no matching output in the previous stage"
            ));
        }
    }

    let mut uniforms: Vec<(String, String)> = Vec::new();
    for stage in [vertex, fragment] {
        for (ty, name) in declarations(&stage.source, "uniform") {
            if !uniforms.iter().any(|(existing, _)| *existing == name) {
                uniforms.push((name, ty));
            }
        }
    }
    Ok(uniforms)
}

/// Collects `(type, name)` pairs for `<qualifier> <type> <name>;` lines,
/// ignoring any leading `layout(...)`.
fn declarations(source: &str, qualifier: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|line| {
            let mut line = line.trim();
            if line.starts_with("layout") {
                line = line.split_once(')')?.1.trim_start();
            }
            let mut words = line.split_whitespace();
            if words.next()? != qualifier {
                return None;
            }
            let ty = words.next()?;
            let name = words.next()?.trim_end_matches(';');
            Some((ty.to_owned(), name.to_owned()))
        })
        .collect()
}
