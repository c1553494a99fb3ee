use std::mem::{offset_of, size_of};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use glow::HasContext;

/// Interleaved vertex: position, color, texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coord: [f32; 2],
}

pub(crate) const VERTEX_STRIDE: i32 = size_of::<Vertex>() as i32;

/// `(location, component count, byte offset)` for each vertex attribute.
pub(crate) const ATTRIBUTES: [(u32, i32, i32); 3] = [
    (0, 3, offset_of!(Vertex, position) as i32),
    (1, 3, offset_of!(Vertex, color) as i32),
    (2, 2, offset_of!(Vertex, tex_coord) as i32),
];

pub(crate) const QUAD_VERTICES: [Vertex; 4] = [
    // top right
    Vertex {
        position: [0.5, 0.5, 0.0],
        color: [1.0, 0.0, 0.0],
        tex_coord: [1.0, 1.0],
    },
    // bottom right
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
        tex_coord: [1.0, 0.0],
    },
    // bottom left
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
    // top left
    Vertex {
        position: [-0.5, 0.5, 0.0],
        color: [1.0, 1.0, 0.0],
        tex_coord: [0.0, 1.0],
    },
];

pub(crate) const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Vertex array plus its vertex and element buffers for the textured quad.
pub(crate) struct Quad {
    gl: Arc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
}

impl Quad {
    /// Uploads the quad and records its attribute layout in a fresh VAO.
    pub fn new(gl: Arc<glow::Context>) -> Result<Self> {
        unsafe {
            let vao = or_release(gl.create_vertex_array(), "vertex array", || {})?;
            let vbo = or_release(gl.create_buffer(), "vertex buffer", || {
                gl.delete_vertex_array(vao);
            })?;
            let ebo = or_release(gl.create_buffer(), "element buffer", || {
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
            })?;

            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW,
            );

            for (location, components, offset) in ATTRIBUTES {
                gl.vertex_attrib_pointer_f32(
                    location,
                    components,
                    glow::FLOAT,
                    false,
                    VERTEX_STRIDE,
                    offset,
                );
                gl.enable_vertex_attrib_array(location);
            }

            gl.bind_vertex_array(None);

            Ok(Self { gl, vao, vbo, ebo })
        }
    }

    /// Draws both triangles with whatever program is currently in use.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_elements(
                glow::TRIANGLES,
                QUAD_INDICES.len() as i32,
                glow::UNSIGNED_INT,
                0,
            );
        }
    }
}

/// Runs `release` for the objects created so far when `created` failed.
fn or_release<T>(created: Result<T, String>, what: &str, release: impl FnOnce()) -> Result<T> {
    created.map_err(|err| {
        release();
        anyhow!("failed to create {what}: {err}")
    })
}

impl Drop for Quad {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ebo);
        }
    }
}
