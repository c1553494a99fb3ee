use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glow::HasContext;

/// Decoded RGB8 pixels ready for upload.
#[derive(Debug)]
pub(crate) struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Decodes any format the `image` crate was built with into tightly
    /// packed RGB8 rows.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load texture at {}", path.display()))?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgb.into_raw(),
        })
    }
}

/// 2D texture with repeat wrapping, linear filtering and a full mip chain.
pub(crate) struct Texture {
    gl: Arc<glow::Context>,
    texture: glow::Texture,
}

impl Texture {
    pub fn from_path(gl: Arc<glow::Context>, path: &Path) -> Result<Self> {
        let image = TextureImage::open(path)?;
        Self::upload(gl, &image)
    }

    pub fn upload(gl: Arc<glow::Context>, image: &TextureImage) -> Result<Self> {
        let width = i32::try_from(image.width).context("texture width out of range")?;
        let height = i32::try_from(image.height).context("texture height out of range")?;

        unsafe {
            let texture = gl
                .create_texture()
                .map_err(|err| anyhow!("failed to create texture: {err}"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            // RGB rows are not 4-byte aligned for odd widths.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB as i32,
                width,
                height,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                Some(&image.pixels),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);

            Ok(Self { gl, texture })
        }
    }

    pub fn bind(&self) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.texture);
        }
    }
}
