/// 2D textures sampled by commands.
///
/// A texture is allocated from its descriptor pixels, or from a zeroed image
/// of `width * height * channels` elements of the declared pixel type. Sampler
/// parameters (nearest filtering by default) are applied before the upload.
/// Each texture keeps the unit it was first bound on, and commands point their
/// sampler uniforms at that unit.

use crate::error::{Error, Result};
use crate::device::{TextureHandle, TextureImage, TextureRegion};
use crate::resource::{TextureDesc, TypedArray};
use crate::renderer::{GpuContext, WorkRequests};
use crate::{engine_bail, engine_debug};

/// Sub-region upload
#[derive(Debug, Clone, PartialEq)]
pub struct TextureUpdate {
    pub data: TypedArray,
    pub region: TextureRegion,
    /// First element of `data` handed to the device
    pub data_offset: usize,
}

#[derive(Debug)]
pub struct TextureResource {
    desc: TextureDesc,
    handle: Option<TextureHandle>,
    unit: Option<u32>,
    pending: Vec<TextureUpdate>,
}

impl TextureResource {
    pub fn from_desc(desc: &TextureDesc) -> Result<Self> {
        if let Some(pixels) = &desc.pixels {
            if pixels.element_type() != desc.pixel_type {
                return Err(Error::UnknownResourceKind(format!(
                    "texture pixels are {:?} but the pixel type is {:?}",
                    pixels.element_type(),
                    desc.pixel_type
                )));
            }
        }
        Ok(Self { desc: desc.clone(), handle: None, unit: None, pending: Vec::new() })
    }

    // ===== ACCESSORS =====

    pub fn desc(&self) -> &TextureDesc { &self.desc }

    /// GLSL sampler type
    pub fn shader_type(&self) -> &'static str { self.desc.sampler.shader_type() }

    /// Texture unit, known once created
    pub fn unit(&self) -> Option<u32> { self.unit }

    pub fn handle(&self) -> Option<TextureHandle> { self.handle }

    pub fn is_created(&self) -> bool { self.handle.is_some() }

    pub fn pending_len(&self) -> usize { self.pending.len() }

    // ===== LIFECYCLE =====

    pub(crate) fn create(&mut self, gpu: &mut GpuContext<'_>, work: &mut WorkRequests) -> Result<()> {
        let data = self.desc.initial_data();
        let needed = self.desc.width as usize * self.desc.height as usize * self.desc.channels as usize;
        let available = data.len().saturating_sub(self.desc.data_offset);
        if available < needed {
            engine_bail!("glint::Texture", "Texture image of {}x{} needs {} elements, {} given after offset {}",
                self.desc.width, self.desc.height, needed, available, self.desc.data_offset);
        }

        let handle = gpu.device.create_texture()?;
        self.handle = Some(handle);
        self.unit = Some(gpu.set_texture(handle));

        for (parameter, value) in &self.desc.parameters {
            gpu.device.tex_parameter(*parameter, *value);
        }

        gpu.device.tex_image_2d(&TextureImage {
            level: self.desc.level,
            internal_format: self.desc.internal_format,
            width: self.desc.width,
            height: self.desc.height,
            format: self.desc.format,
            pixel_type: self.desc.pixel_type,
            data: data.bytes_from(self.desc.data_offset),
        });
        work.request_render();

        for update in std::mem::take(&mut self.pending) {
            self.update(Some(&mut *gpu), work, update)?;
        }

        if gpu.debug {
            engine_debug!("glint::Texture", "Created texture {:?} on unit {} ({}x{})",
                handle, self.unit.unwrap_or_default(), self.desc.width, self.desc.height);
        }
        Ok(())
    }

    pub(crate) fn destroy(&mut self) {
        self.handle = None;
        self.unit = None;
    }

    // ===== WRITES =====

    /// Upload a sub-region now, or queue it until creation
    pub(crate) fn update(
        &mut self,
        gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
        update: TextureUpdate,
    ) -> Result<()> {
        if update.data.element_type() != self.desc.pixel_type {
            return Err(Error::InvalidResource(format!(
                "texture update with {:?} data into {:?} pixels",
                update.data.element_type(),
                self.desc.pixel_type
            )));
        }

        match (self.handle, gpu) {
            (Some(handle), Some(gpu)) => {
                gpu.set_texture(handle);
                gpu.device.tex_sub_image_2d(
                    self.desc.level,
                    update.region,
                    self.desc.format,
                    self.desc.pixel_type,
                    update.data.bytes_from(update.data_offset),
                );
            }
            _ => self.pending.push(update),
        }

        work.request_render();
        Ok(())
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
