/// Logical resource descriptors supplied by callers
///
/// A descriptor is shared through an `Arc`; the registry keys resources by the
/// allocation address, so two commands naming the same `SharedResource` bind
/// one GPU resource while two equal-but-distinct descriptors get two.

use std::sync::Arc;
use crate::device::{
    ElementType, PixelFormat, InternalFormat, SamplerType, SamplerParameter, SamplerValue,
};
use crate::resource::{Value, TypedArray};

/// Descriptor handle shared between commands
pub type SharedResource = Arc<ResourceDesc>;

// ===== BUFFER =====

/// Per-vertex attribute data, one `Value` per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDesc {
    pub vertices: Vec<Value>,
}

// ===== UNIFORM BLOCK =====

/// Named fields packed with std140 rules, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformBlockDesc {
    pub fields: Vec<(String, Value)>,
}

impl UniformBlockDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }
}

// ===== TEXTURE =====

/// 2D texture description
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub sampler: SamplerType,
    pub level: u32,
    pub format: PixelFormat,
    pub internal_format: InternalFormat,
    pub pixel_type: ElementType,
    pub channels: u32,
    pub width: u32,
    pub height: u32,
    /// Initial pixels; a zeroed image of `width * height * channels` when `None`
    pub pixels: Option<TypedArray>,
    /// First element of `pixels` handed to the device
    pub data_offset: usize,
    /// Sampler parameters applied before the upload
    pub parameters: Vec<(SamplerParameter, SamplerValue)>,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            sampler: SamplerType::Sampler2D,
            level: 0,
            format: PixelFormat::Rgba,
            internal_format: InternalFormat::Rgba32F,
            pixel_type: ElementType::Float,
            channels: 4,
            width: 64,
            height: 64,
            pixels: None,
            data_offset: 0,
            parameters: vec![
                (SamplerParameter::MagFilter, SamplerValue::Nearest),
                (SamplerParameter::MinFilter, SamplerValue::Nearest),
            ],
        }
    }
}

impl TextureDesc {
    /// Set a sampler parameter, replacing an earlier value for the same name
    pub fn parameter(mut self, parameter: SamplerParameter, value: SamplerValue) -> Self {
        match self.parameters.iter_mut().find(|(p, _)| *p == parameter) {
            Some(entry) => entry.1 = value,
            None => self.parameters.push((parameter, value)),
        }
        self
    }

    /// Pixel data uploaded at creation
    pub fn initial_data(&self) -> TypedArray {
        match &self.pixels {
            Some(pixels) => pixels.clone(),
            None => TypedArray::zeros(
                self.pixel_type,
                self.width as usize * self.height as usize * self.channels as usize,
            ),
        }
    }
}

// ===== DESCRIPTOR =====

/// Tagged union of everything a command can bind as shared context
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDesc {
    Buffer(BufferDesc),
    UniformBlock(UniformBlockDesc),
    Texture(TextureDesc),
}

impl ResourceDesc {
    /// Shared vertex buffer descriptor
    pub fn buffer<V: Into<Value>>(vertices: impl IntoIterator<Item = V>) -> SharedResource {
        Arc::new(ResourceDesc::Buffer(BufferDesc {
            vertices: vertices.into_iter().map(Into::into).collect(),
        }))
    }

    /// Shared uniform block descriptor
    pub fn uniform_block(desc: UniformBlockDesc) -> SharedResource {
        Arc::new(ResourceDesc::UniformBlock(desc))
    }

    /// Shared texture descriptor
    pub fn texture(desc: TextureDesc) -> SharedResource {
        Arc::new(ResourceDesc::Texture(desc))
    }

    /// Kind name used in logs and errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceDesc::Buffer(_) => "buffer",
            ResourceDesc::UniformBlock(_) => "uniform block",
            ResourceDesc::Texture(_) => "texture",
        }
    }
}

/// Identity of a shared descriptor (its allocation address)
pub(crate) fn descriptor_identity(desc: &SharedResource) -> usize {
    Arc::as_ptr(desc) as usize
}
