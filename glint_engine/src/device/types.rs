/// Handle types and enumerations shared by the Device trait and the engine

use std::fmt;
use bitflags::bitflags;

// ===== HANDLES =====

/// Opaque buffer object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Opaque texture object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque compiled shader object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque linked program name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque vertex array object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Location of a non-block uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

// ===== SHADERS =====

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

// ===== BUFFERS =====

/// Binding point a buffer is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex or per-instance attribute data
    Array,
    /// Index data for indexed draws
    ElementArray,
    /// Uniform block storage
    Uniform,
}

/// Upload frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times
    StaticDraw,
    /// Rewritten often (instance data, uniform blocks)
    DynamicDraw,
}

/// Numeric element type of buffer or pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Float,
}

impl ElementType {
    /// Size of one element in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            ElementType::Byte | ElementType::UnsignedByte => 1,
            ElementType::Short | ElementType::UnsignedShort => 2,
            ElementType::Float => 4,
        }
    }
}

/// Per-attribute layout passed to `Device::vertex_attrib_pointer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribLayout {
    /// Components per vertex (1..=4, or 9/16 for matrices)
    pub dimensions: u32,
    /// Component type
    pub element_type: ElementType,
    /// 0 = advance per vertex, 1 = advance per instance
    pub divisor: u32,
}

// ===== FIXED FUNCTION STATE =====

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Faces removed by face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

bitflags! {
    /// Buffers cleared by `Device::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ===== TEXTURES =====

/// Shader-facing sampler type of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerType {
    #[default]
    Sampler2D,
    IntSampler2D,
    UnsignedSampler2D,
}

impl SamplerType {
    /// GLSL type name used in generated declarations
    pub fn shader_type(&self) -> &'static str {
        match self {
            SamplerType::Sampler2D => "sampler2D",
            SamplerType::IntSampler2D => "isampler2D",
            SamplerType::UnsignedSampler2D => "usampler2D",
        }
    }
}

/// Layout of the pixel data handed to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    #[default]
    Rgba,
    RedInteger,
    RgbaInteger,
}

impl PixelFormat {
    /// Number of channels per pixel
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Red | PixelFormat::RedInteger => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba | PixelFormat::RgbaInteger => 4,
        }
    }
}

/// Storage format of the texture on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InternalFormat {
    R8,
    Rgba8,
    R32F,
    Rg32F,
    Rgb32F,
    #[default]
    Rgba32F,
    R16UI,
    Rgba8UI,
}

/// Sampler parameter name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerParameter {
    MinFilter,
    MagFilter,
    WrapS,
    WrapT,
}

/// Sampler parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerValue {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapLinear,
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Full image description for `Device::tex_image_2d`
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    pub level: u32,
    pub internal_format: InternalFormat,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixel_type: ElementType,
    pub data: &'a [u8],
}

/// Sub-rectangle of a texture level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for TextureRegion {
    fn default() -> Self {
        Self { x: 0, y: 0, width: 1, height: 1 }
    }
}
