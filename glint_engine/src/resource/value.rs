/// Values carried by buffer descriptors, instance properties and uniform fields.
///
/// A Value is one vertex, one instance attribute or one uniform field. Its
/// variant decides the GPU element type, and its length decides the shader
/// type (scalar, N-vector, or square matrix when longer than 4).

use crate::error::{Error, Result};
use crate::device::ElementType;

// ===== VALUE =====

/// One fixed-width numeric value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f32),
    Bool(bool),
    Floats(Vec<f32>),
    Bytes(Vec<i8>),
    UnsignedBytes(Vec<u8>),
    Shorts(Vec<i16>),
    UnsignedShorts(Vec<u16>),
}

/// Element type, shader type and width derived from a sample value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLayout {
    pub element_type: ElementType,
    pub shader_type: String,
    pub dimensions: usize,
}

impl Value {
    /// Number of components
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) | Value::Bool(_) => 1,
            Value::Floats(v) => v.len(),
            Value::Bytes(v) => v.len(),
            Value::UnsignedBytes(v) => v.len(),
            Value::Shorts(v) => v.len(),
            Value::UnsignedShorts(v) => v.len(),
        }
    }

    /// Whether the value has no component
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// GPU element type of the components
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Scalar(_) | Value::Floats(_) => ElementType::Float,
            Value::Bool(_) | Value::Bytes(_) => ElementType::Byte,
            Value::UnsignedBytes(_) => ElementType::UnsignedByte,
            Value::Shorts(_) => ElementType::Short,
            Value::UnsignedShorts(_) => ElementType::UnsignedShort,
        }
    }

    /// GLSL type declared for this value
    pub fn shader_type(&self) -> Result<String> {
        let len = self.len();
        let shader_type = match self {
            Value::Scalar(_) => Some("float".to_string()),
            Value::Bool(_) => Some("bool".to_string()),
            Value::Floats(_) => match len {
                1 => Some("float".to_string()),
                2..=4 => Some(format!("vec{}", len)),
                9 => Some("mat3".to_string()),
                16 => Some("mat4".to_string()),
                _ => None,
            },
            Value::Bytes(_) | Value::Shorts(_) => match len {
                1 => Some("int".to_string()),
                2..=4 => Some(format!("ivec{}", len)),
                _ => None,
            },
            Value::UnsignedBytes(_) | Value::UnsignedShorts(_) => match len {
                1 => Some("uint".to_string()),
                2..=4 => Some(format!("uvec{}", len)),
                _ => None,
            },
        };

        shader_type.ok_or_else(|| {
            Error::UnknownResourceKind(format!(
                "no shader type for a {:?} value of length {}",
                self.element_type(),
                len
            ))
        })
    }

    /// Full layout of this value, failing for unclassifiable shapes
    pub fn layout(&self) -> Result<ValueLayout> {
        Ok(ValueLayout {
            element_type: self.element_type(),
            shader_type: self.shader_type()?,
            dimensions: self.len().max(1),
        })
    }

    /// Components widened to `f32` (true = 1.0)
    pub fn components(&self) -> Vec<f32> {
        match self {
            Value::Scalar(v) => vec![*v],
            Value::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
            Value::Floats(v) => v.clone(),
            Value::Bytes(v) => v.iter().map(|&x| x as f32).collect(),
            Value::UnsignedBytes(v) => v.iter().map(|&x| x as f32).collect(),
            Value::Shorts(v) => v.iter().map(|&x| x as f32).collect(),
            Value::UnsignedShorts(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }
}

// ===== CONVERSIONS =====

impl From<f32> for Value {
    fn from(v: f32) -> Self { Value::Scalar(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Bool(v) }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self { Value::Floats(v) }
}

impl From<&[f32]> for Value {
    fn from(v: &[f32]) -> Self { Value::Floats(v.to_vec()) }
}

impl<const N: usize> From<[f32; N]> for Value {
    fn from(v: [f32; N]) -> Self { Value::Floats(v.to_vec()) }
}

impl From<Vec<i8>> for Value {
    fn from(v: Vec<i8>) -> Self { Value::Bytes(v) }
}

impl<const N: usize> From<[i8; N]> for Value {
    fn from(v: [i8; N]) -> Self { Value::Bytes(v.to_vec()) }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Value::UnsignedBytes(v) }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(v: [u8; N]) -> Self { Value::UnsignedBytes(v.to_vec()) }
}

impl From<Vec<i16>> for Value {
    fn from(v: Vec<i16>) -> Self { Value::Shorts(v) }
}

impl<const N: usize> From<[i16; N]> for Value {
    fn from(v: [i16; N]) -> Self { Value::Shorts(v.to_vec()) }
}

impl From<Vec<u16>> for Value {
    fn from(v: Vec<u16>) -> Self { Value::UnsignedShorts(v) }
}

impl<const N: usize> From<[u16; N]> for Value {
    fn from(v: [u16; N]) -> Self { Value::UnsignedShorts(v.to_vec()) }
}

impl From<glam::Vec2> for Value {
    fn from(v: glam::Vec2) -> Self { Value::Floats(v.to_array().to_vec()) }
}

impl From<glam::Vec3> for Value {
    fn from(v: glam::Vec3) -> Self { Value::Floats(v.to_array().to_vec()) }
}

impl From<glam::Vec4> for Value {
    fn from(v: glam::Vec4) -> Self { Value::Floats(v.to_array().to_vec()) }
}

impl From<glam::Mat3> for Value {
    /// Column-major, as GLSL expects
    fn from(m: glam::Mat3) -> Self { Value::Floats(m.to_cols_array().to_vec()) }
}

impl From<glam::Mat4> for Value {
    /// Column-major, as GLSL expects
    fn from(m: glam::Mat4) -> Self { Value::Floats(m.to_cols_array().to_vec()) }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
