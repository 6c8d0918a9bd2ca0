/// CPU shadow storage for GPU buffers
///
/// One contiguous array of a single element type. Uploads read the raw bytes
/// through `bytemuck`; partial writes go through `write` and are then
/// committed as a byte sub-range.

use crate::error::{Error, Result};
use crate::device::ElementType;
use crate::resource::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    F32(Vec<f32>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
}

impl TypedArray {
    /// Zero-filled array of `len` elements
    pub fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Float => TypedArray::F32(vec![0.0; len]),
            ElementType::Byte => TypedArray::I8(vec![0; len]),
            ElementType::UnsignedByte => TypedArray::U8(vec![0; len]),
            ElementType::Short => TypedArray::I16(vec![0; len]),
            ElementType::UnsignedShort => TypedArray::U16(vec![0; len]),
        }
    }

    /// Concatenate the components of `values` into one array of `element_type`
    pub fn flatten(element_type: ElementType, values: &[Value]) -> Self {
        let len = values.iter().map(Value::len).sum();
        let mut array = Self::zeros(element_type, len);
        let mut offset = 0;
        for value in values {
            array.write_components(offset, &value.components());
            offset += value.len();
        }
        array
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            TypedArray::F32(v) => v.len(),
            TypedArray::I8(v) => v.len(),
            TypedArray::U8(v) => v.len(),
            TypedArray::I16(v) => v.len(),
            TypedArray::U16(v) => v.len(),
        }
    }

    /// Whether the array holds no element
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the storage
    pub fn element_type(&self) -> ElementType {
        match self {
            TypedArray::F32(_) => ElementType::Float,
            TypedArray::I8(_) => ElementType::Byte,
            TypedArray::U8(_) => ElementType::UnsignedByte,
            TypedArray::I16(_) => ElementType::Short,
            TypedArray::U16(_) => ElementType::UnsignedShort,
        }
    }

    /// Raw bytes of the whole array
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TypedArray::F32(v) => bytemuck::cast_slice(v),
            TypedArray::I8(v) => bytemuck::cast_slice(v),
            TypedArray::U8(v) => v.as_slice(),
            TypedArray::I16(v) => bytemuck::cast_slice(v),
            TypedArray::U16(v) => bytemuck::cast_slice(v),
        }
    }

    /// Raw bytes of elements `[first, last)`, clamped to the array
    pub fn byte_range(&self, first: usize, last: usize) -> &[u8] {
        let size = self.element_type().size_bytes();
        let last = last.min(self.len());
        let first = first.min(last);
        &self.as_bytes()[first * size..last * size]
    }

    /// Raw bytes from element `offset` to the end, clamped to the array
    pub fn bytes_from(&self, offset: usize) -> &[u8] {
        self.byte_range(offset, self.len())
    }

    /// Element at `index` widened to `f32`
    pub fn get(&self, index: usize) -> Option<f32> {
        match self {
            TypedArray::F32(v) => v.get(index).copied(),
            TypedArray::I8(v) => v.get(index).map(|&x| x as f32),
            TypedArray::U8(v) => v.get(index).map(|&x| x as f32),
            TypedArray::I16(v) => v.get(index).map(|&x| x as f32),
            TypedArray::U16(v) => v.get(index).map(|&x| x as f32),
        }
    }

    /// Write the components of `value` starting at element `offset`
    ///
    /// Components are converted to the storage element type. Writes that
    /// would run past the end fail without touching the array.
    pub fn write(&mut self, offset: usize, value: &Value) -> Result<()> {
        check_write(offset, value.len(), self.len())?;
        self.write_components(offset, &value.components());
        Ok(())
    }

    fn write_components(&mut self, offset: usize, components: &[f32]) {
        let range = offset..offset + components.len();
        match self {
            TypedArray::F32(v) => v[range].copy_from_slice(components),
            TypedArray::I8(v) => v[range].iter_mut().zip(components).for_each(|(d, s)| *d = *s as i8),
            TypedArray::U8(v) => v[range].iter_mut().zip(components).for_each(|(d, s)| *d = *s as u8),
            TypedArray::I16(v) => v[range].iter_mut().zip(components).for_each(|(d, s)| *d = *s as i16),
            TypedArray::U16(v) => v[range].iter_mut().zip(components).for_each(|(d, s)| *d = *s as u16),
        }
    }
}

impl From<Vec<f32>> for TypedArray {
    fn from(v: Vec<f32>) -> Self { TypedArray::F32(v) }
}

impl From<Vec<i8>> for TypedArray {
    fn from(v: Vec<i8>) -> Self { TypedArray::I8(v) }
}

impl From<Vec<u8>> for TypedArray {
    fn from(v: Vec<u8>) -> Self { TypedArray::U8(v) }
}

impl From<Vec<i16>> for TypedArray {
    fn from(v: Vec<i16>) -> Self { TypedArray::I16(v) }
}

impl From<Vec<u16>> for TypedArray {
    fn from(v: Vec<u16>) -> Self { TypedArray::U16(v) }
}

/// End of a write of `count` elements at `offset` into an array of `len`
pub(crate) fn check_write(offset: usize, count: usize, len: usize) -> Result<usize> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => Err(Error::InvalidResource(format!(
            "write of {} elements at offset {} exceeds length {}",
            count, offset, len
        ))),
    }
}

#[cfg(test)]
#[path = "typed_array_tests.rs"]
mod tests;
