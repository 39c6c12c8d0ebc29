//! Constant values stored in the `#Blob` heap.
//!
//! Rows of the `Constant` table point to a blob holding the raw value of a field, parameter
//! or property default (ECMA-335 §II.22.9). Primitives are stored little-endian, strings as
//! UTF-16LE without a terminator, and a null reference as a 4-byte zero.

/// A literal value that can be stored as a constant blob.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `ELEMENT_TYPE_BOOLEAN`, one byte
    Boolean(bool),
    /// `ELEMENT_TYPE_CHAR`, one UTF-16 code unit
    Char(u16),
    /// `ELEMENT_TYPE_I1`
    I1(i8),
    /// `ELEMENT_TYPE_U1`
    U1(u8),
    /// `ELEMENT_TYPE_I2`
    I2(i16),
    /// `ELEMENT_TYPE_U2`
    U2(u16),
    /// `ELEMENT_TYPE_I4`
    I4(i32),
    /// `ELEMENT_TYPE_U4`
    U4(u32),
    /// `ELEMENT_TYPE_I8`
    I8(i64),
    /// `ELEMENT_TYPE_U8`
    U8(u64),
    /// `ELEMENT_TYPE_R4`
    R4(f32),
    /// `ELEMENT_TYPE_R8`
    R8(f64),
    /// `ELEMENT_TYPE_STRING`
    String(String),
    /// `ELEMENT_TYPE_CLASS` with a null reference
    Null,
}

impl ConstantValue {
    /// Encodes the value into its blob representation.
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        match self {
            ConstantValue::Boolean(value) => vec![u8::from(*value)],
            ConstantValue::Char(value) | ConstantValue::U2(value) => value.to_le_bytes().to_vec(),
            ConstantValue::I1(value) => value.to_le_bytes().to_vec(),
            ConstantValue::U1(value) => vec![*value],
            ConstantValue::I2(value) => value.to_le_bytes().to_vec(),
            ConstantValue::I4(value) => value.to_le_bytes().to_vec(),
            ConstantValue::U4(value) => value.to_le_bytes().to_vec(),
            ConstantValue::I8(value) => value.to_le_bytes().to_vec(),
            ConstantValue::U8(value) => value.to_le_bytes().to_vec(),
            ConstantValue::R4(value) => value.to_le_bytes().to_vec(),
            ConstantValue::R8(value) => value.to_le_bytes().to_vec(),
            ConstantValue::String(value) => utf16_blob(value),
            ConstantValue::Null => vec![0; 4],
        }
    }
}

/// UTF-16LE bytes of `value` without length or terminator.
pub(crate) fn utf16_blob(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

impl From<&str> for ConstantValue {
    fn from(value: &str) -> Self {
        ConstantValue::String(value.to_string())
    }
}

impl From<bool> for ConstantValue {
    fn from(value: bool) -> Self {
        ConstantValue::Boolean(value)
    }
}

impl From<i32> for ConstantValue {
    fn from(value: i32) -> Self {
        ConstantValue::I4(value)
    }
}

impl From<i64> for ConstantValue {
    fn from(value: i64) -> Self {
        ConstantValue::I8(value)
    }
}

impl From<f64> for ConstantValue {
    fn from(value: f64) -> Self {
        ConstantValue::R8(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        assert_eq!(ConstantValue::Boolean(true).to_blob(), [1]);
        assert_eq!(ConstantValue::Char(0x20AC).to_blob(), [0xAC, 0x20]);
        assert_eq!(ConstantValue::I1(-1).to_blob(), [0xFF]);
        assert_eq!(ConstantValue::U1(7).to_blob(), [7]);
        assert_eq!(ConstantValue::I2(-2).to_blob(), [0xFE, 0xFF]);
        assert_eq!(ConstantValue::I4(0x0102_0304).to_blob(), [4, 3, 2, 1]);
        assert_eq!(ConstantValue::U4(1).to_blob(), [1, 0, 0, 0]);
        assert_eq!(ConstantValue::I8(1).to_blob(), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ConstantValue::U8(u64::MAX).to_blob(), [0xFF; 8]);
        assert_eq!(ConstantValue::R4(1.0).to_blob(), [0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(
            ConstantValue::R8(1.0).to_blob(),
            [0, 0, 0, 0, 0, 0, 0xF0, 0x3F]
        );
    }

    #[test]
    fn strings_are_utf16_without_terminator() {
        assert_eq!(ConstantValue::from("Ab").to_blob(), [b'A', 0, b'b', 0]);
        assert!(ConstantValue::from("").to_blob().is_empty());
    }

    #[test]
    fn null_is_four_zero_bytes() {
        assert_eq!(ConstantValue::Null.to_blob(), [0, 0, 0, 0]);
    }

    #[test]
    fn conversions() {
        assert_eq!(ConstantValue::from(true), ConstantValue::Boolean(true));
        assert_eq!(ConstantValue::from(5i32), ConstantValue::I4(5));
        assert_eq!(ConstantValue::from(5i64), ConstantValue::I8(5));
        assert_eq!(ConstantValue::from(0.5f64), ConstantValue::R8(0.5));
    }
}
