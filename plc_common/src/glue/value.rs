//! IEC value types carried by glue variables.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use super::location::SizeClass;

// ─── ValueType ──────────────────────────────────────────────────────

/// Declared IEC type of a glue variable.
///
/// Names serialize in upper case (`"BOOL"`, `"LREAL"`) to match the
/// generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum ValueType {
    Bool = 0,
    Byte,
    SInt,
    USInt,
    Int,
    UInt,
    Word,
    DInt,
    UDInt,
    DWord,
    Real,
    LReal,
    LWord,
    LInt,
    ULInt,
    /// Never present in a glue table. Lets collaborators mark slots of
    /// their own indices that have no variable bound.
    Unassigned,
}

impl ValueType {
    /// Size class a variable of this type must be located with.
    ///
    /// `None` for [`ValueType::Unassigned`].
    pub const fn size_class(self) -> Option<SizeClass> {
        match self {
            Self::Bool => Some(SizeClass::Bit),
            Self::Byte | Self::SInt | Self::USInt => Some(SizeClass::Byte),
            Self::Int | Self::UInt | Self::Word => Some(SizeClass::Word),
            Self::DInt | Self::UDInt | Self::DWord | Self::Real => Some(SizeClass::DoubleWord),
            Self::LReal | Self::LWord | Self::LInt | Self::ULInt => Some(SizeClass::LongWord),
            Self::Unassigned => None,
        }
    }

    /// IEC 61131-3 type name.
    pub const fn iec_name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Byte => "BYTE",
            Self::SInt => "SINT",
            Self::USInt => "USINT",
            Self::Int => "INT",
            Self::UInt => "UINT",
            Self::Word => "WORD",
            Self::DInt => "DINT",
            Self::UDInt => "UDINT",
            Self::DWord => "DWORD",
            Self::Real => "REAL",
            Self::LReal => "LREAL",
            Self::LWord => "LWORD",
            Self::LInt => "LINT",
            Self::ULInt => "ULINT",
            Self::Unassigned => "UNASSIGNED",
        }
    }

    /// Whether this type holds an integer or bit-string value.
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::Real | Self::LReal | Self::Unassigned)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iec_name())
    }
}

impl FromStr for ValueType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOL" => Ok(Self::Bool),
            "BYTE" => Ok(Self::Byte),
            "SINT" => Ok(Self::SInt),
            "USINT" => Ok(Self::USInt),
            "INT" => Ok(Self::Int),
            "UINT" => Ok(Self::UInt),
            "WORD" => Ok(Self::Word),
            "DINT" => Ok(Self::DInt),
            "UDINT" => Ok(Self::UDInt),
            "DWORD" => Ok(Self::DWord),
            "REAL" => Ok(Self::Real),
            "LREAL" => Ok(Self::LReal),
            "LWORD" => Ok(Self::LWord),
            "LINT" => Ok(Self::LInt),
            "ULINT" => Ok(Self::ULInt),
            "UNASSIGNED" => Ok(Self::Unassigned),
            _ => Err(format!("unknown ValueType: {s:?}")),
        }
    }
}

// ─── GlueValue ──────────────────────────────────────────────────────

/// A typed value read from or written to a glue variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlueValue {
    Bool(bool),
    Byte(u8),
    SInt(i8),
    USInt(u8),
    Int(i16),
    UInt(u16),
    Word(u16),
    DInt(i32),
    UDInt(u32),
    DWord(u32),
    Real(f32),
    LReal(f64),
    LWord(u64),
    LInt(i64),
    ULInt(u64),
}

impl GlueValue {
    /// Declared type of this value.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Byte(_) => ValueType::Byte,
            Self::SInt(_) => ValueType::SInt,
            Self::USInt(_) => ValueType::USInt,
            Self::Int(_) => ValueType::Int,
            Self::UInt(_) => ValueType::UInt,
            Self::Word(_) => ValueType::Word,
            Self::DInt(_) => ValueType::DInt,
            Self::UDInt(_) => ValueType::UDInt,
            Self::DWord(_) => ValueType::DWord,
            Self::Real(_) => ValueType::Real,
            Self::LReal(_) => ValueType::LReal,
            Self::LWord(_) => ValueType::LWord,
            Self::LInt(_) => ValueType::LInt,
            Self::ULInt(_) => ValueType::ULInt,
        }
    }

    /// Raw bit pattern, zero-extended to 64 bits.
    ///
    /// Signed values are truncated to their own width first, so
    /// `SInt(-1)` yields `0xFF`.
    pub const fn to_bits(&self) -> u64 {
        match *self {
            Self::Bool(v) => v as u64,
            Self::Byte(v) | Self::USInt(v) => v as u64,
            Self::SInt(v) => v as u8 as u64,
            Self::Int(v) => v as u16 as u64,
            Self::UInt(v) | Self::Word(v) => v as u64,
            Self::DInt(v) => v as u32 as u64,
            Self::UDInt(v) | Self::DWord(v) => v as u64,
            Self::Real(v) => v.to_bits() as u64,
            Self::LReal(v) => v.to_bits(),
            Self::LWord(v) | Self::ULInt(v) => v,
            Self::LInt(v) => v as u64,
        }
    }

    /// Rebuild a value of `value_type` from a raw bit pattern.
    ///
    /// Bits above the type's width are ignored. `None` for
    /// [`ValueType::Unassigned`].
    pub fn from_bits(value_type: ValueType, bits: u64) -> Option<Self> {
        Some(match value_type {
            ValueType::Bool => Self::Bool(bits & 1 != 0),
            ValueType::Byte => Self::Byte(bits as u8),
            ValueType::SInt => Self::SInt(bits as u8 as i8),
            ValueType::USInt => Self::USInt(bits as u8),
            ValueType::Int => Self::Int(bits as u16 as i16),
            ValueType::UInt => Self::UInt(bits as u16),
            ValueType::Word => Self::Word(bits as u16),
            ValueType::DInt => Self::DInt(bits as u32 as i32),
            ValueType::UDInt => Self::UDInt(bits as u32),
            ValueType::DWord => Self::DWord(bits as u32),
            ValueType::Real => Self::Real(f32::from_bits(bits as u32)),
            ValueType::LReal => Self::LReal(f64::from_bits(bits)),
            ValueType::LWord => Self::LWord(bits),
            ValueType::LInt => Self::LInt(bits as i64),
            ValueType::ULInt => Self::ULInt(bits),
            ValueType::Unassigned => return None,
        })
    }
}

impl fmt::Display for GlueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Self::Byte(v) | Self::USInt(v) => write!(f, "{v}"),
            Self::SInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) | Self::Word(v) => write!(f, "{v}"),
            Self::DInt(v) => write!(f, "{v}"),
            Self::UDInt(v) | Self::DWord(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::LReal(v) => write!(f, "{v}"),
            Self::LWord(v) | Self::ULInt(v) => write!(f, "{v}"),
            Self::LInt(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_class_mapping() {
        assert_eq!(ValueType::Bool.size_class(), Some(SizeClass::Bit));
        assert_eq!(ValueType::SInt.size_class(), Some(SizeClass::Byte));
        assert_eq!(ValueType::UInt.size_class(), Some(SizeClass::Word));
        assert_eq!(ValueType::Real.size_class(), Some(SizeClass::DoubleWord));
        assert_eq!(ValueType::LReal.size_class(), Some(SizeClass::LongWord));
        assert_eq!(ValueType::LInt.size_class(), Some(SizeClass::LongWord));
        assert_eq!(ValueType::Unassigned.size_class(), None);
    }

    #[test]
    fn iec_names_parse_back() {
        for name in ["BOOL", "BYTE", "SINT", "INT", "UDINT", "REAL", "LREAL", "ULINT"] {
            let t: ValueType = name.parse().unwrap();
            assert_eq!(t.to_string(), name);
        }
        assert!("bool".parse::<ValueType>().is_err());
    }

    #[test]
    fn serde_uses_iec_names() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Wrapper {
            ty: ValueType,
        }
        let w: Wrapper = toml::from_str("ty = \"LREAL\"").unwrap();
        assert_eq!(w.ty, ValueType::LReal);
        let w: Wrapper = toml::from_str("ty = \"UDINT\"").unwrap();
        assert_eq!(w.ty, ValueType::UDInt);
    }

    #[test]
    fn signed_bits_are_width_truncated() {
        assert_eq!(GlueValue::SInt(-1).to_bits(), 0xFF);
        assert_eq!(GlueValue::Int(-2).to_bits(), 0xFFFE);
        assert_eq!(GlueValue::DInt(-1).to_bits(), 0xFFFF_FFFF);
        assert_eq!(
            GlueValue::from_bits(ValueType::Int, 0xFFFE),
            Some(GlueValue::Int(-2))
        );
    }

    #[test]
    fn float_bits() {
        let v = GlueValue::Real(1.5);
        assert_eq!(GlueValue::from_bits(ValueType::Real, v.to_bits()), Some(v));
        let v = GlueValue::LReal(-0.25);
        assert_eq!(GlueValue::from_bits(ValueType::LReal, v.to_bits()), Some(v));
    }

    #[test]
    fn unassigned_has_no_value() {
        assert_eq!(GlueValue::from_bits(ValueType::Unassigned, 0), None);
        assert!(!ValueType::Unassigned.is_integer());
        assert!(ValueType::DWord.is_integer());
        assert!(!ValueType::Real.is_integer());
    }
}
