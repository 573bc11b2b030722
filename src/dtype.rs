use std::fmt;

// ElemType — Element type tags known to the compiler
//
// Every kernel constraint names the element types a parameter accepts, and
// every backend advertises the element types it can execute natively. Both
// sides speak in these tags:
//
//   F8E4M3FN — 8-bit float (4 exponent / 3 mantissa), low-precision training
//   F16/BF16 — 16-bit floats, mixed precision
//   F32/F64  — the standard float workhorses
//   U8..I64  — integer widths for indices, labels, masks
//   Bool     — predicates
//   Str      — variable-length strings (Const values, Assert messages)
//
// The tag set is deliberately wider than what any single backend supports:
// whether a tag is executable is a per-backend question answered by the
// capability table, not by the tag itself.

/// Enum of all element-type tags.
///
/// Stored in constraint allowed-type sets and in backend capability lists;
/// membership checks between the two decide compile eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemType {
    F8E4M3FN,
    F16,
    BF16,
    F32,
    F64,
    U8,
    I8,
    I32,
    I64,
    U32,
    Bool,
    Str,
}

impl ElemType {
    /// Size of one element in bytes. `Str` is variable length; this reports
    /// the size of the handle, not the payload.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ElemType::F8E4M3FN => 1,
            ElemType::F16 => 2,
            ElemType::BF16 => 2,
            ElemType::F32 => 4,
            ElemType::F64 => 8,
            ElemType::U8 => 1,
            ElemType::I8 => 1,
            ElemType::I32 => 4,
            ElemType::I64 => 8,
            ElemType::U32 => 4,
            ElemType::Bool => 1,
            ElemType::Str => std::mem::size_of::<usize>(),
        }
    }

    /// Whether this tag is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ElemType::F8E4M3FN | ElemType::F16 | ElemType::BF16 | ElemType::F32 | ElemType::F64
        )
    }

    /// Whether this tag is an integer type (Bool excluded).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ElemType::U8 | ElemType::I8 | ElemType::I32 | ElemType::I64 | ElemType::U32
        )
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElemType::F8E4M3FN => "f8e4m3fn",
            ElemType::F16 => "f16",
            ElemType::BF16 => "bf16",
            ElemType::F32 => "f32",
            ElemType::F64 => "f64",
            ElemType::U8 => "u8",
            ElemType::I8 => "i8",
            ElemType::I32 => "i32",
            ElemType::I64 => "i64",
            ElemType::U32 => "u32",
            ElemType::Bool => "bool",
            ElemType::Str => "str",
        };
        write!(f, "{}", s)
    }
}
