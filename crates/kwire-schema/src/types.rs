//! Structural type descriptions parsed from catalog type strings.
//!
//! The server publishes argument and return types as C++ spellings
//! (`uint32_t`, `std::array<float, 10>`, `std::tuple<unsigned int, float>`).
//! Parsing is purely syntactic: the text before the first `<` selects the
//! constructor and the text inside the outermost `<...>` is split on
//! top-level commas into template parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

/// Scalar kinds the wire codec can encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Bool,
    String,
}

impl ScalarKind {
    /// Every supported scalar kind.
    pub const ALL: [ScalarKind; 12] = [
        ScalarKind::U8,
        ScalarKind::I8,
        ScalarKind::U16,
        ScalarKind::I16,
        ScalarKind::U32,
        ScalarKind::I32,
        ScalarKind::U64,
        ScalarKind::I64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Bool,
        ScalarKind::String,
    ];

    /// Map a C++ scalar keyword (already normalized) to its kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "uint8_t" | "unsigned char" => ScalarKind::U8,
            "int8_t" | "signed char" | "char" => ScalarKind::I8,
            "uint16_t" | "unsigned short" => ScalarKind::U16,
            "int16_t" | "short" => ScalarKind::I16,
            "uint32_t" | "unsigned int" | "unsigned" => ScalarKind::U32,
            "int32_t" | "int" => ScalarKind::I32,
            "uint64_t" | "unsigned long" | "unsigned long long" | "size_t" => ScalarKind::U64,
            "int64_t" | "long" | "long long" => ScalarKind::I64,
            "float" => ScalarKind::F32,
            "double" => ScalarKind::F64,
            "bool" => ScalarKind::Bool,
            "std::string" | "char*" => ScalarKind::String,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical C++ spelling.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::U8 => "uint8_t",
            ScalarKind::I8 => "int8_t",
            ScalarKind::U16 => "uint16_t",
            ScalarKind::I16 => "int16_t",
            ScalarKind::U32 => "uint32_t",
            ScalarKind::I32 => "int32_t",
            ScalarKind::U64 => "uint64_t",
            ScalarKind::I64 => "int64_t",
            ScalarKind::F32 => "float",
            ScalarKind::F64 => "double",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "std::string",
        }
    }

    /// Encoded width in bytes, or `None` for variable-length strings.
    pub fn size(self) -> Option<usize> {
        match self {
            ScalarKind::U8 | ScalarKind::I8 | ScalarKind::Bool => Some(1),
            ScalarKind::U16 | ScalarKind::I16 => Some(2),
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => Some(4),
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => Some(8),
            ScalarKind::String => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::U8
                | ScalarKind::I8
                | ScalarKind::U16
                | ScalarKind::I16
                | ScalarKind::U32
                | ScalarKind::I32
                | ScalarKind::U64
                | ScalarKind::I64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// Kinds allowed as array/vector elements.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared length of a fixed-size array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    /// A numeric literal; enforced on encode and decode.
    Literal(usize),
    /// A named constant the client cannot evaluate; never enforced.
    Named(String),
}

impl ArrayLen {
    pub fn literal(&self) -> Option<usize> {
        match self {
            ArrayLen::Literal(n) => Some(*n),
            ArrayLen::Named(_) => None,
        }
    }
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Literal(n) => write!(f, "{n}"),
            ArrayLen::Named(name) => f.write_str(name),
        }
    }
}

/// Parsed structural description of an argument or return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Scalar(ScalarKind),
    /// `std::array<T, N>`: raw little-endian elements, no length prefix.
    Array { elem: ScalarKind, len: ArrayLen },
    /// `std::vector<T>`: 8-byte big-endian count, then raw little-endian elements.
    Vector(ScalarKind),
    /// `std::tuple<T...>`: elements encoded in order.
    Tuple(Vec<TypeSpec>),
}

const ARRAY_TAG: &str = "std::array";
const VECTOR_TAG: &str = "std::vector";
const TUPLE_TAG: &str = "std::tuple";

impl TypeSpec {
    /// Parse a catalog type string.
    pub fn parse(type_name: &str) -> Result<Self> {
        let normalized = normalize(type_name);
        parse_normalized(&normalized).ok_or_else(|| SchemaError::UnsupportedType {
            type_name: type_name.to_string(),
        })
    }

    /// Exact encoded size, when it does not depend on the value.
    ///
    /// `None` also covers declared sizes that overflow `usize`.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeSpec::Scalar(kind) => kind.size(),
            TypeSpec::Array { elem, len } => elem.size()?.checked_mul(len.literal()?),
            TypeSpec::Vector(_) => None,
            TypeSpec::Tuple(items) => items
                .iter()
                .try_fold(0usize, |total, item| total.checked_add(item.fixed_size()?)),
        }
    }

    pub fn is_dynamic_vector(&self) -> bool {
        matches!(self, TypeSpec::Vector(_))
    }
}

impl FromStr for TypeSpec {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Scalar(kind) => write!(f, "{kind}"),
            TypeSpec::Array { elem, len } => write!(f, "{ARRAY_TAG}<{elem}, {len}>"),
            TypeSpec::Vector(elem) => write!(f, "{VECTOR_TAG}<{elem}>"),
            TypeSpec::Tuple(items) => {
                write!(f, "{TUPLE_TAG}<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Strip qualifiers and canonicalize whitespace.
///
/// `"const std::array<float, 10>&"` becomes `"std::array<float,10>"` and
/// `"const char *"` becomes `"char*"`.
fn normalize(type_name: &str) -> String {
    let mut s = type_name.trim();
    loop {
        let before = s;
        if let Some(rest) = s.strip_prefix("const ") {
            s = rest.trim_start();
        }
        if let Some(rest) = s.strip_suffix('&') {
            s = rest.trim_end();
        }
        if s == before {
            break;
        }
    }

    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let hugs_punct = |p: Option<char>| matches!(p, Some('<' | '>' | ',' | '*'));
            if hugs_punct(prev) || hugs_punct(next) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn parse_normalized(s: &str) -> Option<TypeSpec> {
    let Some(open) = s.find('<') else {
        return ScalarKind::from_keyword(s).map(TypeSpec::Scalar);
    };

    let tag = &s[..open];
    let inner = s[open + 1..].strip_suffix('>')?;
    let params = split_top_level(inner)?;

    match tag {
        ARRAY_TAG => {
            let [elem, len] = params.as_slice() else {
                return None;
            };
            Some(TypeSpec::Array {
                elem: parse_element(elem)?,
                len: parse_len(len)?,
            })
        }
        VECTOR_TAG => {
            let [elem] = params.as_slice() else {
                return None;
            };
            Some(TypeSpec::Vector(parse_element(elem)?))
        }
        TUPLE_TAG => {
            if params.is_empty() {
                return None;
            }
            params
                .iter()
                .map(|p| parse_normalized(p))
                .collect::<Option<Vec<_>>>()
                .map(TypeSpec::Tuple)
        }
        _ => None,
    }
}

fn parse_element(s: &str) -> Option<ScalarKind> {
    ScalarKind::from_keyword(s).filter(|kind| kind.is_numeric())
}

/// `10`, `10u`, `10UL` are literals. Anything else the server wrote
/// (`WFM_SIZE`, `2*WFM_SIZE`, `mem::adc_range/sizeof(uint32_t)`) is kept
/// verbatim as a named length, as is a literal too large for `usize`.
fn parse_len(s: &str) -> Option<ArrayLen> {
    if s.is_empty() {
        return None;
    }
    let digits = s.trim_end_matches(['u', 'U', 'l', 'L']);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = digits.parse() {
            return Some(ArrayLen::Literal(n));
        }
    }
    Some(ArrayLen::Named(s.to_string()))
}

/// Split on commas that are not nested inside another `<...>`.
fn split_top_level(inner: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}
