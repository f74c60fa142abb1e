//! Resolved PDF object types.
//!
//! These are the values the object resolver hands out: primitives, composites
//! and stream objects whose bytes are kept undecoded. Nested indirect
//! references stay as [`Object::Reference`] values and are only followed by an
//! explicit call to the resolver, so the data model is acyclic.

use bytes::Bytes;
use indexmap::IndexMap;

/// Dictionary of resolved objects. Keys are unique; a repeated key overwrites.
pub type Dictionary = IndexMap<String, Object>;

/// Identity of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectId {
    /// Create a new object identity.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// Build an identity from parsed integers, rejecting values out of range.
    pub fn from_numbers(number: i64, generation: i64) -> Option<Self> {
        let number = u32::try_from(number).ok()?;
        let generation = u16::try_from(generation).ok()?;
        Some(Self::new(number, generation))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A stream object: its dictionary plus the raw, undecoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamObject {
    /// Stream dictionary
    pub dict: Dictionary,
    /// Offset of the first data byte in the source
    pub data_offset: u64,
    /// Raw data between `stream` and `endstream`
    pub data: Bytes,
}

impl StreamObject {
    /// Filter names in application order (`/Filter` may be a name or an array).
    pub fn filter_names(&self) -> Vec<String> {
        match self.dict.get("Filter") {
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|o| o.as_name().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + raw data)
    Stream(StreamObject),
    /// Indirect object reference
    Reference(ObjectId),
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to a number; integers widen to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&StreamObject> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is a null object.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}
