use super::{ClassDefinition, Element};
use std::rc::Rc;

/// A single or compound AMF value
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Represents the number type (amf0) and the double type (amf3)
    Number(f64),

    /// Represents the boolean type (amf0) and both the true/false types (amf3)
    Bool(bool),

    /// Represents both the string (amf0/amf3) and long string type (amf0)
    String(String),

    /// Represents the object type in both amf0 and amf3
    ///
    /// A class definition is always present for amf3 decoded objects, amf0
    /// only produces one for typed objects
    Object(Vec<Element>, Option<ClassDefinition>),

    /// Represents the null type
    Null,

    /// Represents the undefined type
    Undefined,

    /// Represents ECMA-arrays (amf0) and associative arrays (amf3)
    ///
    /// Format is (dense values, associative elements, length); the length is
    /// the amf0 wire count and can differ from the number of elements
    ECMAArray(Vec<Rc<Value>>, Vec<Element>, u32),

    /// Represents a strict array (amf0) or a dense array (amf3)
    StrictArray(Vec<Rc<Value>>),

    /// Represents a date as milliseconds since the unix epoch, always UTC
    Date(f64),

    /// Represents the XML types, (content, legacy)
    ///
    /// Legacy selects the XML-document marker (amf0 0x0F / amf3 0x07) over
    /// the amf3 0x0B form
    XML(String, bool),

    /// Represents the integer type (u29) (amf3)
    Integer(i32),

    /// Represents the byte array type (amf3)
    ByteArray(Vec<u8>),

    /// A back-reference to the complex value at the given object-table index
    ///
    /// Produced when decoding a reference to a value that is still being
    /// decoded (a cycle); completed targets are shared directly instead
    Reference(u32),
}

impl FromIterator<Value> for Vec<Rc<Value>> {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        iter.into_iter().map(Rc::new).collect()
    }
}
