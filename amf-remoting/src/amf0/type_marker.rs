use derive_try_from_primitive::TryFromPrimitive;

/// Type markers used in AMF0
#[derive(TryFromPrimitive, Eq, PartialEq, Debug, Copy, Clone)]
#[repr(u8)]
pub(crate) enum TypeMarker {
    /// Number
    Number = 0x00,

    /// Boolean
    Boolean = 0x01,

    /// String
    String = 0x02,

    /// Object start
    Object = 0x03,

    /// Null
    Null = 0x05,

    /// Undefined
    Undefined = 0x06,

    /// Reference into the object table
    Reference = 0x07,

    /// Start of an ECMA array
    EcmaArray = 0x08,

    /// Object end
    ObjectEnd = 0x09,

    /// Strict array start
    StrictArray = 0x0A,

    /// Date with timezone
    Date = 0x0B,

    /// Long string (length > 65535)
    LongString = 0x0C,

    /// XML document
    XmlDocument = 0x0F,

    /// Typed object start
    TypedObject = 0x10,

    /// Embedded AMF3 value
    AvmPlus = 0x11,
}
