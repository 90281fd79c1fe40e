use core::fmt;
use nom::error::{ErrorKind, FromExternalError, ParseError};
use thiserror::Error;

/// The reference table a back-reference points into
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RefTable {
    /// The complex-value table
    Object,
    /// The string table
    String,
    /// The trait table
    Trait,
}

impl fmt::Display for RefTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTable::Object => f.write_str("object"),
            RefTable::String => f.write_str("string"),
            RefTable::Trait => f.write_str("trait"),
        }
    }
}

/// Enum for representing decoding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error<'a> {
    /// The input ended inside a value
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A type marker outside the per-version marker set
    #[error("unknown type marker {0:#04x}")]
    UnknownMarker(u8),

    /// String bytes that are not valid UTF-8
    #[error("string is not valid utf-8")]
    InvalidUtf8,

    /// A back-reference past the end of a reference table
    #[error("reference {1} is out of range for the {0} table")]
    ReferenceOutOfRange(RefTable, usize),

    /// A decoded trait names a class that is not registered
    #[error("type alias {0:?} is not registered")]
    UnknownTypeAlias(String),

    /// A member failed to bind against its contract
    #[error("contract violation on {field:?}: {reason}")]
    ContractViolation {
        /// The member that failed to bind
        field: String,
        /// Why binding failed
        reason: String,
    },

    /// A feature of the format this library does not implement
    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    /// Value nesting deeper than the configured maximum
    #[error("recursion depth limit exceeded")]
    DepthExceeded,

    /// An explicit payload length that disagrees with the bytes consumed
    #[error("declared payload length {declared} does not match {consumed} bytes consumed")]
    LengthMismatch {
        /// The length carried on the wire
        declared: u32,
        /// The bytes the payload actually occupied
        consumed: u32,
    },

    /// A nom internal error
    #[error("nom internal error")]
    Nom(&'a [u8], ErrorKind),
}

impl<'a> ParseError<&'a [u8]> for Error<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        // Complete-mode parsers signal truncation as ErrorKind::Eof
        if kind == ErrorKind::Eof {
            Error::UnexpectedEof
        } else {
            Error::Nom(input, kind)
        }
    }

    fn append(_: &[u8], _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a [u8], E> for Error<'a> {
    fn from_external_error(input: &'a [u8], kind: ErrorKind, _e: E) -> Self {
        Error::Nom(input, kind)
    }
}

/// Enum for representing encoding errors
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The underlying sink failed
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    /// Asked to serialize a record type that is not registered
    #[error("type {0} is not registered")]
    UnregisteredType(String),

    /// A member failed to project against its contract
    #[error("contract violation on {field:?}: {reason}")]
    ContractViolation {
        /// The member that failed to project
        field: String,
        /// Why projection failed
        reason: String,
    },

    /// A length, count or index too large for a u29
    #[error("value does not fit in a u29")]
    MalformedU29,

    /// A feature of the format this library does not implement
    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    /// A `Value::Reference` pointing past the end of the session's object table
    #[error("reference {1} is out of range for the {0} table")]
    ReferenceOutOfRange(RefTable, usize),

    /// A packet field that does not fit its length prefix
    #[error("packet field too large")]
    PacketTooLarge,
}

/// Enum for representing registry construction errors
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SchemaError {
    /// Two registered types share an alias
    #[error("alias {0:?} is already registered")]
    DuplicateAlias(String),

    /// The same type was registered twice
    #[error("type {0} is already registered")]
    DuplicateType(&'static str),
}
