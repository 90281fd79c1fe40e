//! The public codec surface

use crate::amf0::read::AMF0Decoder;
use crate::amf0::write::AMF0Encoder;
use crate::amf3::read::{AMF3Decoder, DEFAULT_MAX_DEPTH};
use crate::amf3::write::AMF3Encoder;
use crate::contract::{binder, AmfContract, Registry};
use crate::errors::{EncodeError, Error};
use crate::packet::Packet;
use crate::types::{AMFVersion, Value};
use nom::Err;
use std::io::Write;
use std::rc::Rc;

/// Options governing one codec instance
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// The AMF version this endpoint speaks
    pub version: AMFVersion,

    /// Whether the AvmPlus marker may switch an AMF0 payload into AMF3
    pub allow_version_switch: bool,

    /// The bound on value nesting while decoding
    pub max_depth: u32,

    /// Whether packets carry true payload lengths instead of the
    /// unknown-length sentinel
    pub exact_lengths: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            version: AMFVersion::AMF3,
            allow_version_switch: true,
            max_depth: DEFAULT_MAX_DEPTH,
            exact_lengths: false,
        }
    }
}

/// A reusable AMF codec: a schema registry plus options
///
/// Every encode or decode call allocates its session state fresh, so a codec
/// may be shared freely; the registry is immutable once the codec is built
pub struct Codec {
    registry: Registry,
    options: CodecOptions,
}

impl Codec {
    /// Create a codec over the given registry
    pub fn new(registry: Registry, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    /// The registry this codec validates aliases against
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The options this codec was built with
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Whether the given bytes open an AMF packet envelope
    ///
    /// Peeks without consuming; used by framed transports
    pub fn is_start_marker(i: &[u8]) -> bool {
        crate::packet::read::is_packet_start(i)
    }

    /// Decode a single payload, which must span the whole input
    pub fn decode_value<'a>(&self, i: &'a [u8]) -> Result<Rc<Value>, Err<Error<'a>>> {
        let (rest, value) = match self.options.version {
            AMFVersion::AMF0 => AMF0Decoder::new(
                Some(&self.registry),
                self.options.max_depth,
                self.options.allow_version_switch,
            )
            .parse_single_element(i)?,
            AMFVersion::AMF3 => AMF3Decoder::new(Some(&self.registry), self.options.max_depth)
                .parse_single_element(i)?,
        };

        if !rest.is_empty() {
            return Err(Err::Error(Error::LengthMismatch {
                declared: i.len() as u32,
                consumed: (i.len() - rest.len()) as u32,
            }));
        }
        Ok(value)
    }

    /// Encode a single payload into the given sink
    ///
    /// The sink must be discarded if this returns an error
    pub fn encode_value<W: Write>(&self, value: &Rc<Value>, writer: &mut W) -> Result<(), EncodeError> {
        match self.options.version {
            AMFVersion::AMF0 => AMF0Encoder::new(Some(&self.registry)).write_payload(
                writer,
                value,
                false,
                self.options.allow_version_switch,
            ),
            AMFVersion::AMF3 => {
                AMF3Encoder::new(Some(&self.registry)).write_value_element(writer, value)
            }
        }
    }

    /// Decode a packet envelope, which must span the whole input
    pub fn decode_packet<'a>(&self, i: &'a [u8]) -> Result<Packet, Err<Error<'a>>> {
        crate::packet::read::parse_with(i, Some(&self.registry), &self.options)
    }

    /// Encode a packet envelope
    pub fn encode_packet(&self, packet: &Packet) -> Result<Vec<u8>, EncodeError> {
        crate::packet::write::write_to_bytes_with(
            packet,
            self.options.exact_lengths,
            Some(&self.registry),
            &self.options,
        )
    }

    /// Decode a payload and bind it to a registered record type
    pub fn decode_record<'a, T: AmfContract>(&self, i: &'a [u8]) -> Result<T, Err<Error<'a>>> {
        let value = self.decode_value(i)?;
        binder::bind(&value, &self.registry).map_err(Err::Error)
    }

    /// Project a registered record and encode it into the given sink
    pub fn encode_record<T: AmfContract, W: Write>(
        &self,
        value: &T,
        writer: &mut W,
    ) -> Result<(), EncodeError> {
        let projected = binder::project(value, &self.registry)?;
        self.encode_value(&projected, writer)
    }
}
