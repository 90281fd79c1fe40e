use crate::amf0;
use crate::amf0::read::AMF0Decoder;
use crate::amf3::read::AMF3Decoder;
use crate::codec::CodecOptions;
use crate::contract::Registry;
use crate::errors::Error;
use crate::nom_utils::AMFResult;
use crate::packet::{Header, Message, Packet};
use crate::types::{AMFVersion, Value};
use nom::multi::length_count;
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::Err;
use std::rc::Rc;

/// Whether the given bytes open an AMF packet envelope
///
/// Peeks at the version word without consuming anything; used by framed
/// transports to decide whether a packet starts here
pub fn is_packet_start(i: &[u8]) -> bool {
    matches!(i, [0x00, 0x00 | 0x03, ..])
}

/// Decode one payload with a fresh codec session
///
/// Each header and each message starts with a clean reference space
fn parse_payload<'a>(
    i: &'a [u8],
    version: AMFVersion,
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> AMFResult<'a, Rc<Value>> {
    match version {
        AMFVersion::AMF0 => {
            AMF0Decoder::new(registry, options.max_depth, options.allow_version_switch)
                .parse_single_element(i)
        }
        AMFVersion::AMF3 => AMF3Decoder::new(registry, options.max_depth).parse_single_element(i),
    }
}

/// Check an explicit payload length against the bytes a payload consumed
fn check_length<'a>(declared: u32, before: usize, after: usize) -> Result<(), Err<Error<'a>>> {
    if declared == u32::MAX {
        return Ok(());
    }
    let consumed = (before - after) as u32;
    if consumed != declared {
        return Err(Err::Error(Error::LengthMismatch { declared, consumed }));
    }
    Ok(())
}

fn parse_header<'a>(
    i: &'a [u8],
    version: AMFVersion,
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> AMFResult<'a, Header> {
    let (i, name) = amf0::read::parse_string(i)?;
    let (i, must_understand) = be_u8(i)?;
    let (i, declared) = be_u32(i)?;

    let before = i.len();
    let (i, value) = parse_payload(i, version, registry, options)?;
    check_length(declared, before, i.len())?;

    Ok((
        i,
        Header {
            name: name.to_string(),
            must_understand: must_understand != 0,
            value,
        },
    ))
}

fn parse_message<'a>(
    i: &'a [u8],
    version: AMFVersion,
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> AMFResult<'a, Message> {
    let (i, target_uri) = amf0::read::parse_string(i)?;
    let (i, response_uri) = amf0::read::parse_string(i)?;
    let (i, declared) = be_u32(i)?;

    let before = i.len();
    let (i, contents) = parse_payload(i, version, registry, options)?;
    check_length(declared, before, i.len())?;

    Ok((
        i,
        Message {
            target_uri: target_uri.to_string(),
            response_uri: response_uri.to_string(),
            contents,
        },
    ))
}

pub(crate) fn parse_incomplete_with<'a>(
    i: &'a [u8],
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> AMFResult<'a, Packet> {
    let (i, version) = be_u16(i)?;
    let version = match version {
        0 => AMFVersion::AMF0,
        3 => AMFVersion::AMF3,
        _ => return Err(Err::Error(Error::Unsupported("packet version"))),
    };

    let (i, headers) = length_count(be_u16, |i| parse_header(i, version, registry, options))(i)?;
    let (i, messages) = length_count(be_u16, |i| parse_message(i, version, registry, options))(i)?;

    Ok((
        i,
        Packet {
            version,
            headers,
            messages,
        },
    ))
}

pub(crate) fn parse_with<'a>(
    i: &'a [u8],
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> Result<Packet, Err<Error<'a>>> {
    let (rest, packet) = parse_incomplete_with(i, registry, options)?;
    if !rest.is_empty() {
        return Err(Err::Error(Error::LengthMismatch {
            declared: i.len() as u32,
            consumed: (i.len() - rest.len()) as u32,
        }));
    }
    Ok(packet)
}

/// Read a given buffer as a packet
///
/// Unlike [`parse`], this function will not error if the entire slice isn't
/// consumed and will return the data that was not parsed
pub fn parse_incomplete(i: &[u8]) -> AMFResult<'_, Packet> {
    parse_incomplete_with(i, None, &CodecOptions::default())
}

/// Read a given slice as a packet
///
/// This function will return an error if the slice could not be parsed or if
/// the entire slice was not consumed. Trait aliases are not validated; attach
/// a registry through [`crate::Codec`] for that
pub fn parse(i: &[u8]) -> Result<Packet, Err<Error<'_>>> {
    parse_with(i, None, &CodecOptions::default())
}
