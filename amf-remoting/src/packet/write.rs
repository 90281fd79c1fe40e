//! Handles writing of AMF packets

use crate::amf0::write::AMF0Encoder;
use crate::amf3::write::AMF3Encoder;
use crate::codec::CodecOptions;
use crate::contract::Registry;
use crate::errors::EncodeError;
use crate::packet::{Header, Message, Packet};
use crate::types::{AMFVersion, Value};
use std::rc::Rc;

/// Encode one payload with a fresh codec session
///
/// Each header and each message starts with a clean reference space
fn write_payload(
    value: &Rc<Value>,
    version: AMFVersion,
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    match version {
        AMFVersion::AMF0 => AMF0Encoder::new(registry).write_payload(
            &mut out,
            value,
            options.version == AMFVersion::AMF3,
            options.allow_version_switch,
        )?,
        AMFVersion::AMF3 => AMF3Encoder::new(registry).write_value_element(&mut out, value)?,
    }
    Ok(out)
}

fn write_payload_length(out: &mut Vec<u8>, payload: &[u8], exact_lengths: bool) -> Result<(), EncodeError> {
    if exact_lengths {
        let length = u32::try_from(payload.len()).map_err(|_| EncodeError::PacketTooLarge)?;
        out.extend(length.to_be_bytes());
    } else {
        out.extend(u32::MAX.to_be_bytes());
    }
    Ok(())
}

fn write_header(
    header: &Header,
    out: &mut Vec<u8>,
    registry: Option<&Registry>,
    options: &CodecOptions,
    version: AMFVersion,
    exact_lengths: bool,
) -> Result<(), EncodeError> {
    // Name
    let name_length = u16::try_from(header.name.len()).map_err(|_| EncodeError::PacketTooLarge)?;
    out.extend(name_length.to_be_bytes());
    out.extend(header.name.as_bytes());

    // Must understand
    out.push(u8::from(header.must_understand));

    // Value
    let mut value = write_payload(&header.value, version, registry, options)?;
    write_payload_length(out, &value, exact_lengths)?;
    out.append(&mut value);

    Ok(())
}

fn write_message(
    message: &Message,
    out: &mut Vec<u8>,
    registry: Option<&Registry>,
    options: &CodecOptions,
    version: AMFVersion,
    exact_lengths: bool,
) -> Result<(), EncodeError> {
    // Target URI
    let target_length =
        u16::try_from(message.target_uri.len()).map_err(|_| EncodeError::PacketTooLarge)?;
    out.extend(target_length.to_be_bytes());
    out.extend(message.target_uri.as_bytes());

    // Response URI
    let response_length =
        u16::try_from(message.response_uri.len()).map_err(|_| EncodeError::PacketTooLarge)?;
    out.extend(response_length.to_be_bytes());
    out.extend(message.response_uri.as_bytes());

    // Contents
    let mut contents = write_payload(&message.contents, version, registry, options)?;
    write_payload_length(out, &contents, exact_lengths)?;
    out.append(&mut contents);

    Ok(())
}

pub(crate) fn write_to_bytes_with(
    packet: &Packet,
    exact_lengths: bool,
    registry: Option<&Registry>,
    options: &CodecOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = vec![];

    // Version
    buffer.push(0);
    match packet.version {
        AMFVersion::AMF0 => buffer.push(0),
        AMFVersion::AMF3 => buffer.push(3),
    }

    // Headers
    let header_count =
        u16::try_from(packet.headers.len()).map_err(|_| EncodeError::PacketTooLarge)?;
    buffer.extend(header_count.to_be_bytes());
    for header in &packet.headers {
        write_header(
            header,
            &mut buffer,
            registry,
            options,
            packet.version,
            exact_lengths,
        )?;
    }

    // Messages
    let message_count =
        u16::try_from(packet.messages.len()).map_err(|_| EncodeError::PacketTooLarge)?;
    buffer.extend(message_count.to_be_bytes());
    for message in &packet.messages {
        write_message(
            message,
            &mut buffer,
            registry,
            options,
            packet.version,
            exact_lengths,
        )?;
    }

    Ok(buffer)
}

/// Write a packet to a vec of bytes
///
/// With `exact_lengths` the true payload lengths are written, otherwise the
/// unknown-length sentinel is used. Trait aliases are not validated; attach a
/// registry through [`crate::Codec`] for that
pub fn write_to_bytes(packet: &Packet, exact_lengths: bool) -> Result<Vec<u8>, EncodeError> {
    let options = CodecOptions {
        version: packet.version,
        ..CodecOptions::default()
    };
    write_to_bytes_with(packet, exact_lengths, None, &options)
}
