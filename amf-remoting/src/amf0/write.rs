//! Support for encoding AMF0

use crate::amf0::type_marker::TypeMarker;
use crate::amf3::AMF3Encoder;
use crate::contract::Registry;
use crate::element_cache::ObjectCache;
use crate::errors::{EncodeError, RefTable};
use crate::types::{Element, Value};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;
use std::rc::Rc;

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<(), EncodeError> {
    if s.len() > u16::MAX as usize {
        return Err(EncodeError::PacketTooLarge);
    }
    writer.write_u16::<BigEndian>(s.len() as u16)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn write_long_string_content<W: Write>(writer: &mut W, s: &str) -> Result<(), EncodeError> {
    writer.write_u32::<BigEndian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// Whether a value only exists in AMF3 and needs the version switch
fn needs_avm_plus(value: &Value) -> bool {
    matches!(value, Value::ByteArray(_) | Value::XML(_, false))
}

/// Handles encoding AMF0
///
/// An encoder is one session: its object table lives for a single payload
/// and it must not be reused across payloads
pub struct AMF0Encoder<'r> {
    /// The table used to cache repeated complex values
    object_reference_table: ObjectCache,

    /// Known aliases; encoding a typed object with an unknown alias is an error
    registry: Option<&'r Registry>,
}

impl Default for AMF0Encoder<'_> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<'r> AMF0Encoder<'r> {
    /// Create an encoder session with the given alias registry
    pub fn new(registry: Option<&'r Registry>) -> Self {
        Self {
            object_reference_table: ObjectCache::default(),
            registry,
        }
    }

    fn write_type_marker<W: Write>(&self, writer: &mut W, type_: TypeMarker) -> Result<(), EncodeError> {
        writer.write_u8(type_ as u8)?;
        Ok(())
    }

    fn write_reference<W: Write>(&self, writer: &mut W, index: usize) -> Result<(), EncodeError> {
        if index > u16::MAX as usize {
            return Err(EncodeError::Unsupported(
                "more than 65535 complex values in an amf0 payload",
            ));
        }
        self.write_type_marker(writer, TypeMarker::Reference)?;
        writer.write_u16::<BigEndian>(index as u16)?;
        Ok(())
    }

    fn write_number_element<W: Write>(&self, writer: &mut W, n: f64) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Number)?;
        writer.write_f64::<BigEndian>(n)?;
        Ok(())
    }

    fn write_bool_element<W: Write>(&self, writer: &mut W, b: bool) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Boolean)?;
        writer.write_u8(u8::from(b))?;
        Ok(())
    }

    fn write_string_element<W: Write>(&self, writer: &mut W, s: &str) -> Result<(), EncodeError> {
        if s.len() > u16::MAX as usize {
            self.write_type_marker(writer, TypeMarker::LongString)?;
            write_long_string_content(writer, s)
        } else {
            self.write_type_marker(writer, TypeMarker::String)?;
            write_string(writer, s)
        }
    }

    fn write_object_end<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u16::<BigEndian>(0)?;
        self.write_type_marker(writer, TypeMarker::ObjectEnd)
    }

    fn write_element<W: Write>(&mut self, writer: &mut W, element: &Element) -> Result<(), EncodeError> {
        write_string(writer, &element.name)?;
        self.write_value(writer, &element.value)
    }

    fn write_object_element<W: Write>(
        &mut self,
        writer: &mut W,
        elements: &[Element],
        name: Option<&str>,
    ) -> Result<(), EncodeError> {
        match name {
            Some(name) => {
                if let Some(registry) = self.registry {
                    if !registry.contains_alias(name) {
                        return Err(EncodeError::UnregisteredType(name.to_string()));
                    }
                }
                self.write_type_marker(writer, TypeMarker::TypedObject)?;
                write_string(writer, name)?;
            }
            None => self.write_type_marker(writer, TypeMarker::Object)?,
        }

        for element in elements {
            self.write_element(writer, element)?;
        }
        self.write_object_end(writer)
    }

    fn write_strict_array_element<W: Write>(
        &mut self,
        writer: &mut W,
        children: &[Rc<Value>],
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::StrictArray)?;
        writer.write_u32::<BigEndian>(children.len() as u32)?;
        for child in children {
            self.write_value(writer, child)?;
        }
        Ok(())
    }

    fn write_ecma_array_element<W: Write>(
        &mut self,
        writer: &mut W,
        dense: &[Rc<Value>],
        assoc: &[Element],
        length: u32,
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::EcmaArray)?;
        writer.write_u32::<BigEndian>(length)?;
        for (index, value) in dense.iter().enumerate() {
            write_string(writer, &index.to_string())?;
            self.write_value(writer, value)?;
        }
        for element in assoc {
            self.write_element(writer, element)?;
        }
        self.write_object_end(writer)
    }

    fn write_date_element<W: Write>(&self, writer: &mut W, time: f64) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Date)?;
        writer.write_f64::<BigEndian>(time)?;
        // The timezone field is always zero
        writer.write_i16::<BigEndian>(0)?;
        Ok(())
    }

    fn write_xml_element<W: Write>(&self, writer: &mut W, content: &str) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::XmlDocument)?;
        write_long_string_content(writer, content)
    }

    /// Write a single AMF0 value
    pub fn write_value<W: Write>(&mut self, writer: &mut W, value: &Rc<Value>) -> Result<(), EncodeError> {
        match &**value {
            Value::Number(n) => self.write_number_element(writer, *n),
            Value::Bool(b) => self.write_bool_element(writer, *b),
            Value::String(s) => self.write_string_element(writer, s),
            Value::Integer(i) => self.write_number_element(writer, *i as f64),
            Value::Null => self.write_type_marker(writer, TypeMarker::Null),
            Value::Undefined => self.write_type_marker(writer, TypeMarker::Undefined),
            Value::Object(elements, class_def) => {
                if let Some(index) = self.object_reference_table.find(value) {
                    return self.write_reference(writer, index);
                }
                self.object_reference_table.store(value);
                let name = class_def
                    .as_ref()
                    .filter(|def| !def.name.is_empty())
                    .map(|def| def.name.as_str());
                self.write_object_element(writer, elements, name)
            }
            Value::StrictArray(children) => {
                if let Some(index) = self.object_reference_table.find(value) {
                    return self.write_reference(writer, index);
                }
                self.object_reference_table.store(value);
                self.write_strict_array_element(writer, children)
            }
            Value::ECMAArray(dense, assoc, length) => {
                if let Some(index) = self.object_reference_table.find(value) {
                    return self.write_reference(writer, index);
                }
                self.object_reference_table.store(value);
                self.write_ecma_array_element(writer, dense, assoc, *length)
            }
            Value::Date(time) => {
                if let Some(index) = self.object_reference_table.find(value) {
                    return self.write_reference(writer, index);
                }
                self.object_reference_table.store(value);
                self.write_date_element(writer, *time)
            }
            Value::XML(content, true) => {
                if let Some(index) = self.object_reference_table.find(value) {
                    return self.write_reference(writer, index);
                }
                self.object_reference_table.store(value);
                self.write_xml_element(writer, content)
            }
            Value::Reference(index) => {
                let index = *index as usize;
                if self.object_reference_table.get(index).is_none() {
                    return Err(EncodeError::ReferenceOutOfRange(RefTable::Object, index));
                }
                self.write_reference(writer, index)
            }
            Value::ByteArray(_) | Value::XML(_, false) => Err(EncodeError::Unsupported(
                "amf3-only value inside an amf0 container",
            )),
        }
    }

    /// Write a payload root value
    ///
    /// Emits the AvmPlus marker and hands the value to a fresh AMF3 session
    /// when the endpoint speaks AMF3 or the value has no AMF0 form
    pub fn write_payload<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        prefer_amf3: bool,
        allow_version_switch: bool,
    ) -> Result<(), EncodeError> {
        if allow_version_switch && (prefer_amf3 || needs_avm_plus(value)) {
            self.write_type_marker(writer, TypeMarker::AvmPlus)?;
            // A fresh AMF3 session: its tables do not inherit this one's
            return AMF3Encoder::new(self.registry).write_value_element(writer, value);
        }
        if needs_avm_plus(value) {
            return Err(EncodeError::Unsupported(
                "amf3-only value without version switching",
            ));
        }
        self.write_value(writer, value)
    }
}
