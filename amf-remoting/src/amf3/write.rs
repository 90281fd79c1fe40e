//! Support for encoding AMF3

use crate::amf3::length::Length;
use crate::amf3::type_marker::TypeMarker;
use crate::contract::Registry;
use crate::element_cache::{ObjectCache, StringCache};
use crate::errors::{EncodeError, RefTable};
use crate::types::{Attribute, ClassDefinition, Element, Value};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;
use std::rc::Rc;

/// The range representable by a signed 29-bit integer; values outside it
/// are promoted to doubles
pub(crate) const MIN_INT: i32 = -0x1000_0000;
pub(crate) const MAX_INT: i32 = 0x0FFF_FFFF;

#[allow(clippy::unusual_byte_groupings)]
pub(crate) fn write_int<W: Write>(writer: &mut W, i: i32) -> Result<(), EncodeError> {
    let n = if i < 0 {
        i + 0b001_0000000_0000000_0000000_00000000
    } else {
        i
    };

    if n > 0x1fffff {
        writer.write_u8(((n >> (7 * 3 + 1)) | 0b10000000) as u8)?;
        writer.write_u8(((n >> (7 * 2 + 1)) | 0b10000000) as u8)?;
        writer.write_u8(((n >> (7 + 1)) | 0b10000000) as u8)?;
        writer.write_u8((n & 0b11111111) as u8)?;
    } else if n > 0x3fff {
        writer.write_u8(((n >> (7 * 2)) | 0b10000000) as u8)?;
        writer.write_u8(((n >> 7) | 0b10000000) as u8)?;
        writer.write_u8((n & 0b01111111) as u8)?;
    } else if n > 0x7f {
        writer.write_u8(((n >> 7) | 0b10000000) as u8)?;
        writer.write_u8((n & 0b01111111) as u8)?;
    } else {
        writer.write_u8((n & 0b01111111) as u8)?;
    }

    Ok(())
}

/// Handles encoding AMF3
///
/// An encoder is one session: its reference tables live for a single payload
/// and it must not be reused across payloads
pub struct AMF3Encoder<'r> {
    /// The table used to cache repeated byte strings
    string_reference_table: StringCache,

    /// The table used to cache repeated trait definitions
    trait_reference_table: Vec<ClassDefinition>,

    /// The table used to cache repeated complex values
    object_reference_table: ObjectCache,

    /// Known aliases; encoding a typed object with an unknown alias is an error
    registry: Option<&'r Registry>,
}

impl Default for AMF3Encoder<'_> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<'r> AMF3Encoder<'r> {
    /// Create an encoder session with the given alias registry
    pub fn new(registry: Option<&'r Registry>) -> Self {
        Self {
            string_reference_table: StringCache::default(),
            trait_reference_table: Vec::new(),
            object_reference_table: ObjectCache::default(),
            registry,
        }
    }

    fn write_type_marker<W: Write>(&self, writer: &mut W, s: TypeMarker) -> Result<(), EncodeError> {
        writer.write_u8(s as u8)?;
        Ok(())
    }

    fn write_byte_string<W: Write>(&mut self, writer: &mut W, s: &[u8]) -> Result<(), EncodeError> {
        // The empty string is always inline and never interned
        if s.is_empty() {
            return Length::Size(0).write(writer);
        }

        if let Some(index) = self.string_reference_table.find(s) {
            Length::Reference(index).write(writer)
        } else {
            self.string_reference_table.store(s);
            Length::Size(s.len() as u32).write(writer)?;
            writer.write_all(s)?;
            Ok(())
        }
    }

    fn write_string<W: Write>(&mut self, writer: &mut W, s: &str) -> Result<(), EncodeError> {
        self.write_byte_string(writer, s.as_bytes())
    }

    fn write_number_element<W: Write>(&self, writer: &mut W, n: f64) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Number)?;
        writer.write_f64::<BigEndian>(n)?;
        Ok(())
    }

    fn write_boolean_element<W: Write>(&self, writer: &mut W, b: bool) -> Result<(), EncodeError> {
        if b {
            self.write_type_marker(writer, TypeMarker::True)
        } else {
            self.write_type_marker(writer, TypeMarker::False)
        }
    }

    fn write_string_element<W: Write>(&mut self, writer: &mut W, s: &str) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::String)?;
        self.write_byte_string(writer, s.as_bytes())
    }

    fn write_integer_element<W: Write>(&self, writer: &mut W, i: i32) -> Result<(), EncodeError> {
        if (MIN_INT..=MAX_INT).contains(&i) {
            self.write_type_marker(writer, TypeMarker::Integer)?;
            write_int(writer, i)
        } else {
            // Out of u29 range, promote to a double
            self.write_number_element(writer, i as f64)
        }
    }

    fn write_date_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        time: f64,
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Date)?;

        let len = self.object_reference_table.to_length_store(value, 0);
        len.write(writer)?;
        if len.is_size() {
            writer.write_f64::<BigEndian>(time)?;
        }
        Ok(())
    }

    fn write_byte_array_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        bytes: &[u8],
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::ByteArray)?;

        let len = self
            .object_reference_table
            .to_length_store(value, bytes.len() as u32);
        len.write(writer)?;
        if len.is_size() {
            writer.write_all(bytes)?;
        }
        Ok(())
    }

    fn write_xml_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        content: &str,
        legacy: bool,
    ) -> Result<(), EncodeError> {
        if legacy {
            self.write_type_marker(writer, TypeMarker::XmlDoc)?;
        } else {
            self.write_type_marker(writer, TypeMarker::Xml)?;
        }

        let len = self
            .object_reference_table
            .to_length_store(value, content.len() as u32);
        len.write(writer)?;
        if len.is_size() {
            writer.write_all(content.as_bytes())?;
        }
        Ok(())
    }

    fn write_strict_array_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        children: &[Rc<Value>],
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Array)?;

        let len = self
            .object_reference_table
            .to_length_store(value, children.len() as u32);
        len.write(writer)?;
        if len.is_size() {
            // Empty associative portion
            self.write_byte_string(writer, &[])?;
            for child in children {
                self.write_value_element(writer, child)?;
            }
        }
        Ok(())
    }

    fn write_ecma_array_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        dense: &[Rc<Value>],
        assoc: &[Element],
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Array)?;

        let len = self
            .object_reference_table
            .to_length_store(value, dense.len() as u32);
        len.write(writer)?;
        if len.is_size() {
            for element in assoc {
                self.write_byte_string(writer, element.name.as_bytes())?;
                self.write_value_element(writer, &element.value)?;
            }
            self.write_byte_string(writer, &[])?;
            for child in dense {
                self.write_value_element(writer, child)?;
            }
        }
        Ok(())
    }

    fn write_class_definition<W: Write>(
        &mut self,
        writer: &mut W,
        class_def: &ClassDefinition,
    ) -> Result<(), EncodeError> {
        self.write_byte_string(writer, class_def.name.as_bytes())?;
        for prop in &class_def.static_properties {
            self.write_string(writer, prop)?;
        }
        Ok(())
    }

    fn write_sealed_values<W: Write>(
        &mut self,
        writer: &mut W,
        children: &[Element],
        def: &ClassDefinition,
    ) -> Result<(), EncodeError> {
        for name in &def.static_properties {
            let element = children
                .iter()
                .find(|e| &e.name == name)
                .ok_or_else(|| EncodeError::ContractViolation {
                    field: name.clone(),
                    reason: "sealed member missing from object".to_string(),
                })?;
            self.write_value_element(writer, &element.value)?;
        }
        Ok(())
    }

    fn write_dynamic_values<W: Write>(
        &mut self,
        writer: &mut W,
        children: &[Element],
        def: &ClassDefinition,
    ) -> Result<(), EncodeError> {
        for element in children {
            if !def.static_properties.contains(&element.name) {
                self.write_byte_string(writer, element.name.as_bytes())?;
                self.write_value_element(writer, &element.value)?;
            }
        }
        self.write_byte_string(writer, &[])
    }

    fn write_object_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
        children: &[Element],
        class_def: &Option<ClassDefinition>,
    ) -> Result<(), EncodeError> {
        self.write_type_marker(writer, TypeMarker::Object)?;

        if let Some(index) = self.object_reference_table.find(value) {
            return write_int(writer, (index << 1) as i32);
        }
        self.object_reference_table.store(value);

        let def = class_def.clone().unwrap_or_default();

        if def.attributes.contains(Attribute::External) {
            return Err(EncodeError::Unsupported("externalizable traits"));
        }

        if let Some(registry) = self.registry {
            if !def.name.is_empty() && !registry.contains_alias(&def.name) {
                return Err(EncodeError::UnregisteredType(def.name));
            }
        }

        let existing_trait = self.trait_reference_table.iter().position(|cd| *cd == def);

        match existing_trait {
            Some(index) => {
                if index > (MAX_INT >> 2) as usize {
                    return Err(EncodeError::MalformedU29);
                }
                // Inline object, trait by reference
                write_int(writer, ((index << 2) | 0b01) as i32)?;
            }
            None => {
                let count = def.static_properties.len();
                if count > (MAX_INT >> 4) as usize {
                    return Err(EncodeError::MalformedU29);
                }

                let mut header = ((count as u32) << 4) | 0b0011;
                if def.attributes.contains(Attribute::Dynamic) {
                    header |= 0b1000;
                }

                self.trait_reference_table.push(def.clone());
                write_int(writer, header as i32)?;
                self.write_class_definition(writer, &def)?;
            }
        }

        self.write_sealed_values(writer, children, &def)?;
        if def.attributes.contains(Attribute::Dynamic) {
            self.write_dynamic_values(writer, children, &def)?;
        }

        Ok(())
    }

    fn write_reference_element<W: Write>(
        &mut self,
        writer: &mut W,
        index: u32,
    ) -> Result<(), EncodeError> {
        let index = index as usize;
        let target = self
            .object_reference_table
            .get(index)
            .ok_or(EncodeError::ReferenceOutOfRange(RefTable::Object, index))?;

        // The reference takes the marker of the value it points back to
        let marker = match **target {
            Value::Object(..) => TypeMarker::Object,
            Value::StrictArray(_) | Value::ECMAArray(..) => TypeMarker::Array,
            Value::Date(_) => TypeMarker::Date,
            Value::ByteArray(_) => TypeMarker::ByteArray,
            Value::XML(_, true) => TypeMarker::XmlDoc,
            Value::XML(_, false) => TypeMarker::Xml,
            _ => return Err(EncodeError::Unsupported("reference to a non-complex value")),
        };

        self.write_type_marker(writer, marker)?;
        write_int(writer, (index << 1) as i32)
    }

    /// Write a single AMF3 value
    pub fn write_value_element<W: Write>(
        &mut self,
        writer: &mut W,
        value: &Rc<Value>,
    ) -> Result<(), EncodeError> {
        match &**value {
            Value::Number(n) => self.write_number_element(writer, *n),
            Value::Bool(b) => self.write_boolean_element(writer, *b),
            Value::String(s) => self.write_string_element(writer, s),
            Value::Object(children, class_def) => {
                self.write_object_element(writer, value, children, class_def)
            }
            Value::Null => self.write_type_marker(writer, TypeMarker::Null),
            Value::Undefined => self.write_type_marker(writer, TypeMarker::Undefined),
            Value::ECMAArray(dense, assoc, _) => {
                self.write_ecma_array_element(writer, value, dense, assoc)
            }
            Value::StrictArray(children) => {
                self.write_strict_array_element(writer, value, children)
            }
            Value::Date(time) => self.write_date_element(writer, value, *time),
            Value::XML(content, legacy) => self.write_xml_element(writer, value, content, *legacy),
            Value::Integer(i) => self.write_integer_element(writer, *i),
            Value::ByteArray(bytes) => self.write_byte_array_element(writer, value, bytes),
            Value::Reference(index) => self.write_reference_element(writer, *index),
        }
    }
}

#[cfg(test)]
mod write_number_tests {
    use super::write_int;

    #[test]
    fn test_write_1byte_number() {
        let mut v = vec![];
        write_int(&mut v, 0b00101011).unwrap();
        assert_eq!(v, &[0b00101011]);
    }

    #[test]
    fn test_write_4byte_number() {
        let mut v = vec![];
        write_int(&mut v, 2097280).unwrap();
        assert_eq!(v, &[0b10000000, 0b11000000, 0b10000000, 0b10000000]);
    }

    #[test]
    fn write_neg_number() {
        let mut v = vec![];
        write_int(&mut v, -268435455).unwrap();
        assert_eq!(v, &[192, 128, 128, 1]);
    }
}
