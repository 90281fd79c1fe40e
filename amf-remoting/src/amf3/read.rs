//! Support for decoding AMF3

use crate::amf3::length::Length;
use crate::amf3::type_marker::TypeMarker;
use crate::contract::Registry;
use crate::errors::{Error, RefTable};
use crate::nom_utils::AMFResult;
use crate::types::{Attribute, ClassDefinition, Element, Value};
use enumset::EnumSet;
use nom::bytes::complete::take;
use nom::number::complete::{be_f64, be_u8};
use nom::Err;
use std::rc::Rc;

const REFERENCE_FLAG: u32 = 0x01;

/// The default bound on value nesting
pub const DEFAULT_MAX_DEPTH: u32 = 64;

#[allow(clippy::unusual_byte_groupings)]
pub(crate) fn read_int_signed(i: &[u8]) -> AMFResult<'_, i32> {
    // Read the first byte of the number
    let (mut i, num) = be_u8(i)?;
    let mut value = (num & 0b01111111) as i32;
    // Check if we have another byte
    if num & 0b10000000 == 0 {
        return Ok((i, value));
    }

    for _ in 0..2 {
        let (j, num) = be_u8(i)?;
        i = j;
        value = (value << 7) | ((num & 0b01111111) as i32);
        // Check if we have another byte
        if num & 0b10000000 == 0 {
            return Ok((i, value));
        }
    }
    // The fourth byte carries all 8 bits
    let (i, num) = be_u8(i)?;
    value = (value << 8) | (num as i32);

    // Negate if negative
    if value & 0b000_1000000_0000000_0000000_00000000 != 0 {
        value -= 0b001_0000000_0000000_0000000_00000000;
    }

    Ok((i, value))
}

#[allow(clippy::unusual_byte_groupings)]
pub(crate) fn read_int(i: &[u8]) -> AMFResult<'_, u32> {
    // Read the first byte of the number
    let (mut i, num) = be_u8(i)?;
    let mut value = (num & 0b01111111) as u32;
    // Check if we have another byte
    if num & 0b10000000 == 0 {
        return Ok((i, value));
    }

    for _ in 0..2 {
        let (j, num) = be_u8(i)?;
        i = j;
        value = (value << 7) | ((num & 0b01111111) as u32);
        // Check if we have another byte
        if num & 0b10000000 == 0 {
            return Ok((i, value));
        }
    }
    // The fourth byte carries all 8 bits
    let (i, num) = be_u8(i)?;
    value = (value << 8) | (num as u32);

    if value & 0b000_1000000_0000000_0000000_00000000 != 0 {
        value <<= 1;
        value += 1;
    }

    Ok((i, value))
}

fn read_length(i: &[u8]) -> AMFResult<'_, Length> {
    let (i, val) = read_int(i)?;
    Ok((
        i,
        match val & REFERENCE_FLAG == 0 {
            true => Length::Reference(val as usize >> 1),
            false => Length::Size(val >> 1),
        },
    ))
}

fn read_type_marker(i: &[u8]) -> AMFResult<'_, TypeMarker> {
    let (i, type_) = be_u8(i)?;
    TypeMarker::try_from(type_)
        .map(|m| (i, m))
        .map_err(|_| Err::Error(Error::UnknownMarker(type_)))
}

/// Handles decoding AMF3
///
/// A decoder is one session: its reference tables live for a single payload
/// and it must not be reused across payloads
pub struct AMF3Decoder<'r> {
    /// The table of byte strings read so far, indexed by string references
    pub string_reference_table: Vec<Vec<u8>>,

    /// The table of traits read so far, indexed by trait references
    pub trait_reference_table: Vec<ClassDefinition>,

    /// The table of complex values read so far, indexed by object references
    pub object_reference_table: Vec<Rc<Value>>,

    /// Known aliases; a decoded trait naming an unknown alias is an error
    registry: Option<&'r Registry>,

    max_depth: u32,
    depth: u32,
}

impl Default for AMF3Decoder<'_> {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_DEPTH)
    }
}

impl<'r> AMF3Decoder<'r> {
    /// Create a decoder session with the given alias registry and depth bound
    pub fn new(registry: Option<&'r Registry>, max_depth: u32) -> Self {
        Self {
            string_reference_table: Vec::new(),
            trait_reference_table: Vec::new(),
            object_reference_table: Vec::new(),
            registry,
            max_depth,
            depth: 0,
        }
    }

    fn parse_byte_stream<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Vec<u8>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Size(len) => {
                if len == 0 {
                    // The empty string is always inline and never interned
                    Ok((i, vec![]))
                } else {
                    let (i, bytes) = take(len)(i)?;
                    self.string_reference_table.push(bytes.to_vec());
                    Ok((i, bytes.to_vec()))
                }
            }
            Length::Reference(index) => {
                let bytes = self
                    .string_reference_table
                    .get(index)
                    .ok_or(Err::Error(Error::ReferenceOutOfRange(
                        RefTable::String,
                        index,
                    )))?
                    .clone();

                Ok((i, bytes))
            }
        }
    }

    fn parse_string<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, String> {
        let (i, bytes) = self.parse_byte_stream(i)?;
        let s = String::from_utf8(bytes).map_err(|_| Err::Error(Error::InvalidUtf8))?;
        Ok((i, s))
    }

    fn parse_element_string<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, s) = self.parse_string(i)?;
        Ok((i, Rc::new(Value::String(s))))
    }

    /// Resolve a back-reference into the object table
    ///
    /// A slot still holding its placeholder belongs to a value that is
    /// currently being decoded; hand out a symbolic `Reference` so the final
    /// patch remains the slot's only owner
    fn resolve_object_reference<'a>(&self, i: &'a [u8], index: usize) -> AMFResult<'a, Rc<Value>> {
        let slot = self
            .object_reference_table
            .get(index)
            .ok_or(Err::Error(Error::ReferenceOutOfRange(
                RefTable::Object,
                index,
            )))?;

        if matches!(**slot, Value::Null) {
            Ok((i, Rc::new(Value::Reference(index as u32))))
        } else {
            Ok((i, Rc::clone(slot)))
        }
    }

    /// Decode an inline complex value, entering it into the object table
    /// before its body is read so that cyclic references resolve
    fn parse_reference_or_val<'a>(
        &mut self,
        i: &'a [u8],
        parser: impl FnOnce(&mut Self, &'a [u8], usize) -> AMFResult<'a, Value>,
    ) -> AMFResult<'a, Rc<Value>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Reference(index) => self.resolve_object_reference(i, index),
            Length::Size(len) => {
                let index = self.object_reference_table.len();
                self.object_reference_table.push(Rc::new(Value::Null));

                let (i, res) = parser(self, i, len as usize)?;

                let slot = self
                    .object_reference_table
                    .get_mut(index)
                    .expect("Index not in reference table");
                // In-flight back-references never clone the placeholder
                *Rc::get_mut(slot).expect("Placeholder is uniquely held") = res;

                Ok((i, Rc::clone(slot)))
            }
        }
    }

    fn parse_class_def<'a>(&mut self, length: u32, i: &'a [u8]) -> AMFResult<'a, ClassDefinition> {
        if length & REFERENCE_FLAG == 0 {
            let index = (length >> 1) as usize;
            let class_def = self
                .trait_reference_table
                .get(index)
                .ok_or(Err::Error(Error::ReferenceOutOfRange(RefTable::Trait, index)))?
                .clone();

            return Ok((i, class_def));
        }
        let length = length >> 1;

        let (i, name) = self.parse_string(i)?;

        let encoding = (length & 0x03) as u8;
        let attribute_count = (length >> 2) as usize;

        // Each member name takes at least one byte
        if i.len() < attribute_count {
            return Err(Err::Error(Error::UnexpectedEof));
        }

        let mut static_props = Vec::with_capacity(attribute_count);
        let mut i = i;
        for _ in 0..attribute_count {
            let (j, prop) = self.parse_string(i)?;
            static_props.push(prop);
            i = j;
        }

        let mut attributes = EnumSet::empty();
        if encoding & 0b01 == 0b01 {
            attributes |= Attribute::External;
        }
        if encoding & 0b10 == 0b10 {
            attributes |= Attribute::Dynamic;
        }

        let class_def = ClassDefinition {
            name,
            attributes,
            static_properties: static_props,
        };

        self.trait_reference_table.push(class_def.clone());
        Ok((i, class_def))
    }

    fn parse_object_static<'a>(
        &mut self,
        i: &'a [u8],
        class_def: &ClassDefinition,
    ) -> AMFResult<'a, Vec<Element>> {
        let mut elements = Vec::with_capacity(class_def.static_properties.len());
        let mut i = i;

        for name in class_def.static_properties.iter() {
            let (j, value) = self.parse_single_element(i)?;

            elements.push(Element {
                name: name.clone(),
                value,
            });

            i = j;
        }

        Ok((i, elements))
    }

    pub(crate) fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, mut length) = read_int(i)?;

        if length & REFERENCE_FLAG == 0 {
            return self.resolve_object_reference(i, (length >> 1) as usize);
        }
        length >>= 1;

        let index = self.object_reference_table.len();
        self.object_reference_table.push(Rc::new(Value::Null));

        let (i, class_def) = self.parse_class_def(length, i)?;

        if class_def.attributes.contains(Attribute::External) {
            return Err(Err::Error(Error::Unsupported("externalizable traits")));
        }

        if let Some(registry) = self.registry {
            if !class_def.name.is_empty() && !registry.contains_alias(&class_def.name) {
                return Err(Err::Error(Error::UnknownTypeAlias(class_def.name)));
            }
        }

        let (i, mut elements) = self.parse_object_static(i, &class_def)?;

        let mut i = i;
        if class_def.attributes.contains(Attribute::Dynamic) {
            // Read dynamic key/value pairs until the empty-string key
            let (mut j, mut key) = self.parse_byte_stream(i)?;
            while !key.is_empty() {
                let name = String::from_utf8(key).map_err(|_| Err::Error(Error::InvalidUtf8))?;
                let (k, value) = self.parse_single_element(j)?;
                elements.push(Element { name, value });

                let (k, next_key) = self.parse_byte_stream(k)?;
                j = k;
                key = next_key;
            }
            i = j;
        }

        let slot = self
            .object_reference_table
            .get_mut(index)
            .expect("Index not in reference table");
        *Rc::get_mut(slot).expect("Placeholder is uniquely held") =
            Value::Object(elements, Some(class_def));

        Ok((i, Rc::clone(slot)))
    }

    fn parse_element_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_reference_or_val(i, |this, i, length| {
            // Each element takes at least one byte
            if i.len() < length {
                return Err(Err::Error(Error::UnexpectedEof));
            }

            let (i, mut key) = this.parse_byte_stream(i)?;

            if key.is_empty() {
                // Dense-only array
                let mut elements = Vec::with_capacity(length);
                let mut i = i;
                for _ in 0..length {
                    let (j, e) = this.parse_single_element(i)?;
                    elements.push(e);
                    i = j;
                }
                return Ok((i, Value::StrictArray(elements)));
            }

            // Associative portion first, terminated by the empty key
            let mut assoc = Vec::new();
            let mut i = i;
            while !key.is_empty() {
                let name = String::from_utf8(key).map_err(|_| Err::Error(Error::InvalidUtf8))?;
                let (j, value) = this.parse_single_element(i)?;
                assoc.push(Element { name, value });

                let (j, next_key) = this.parse_byte_stream(j)?;
                i = j;
                key = next_key;
            }

            let mut dense = Vec::with_capacity(length);
            for _ in 0..length {
                let (j, e) = this.parse_single_element(i)?;
                dense.push(e);
                i = j;
            }

            let assoc_len = assoc.len() as u32;
            Ok((i, Value::ECMAArray(dense, assoc, assoc_len)))
        })
    }

    fn parse_element_byte_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_reference_or_val(i, |_this, i, len| {
            let (i, bytes) = take(len)(i)?;
            Ok((i, Value::ByteArray(bytes.to_vec())))
        })
    }

    fn parse_element_date<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_reference_or_val(i, |_this, i, _len| {
            let (i, ms) = be_f64(i)?;
            Ok((i, Value::Date(ms)))
        })
    }

    fn parse_element_xml<'a>(&mut self, i: &'a [u8], legacy: bool) -> AMFResult<'a, Rc<Value>> {
        self.parse_reference_or_val(i, move |_this, i, len| {
            let (i, bytes) = take(len)(i)?;
            let content =
                std::str::from_utf8(bytes).map_err(|_| Err::Error(Error::InvalidUtf8))?;
            Ok((i, Value::XML(content.to_string(), legacy)))
        })
    }

    /// Parse a single AMF3 value from the input
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        if self.depth >= self.max_depth {
            return Err(Err::Error(Error::DepthExceeded));
        }

        let (i, type_) = read_type_marker(i)?;

        self.depth += 1;
        let result = match type_ {
            TypeMarker::Undefined => Ok((i, Rc::new(Value::Undefined))),
            TypeMarker::Null => Ok((i, Rc::new(Value::Null))),
            TypeMarker::False => Ok((i, Rc::new(Value::Bool(false)))),
            TypeMarker::True => Ok((i, Rc::new(Value::Bool(true)))),
            TypeMarker::Integer => {
                let (i, v) = read_int_signed(i)?;
                Ok((i, Rc::new(Value::Integer(v))))
            }
            TypeMarker::Number => {
                let (i, v) = be_f64(i)?;
                Ok((i, Rc::new(Value::Number(v))))
            }
            TypeMarker::String => self.parse_element_string(i),
            TypeMarker::XmlDoc => self.parse_element_xml(i, true),
            TypeMarker::Date => self.parse_element_date(i),
            TypeMarker::Array => self.parse_element_array(i),
            TypeMarker::Object => self.parse_element_object(i),
            TypeMarker::Xml => self.parse_element_xml(i, false),
            TypeMarker::ByteArray => self.parse_element_byte_array(i),
        };
        self.depth -= 1;

        result
    }
}

#[cfg(test)]
mod read_number_tests {
    use super::{read_int, read_int_signed};

    #[test]
    fn test_read_1byte_number() {
        assert_eq!(0b00101011, read_int_signed(&[0b00101011]).unwrap().1)
    }

    #[test]
    fn test_read_4byte_number() {
        let i = &[0b10000000, 0b11000000, 0b10000000, 0b10000000];
        assert_eq!(2097280, read_int_signed(i).unwrap().1);
    }

    #[test]
    fn read_neg_number() {
        assert_eq!(-268435455, read_int_signed(&[192, 128, 128, 1]).unwrap().1);
    }

    #[test]
    fn test_read_1byte_number_unsigned() {
        assert_eq!(0b00101011, read_int(&[0b00101011]).unwrap().1)
    }

    #[test]
    fn test_read_4byte_number_unsigned() {
        let i = &[0b10000000, 0b11000000, 0b10000000, 0b10000000];
        assert_eq!(2097280, read_int(i).unwrap().1);
    }

    #[test]
    fn read_neg_number_unsigned() {
        assert_eq!(536870915, read_int(&[192, 128, 128, 1]).unwrap().1);
    }
}
