//! Support for decoding AMF0

use crate::amf0::type_marker::TypeMarker;
use crate::amf3::read::{AMF3Decoder, DEFAULT_MAX_DEPTH};
use crate::contract::Registry;
use crate::errors::{Error, RefTable};
use crate::nom_utils::{take_str, AMFResult};
use crate::types::{ClassDefinition, Element, Value};
use nom::number::complete::{be_f64, be_i16, be_u16, be_u32, be_u8};
use nom::Err;
use std::rc::Rc;

/// Parse an UTF-8 string with a 16-bit length prefix
pub(crate) fn parse_string(i: &[u8]) -> AMFResult<'_, &str> {
    let (i, length) = be_u16(i)?;
    take_str(i, length as u32)
}

fn parse_long_string(i: &[u8]) -> AMFResult<'_, &str> {
    let (i, length) = be_u32(i)?;
    take_str(i, length)
}

fn read_type_marker(i: &[u8]) -> AMFResult<'_, TypeMarker> {
    let (i, type_) = be_u8(i)?;
    TypeMarker::try_from(type_)
        .map(|m| (i, m))
        .map_err(|_| Err::Error(Error::UnknownMarker(type_)))
}

/// Handles decoding AMF0
///
/// A decoder is one session: its object table lives for a single payload and
/// it must not be reused across payloads
pub struct AMF0Decoder<'r> {
    /// The table of complex values read so far, indexed by the reference marker
    pub object_reference_table: Vec<Rc<Value>>,

    /// Known aliases; a typed object naming an unknown alias is an error
    registry: Option<&'r Registry>,

    /// Whether the AvmPlus marker may hand off to AMF3
    allow_version_switch: bool,

    max_depth: u32,
    depth: u32,
}

impl Default for AMF0Decoder<'_> {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_DEPTH, true)
    }
}

impl<'r> AMF0Decoder<'r> {
    /// Create a decoder session with the given alias registry and depth bound
    pub fn new(registry: Option<&'r Registry>, max_depth: u32, allow_version_switch: bool) -> Self {
        Self {
            object_reference_table: Vec::new(),
            registry,
            allow_version_switch,
            max_depth,
            depth: 0,
        }
    }

    /// Decode an inline complex value, entering it into the object table
    /// before its body is read so that cyclic references resolve
    fn parse_complex<'a>(
        &mut self,
        i: &'a [u8],
        parser: impl FnOnce(&mut Self, &'a [u8]) -> AMFResult<'a, Value>,
    ) -> AMFResult<'a, Rc<Value>> {
        let index = self.object_reference_table.len();
        self.object_reference_table.push(Rc::new(Value::Null));

        let (i, res) = parser(self, i)?;

        let slot = self
            .object_reference_table
            .get_mut(index)
            .expect("Index not in reference table");
        // In-flight back-references never clone the placeholder
        *Rc::get_mut(slot).expect("Placeholder is uniquely held") = res;

        Ok((i, Rc::clone(slot)))
    }

    fn parse_element_reference<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, index) = be_u16(i)?;
        let index = index as usize;

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

    /// Parse the members of an object, terminated by the empty key and the
    /// object-end marker
    fn parse_object_members<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Vec<Element>> {
        let mut elements = Vec::new();
        let mut i = i;

        loop {
            let (j, name) = parse_string(i)?;
            if name.is_empty() {
                let (j, marker) = be_u8(j)?;
                if marker != TypeMarker::ObjectEnd as u8 {
                    return Err(Err::Error(Error::UnknownMarker(marker)));
                }
                i = j;
                break;
            }

            let name = name.to_string();
            let (j, value) = self.parse_single_element(j)?;
            elements.push(Element { name, value });
            i = j;
        }

        Ok((i, elements))
    }

    fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |this, i| {
            let (i, elements) = this.parse_object_members(i)?;
            Ok((i, Value::Object(elements, None)))
        })
    }

    fn parse_element_typed_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |this, i| {
            let (i, name) = parse_string(i)?;

            if let Some(registry) = this.registry {
                if !name.is_empty() && !registry.contains_alias(name) {
                    return Err(Err::Error(Error::UnknownTypeAlias(name.to_string())));
                }
            }

            let name = name.to_string();
            let (i, elements) = this.parse_object_members(i)?;
            Ok((
                i,
                Value::Object(elements, Some(ClassDefinition::default_with_name(name))),
            ))
        })
    }

    fn parse_element_ecma_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |this, i| {
            let (i, length) = be_u32(i)?;
            let (i, elements) = this.parse_object_members(i)?;
            Ok((i, Value::ECMAArray(Vec::new(), elements, length)))
        })
    }

    fn parse_element_strict_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |this, i| {
            let (i, length) = be_u32(i)?;
            let length = length as usize;

            // Each element takes at least one byte
            if i.len() < length {
                return Err(Err::Error(Error::UnexpectedEof));
            }

            let mut elements = Vec::with_capacity(length);
            let mut i = i;
            for _ in 0..length {
                let (j, e) = this.parse_single_element(i)?;
                elements.push(e);
                i = j;
            }

            Ok((i, Value::StrictArray(elements)))
        })
    }

    fn parse_element_date<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |_this, i| {
            let (i, millis) = be_f64(i)?;
            // The timezone field is always zero and ignored
            let (i, _timezone) = be_i16(i)?;
            Ok((i, Value::Date(millis)))
        })
    }

    fn parse_element_xml<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        self.parse_complex(i, |_this, i| {
            let (i, content) = parse_long_string(i)?;
            Ok((i, Value::XML(content.to_string(), true)))
        })
    }

    fn parse_element_avm_plus<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        if !self.allow_version_switch {
            return Err(Err::Error(Error::Unsupported("avmplus marker")));
        }

        // A fresh AMF3 session: its tables do not inherit this one's
        AMF3Decoder::new(self.registry, self.max_depth).parse_single_element(i)
    }

    /// Parse a single AMF0 value from the input
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        if self.depth >= self.max_depth {
            return Err(Err::Error(Error::DepthExceeded));
        }

        let (i, type_) = read_type_marker(i)?;

        self.depth += 1;
        let result = match type_ {
            TypeMarker::Number => {
                let (i, v) = be_f64(i)?;
                Ok((i, Rc::new(Value::Number(v))))
            }
            TypeMarker::Boolean => {
                let (i, v) = be_u8(i)?;
                Ok((i, Rc::new(Value::Bool(v > 0))))
            }
            TypeMarker::String => {
                let (i, s) = parse_string(i)?;
                Ok((i, Rc::new(Value::String(s.to_string()))))
            }
            TypeMarker::LongString => {
                let (i, s) = parse_long_string(i)?;
                Ok((i, Rc::new(Value::String(s.to_string()))))
            }
            TypeMarker::Null => Ok((i, Rc::new(Value::Null))),
            TypeMarker::Undefined => Ok((i, Rc::new(Value::Undefined))),
            TypeMarker::Object => self.parse_element_object(i),
            TypeMarker::TypedObject => self.parse_element_typed_object(i),
            TypeMarker::EcmaArray => self.parse_element_ecma_array(i),
            TypeMarker::StrictArray => self.parse_element_strict_array(i),
            TypeMarker::Date => self.parse_element_date(i),
            TypeMarker::XmlDocument => self.parse_element_xml(i),
            TypeMarker::Reference => self.parse_element_reference(i),
            TypeMarker::AvmPlus => self.parse_element_avm_plus(i),
            TypeMarker::ObjectEnd => Err(Err::Error(Error::UnknownMarker(
                TypeMarker::ObjectEnd as u8,
            ))),
        };
        self.depth -= 1;

        result
    }
}
