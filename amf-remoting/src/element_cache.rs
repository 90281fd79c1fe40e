//! Encode-side interning tables
//!
//! Each encoder session owns one cache per reference table. Entries are
//! append-only; the index of an entry is its wire back-reference.

use crate::amf3::length::Length;
use crate::types::Value;
use std::rc::Rc;

/// Interning table for byte strings, value equality
#[derive(Default, Debug)]
pub(crate) struct StringCache {
    entries: Vec<Vec<u8>>,
}

impl StringCache {
    pub(crate) fn find(&self, bytes: &[u8]) -> Option<usize> {
        self.entries.iter().position(|e| e == bytes)
    }

    /// Store the given string, unless it is already interned
    pub(crate) fn store(&mut self, bytes: &[u8]) {
        if self.find(bytes).is_none() {
            self.entries.push(bytes.to_vec());
        }
    }
}

/// Interning table for complex values
///
/// Aggregates (`Object`, `StrictArray`, `ECMAArray`) are matched by identity
/// so that distinct-but-equal values each get their own slot, while
/// `Date`/`ByteArray`/`XML` are matched by value.
#[derive(Default, Debug)]
pub(crate) struct ObjectCache {
    entries: Vec<Rc<Value>>,
}

impl ObjectCache {
    pub(crate) fn find(&self, value: &Rc<Value>) -> Option<usize> {
        match **value {
            Value::Object(..) | Value::StrictArray(_) | Value::ECMAArray(..) => {
                self.entries.iter().position(|e| Rc::ptr_eq(e, value))
            }
            _ => self.entries.iter().position(|e| **e == **value),
        }
    }

    pub(crate) fn store(&mut self, value: &Rc<Value>) {
        self.entries.push(Rc::clone(value));
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Rc<Value>> {
        self.entries.get(index)
    }

    /// Get a `Length` for the given value
    ///
    /// A `Length::Reference` if the value is already interned, otherwise the
    /// value is stored and the given size is returned as `Length::Size`
    pub(crate) fn to_length_store(&mut self, value: &Rc<Value>, length: u32) -> Length {
        if let Some(index) = self.find(value) {
            Length::Reference(index)
        } else {
            self.store(value);
            Length::Size(length)
        }
    }
}
