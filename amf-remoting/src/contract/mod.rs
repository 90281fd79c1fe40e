//! Typed data contracts
//!
//! A data contract binds a user record type to the wire: an alias, an
//! ordered member list, and projections between the record and a decoded
//! property bag. Contracts are hand-written tables; see the integration
//! tests for the implementation pattern.

pub mod binder;
pub mod registry;

pub use registry::{ContractDescriptor, ContractKind, Registry};

use crate::errors::{EncodeError, Error};
use crate::types::{Element, Value};
use std::rc::Rc;

/// A user record type that can cross the wire as a typed object
pub trait AmfContract: Sized + 'static {
    /// The wire alias of this type
    ///
    /// Defaults to the fully qualified type name
    fn alias() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The sealed member names, in declared order
    fn members() -> &'static [&'static str];

    /// Whether this type retains unknown dynamic members
    ///
    /// Types that return true should collect [`PropertyBag::extras`] in
    /// their [`AmfContract::from_bag`]
    fn dynamic() -> bool {
        false
    }

    /// Project this record into a property bag
    ///
    /// Must produce one element per declared member; extra elements are kept
    /// only for dynamic contracts
    fn to_bag(&self, registry: &Registry) -> Result<Vec<Element>, EncodeError>;

    /// Materialize a record from a decoded property bag
    fn from_bag(bag: &PropertyBag<'_>, registry: &Registry) -> Result<Self, Error<'static>>;
}

/// A user enum type wired as an integer
pub trait AmfEnum: Sized + Copy + 'static {
    /// The wire alias of this type
    ///
    /// Defaults to the fully qualified type name
    fn alias() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Every `(name, wire value)` pair of the enum
    fn variants() -> &'static [(&'static str, i32)];

    /// The wire form of this constant
    fn to_wire(self) -> i32;

    /// The constant for a wire value, if one is mapped
    fn from_wire(value: i32) -> Option<Self>;
}

/// Coercion from a decoded value into a member type
///
/// Errors are the human-readable reason; the property bag wraps them into
/// [`Error::ContractViolation`] together with the member name
pub trait FromAmf: Sized {
    /// Coerce the given value
    fn from_amf(value: &Value) -> Result<Self, String>;
}

/// Narrow a wire number to an integral member type
fn narrow<T: TryFrom<i64>>(value: &Value, target: &str) -> Result<T, String> {
    let wide = match value {
        Value::Integer(i) => *i as i64,
        Value::Number(n) => {
            if n.fract() != 0.0 {
                return Err(format!("number {n} is not an integer"));
            }
            if *n < i64::MIN as f64 || *n > i64::MAX as f64 {
                return Err(format!("number {n} is out of range for {target}"));
            }
            *n as i64
        }
        other => return Err(format!("cannot coerce {other:?} to {target}")),
    };
    T::try_from(wide).map_err(|_| format!("value {wide} is out of range for {target}"))
}

impl FromAmf for bool {
    fn from_amf(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(format!("cannot coerce {other:?} to bool")),
        }
    }
}

impl FromAmf for i16 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        narrow(value, "i16")
    }
}

impl FromAmf for u16 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        narrow(value, "u16")
    }
}

impl FromAmf for i32 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        narrow(value, "i32")
    }
}

impl FromAmf for u32 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        narrow(value, "u32")
    }
}

impl FromAmf for i64 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        narrow(value, "i64")
    }
}

impl FromAmf for f64 {
    fn from_amf(value: &Value) -> Result<Self, String> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(format!("cannot coerce {other:?} to f64")),
        }
    }
}

impl FromAmf for String {
    fn from_amf(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(format!("cannot coerce {other:?} to string")),
        }
    }
}

impl FromAmf for Vec<u8> {
    fn from_amf(value: &Value) -> Result<Self, String> {
        match value {
            Value::ByteArray(bytes) => Ok(bytes.clone()),
            other => Err(format!("cannot coerce {other:?} to a byte array")),
        }
    }
}

impl<T: FromAmf> FromAmf for Vec<T> {
    fn from_amf(value: &Value) -> Result<Self, String> {
        let dense = match value {
            Value::StrictArray(dense) => dense,
            Value::ECMAArray(dense, _, _) => dense,
            other => return Err(format!("cannot coerce {other:?} to an array")),
        };
        dense.iter().map(|v| T::from_amf(v)).collect()
    }
}

/// A decoded object's members, with coercing accessors
pub struct PropertyBag<'a> {
    elements: &'a [Element],
}

impl<'a> PropertyBag<'a> {
    /// Wrap a decoded member list
    pub fn new(elements: &'a [Element]) -> Self {
        Self { elements }
    }

    /// The raw value of a member, if present
    pub fn value(&self, name: &str) -> Option<&'a Rc<Value>> {
        self.elements.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    fn violation(name: &str, reason: impl Into<String>) -> Error<'static> {
        Error::ContractViolation {
            field: name.to_string(),
            reason: reason.into(),
        }
    }

    /// A member that must be present and coercible
    pub fn required<T: FromAmf>(&self, name: &str) -> Result<T, Error<'static>> {
        let value = self
            .value(name)
            .ok_or_else(|| Self::violation(name, "required member missing"))?;
        T::from_amf(value).map_err(|reason| Self::violation(name, reason))
    }

    /// A member that may be absent or null
    pub fn optional<T: FromAmf>(&self, name: &str) -> Result<Option<T>, Error<'static>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) if matches!(&**value, Value::Null | Value::Undefined) => Ok(None),
            Some(value) => T::from_amf(value)
                .map(Some)
                .map_err(|reason| Self::violation(name, reason)),
        }
    }

    /// A member holding a nested registered record
    pub fn record<T: AmfContract>(
        &self,
        name: &str,
        registry: &Registry,
    ) -> Result<T, Error<'static>> {
        let value = self
            .value(name)
            .ok_or_else(|| Self::violation(name, "required member missing"))?;
        binder::bind(value, registry)
    }

    /// A member holding an enum constant
    pub fn enum_value<E: AmfEnum>(&self, name: &str) -> Result<E, Error<'static>> {
        let value = self
            .value(name)
            .ok_or_else(|| Self::violation(name, "required member missing"))?;
        binder::bind_enum(value).map_err(|e| match e {
            Error::ContractViolation { reason, .. } => Self::violation(name, reason),
            other => other,
        })
    }

    /// The members outside the sealed list, in decoded order
    ///
    /// Only contracts that declare themselves dynamic should retain these
    pub fn extras(&self, sealed: &[&str]) -> Vec<Element> {
        self.elements
            .iter()
            .filter(|e| !sealed.contains(&e.name.as_str()))
            .cloned()
            .collect()
    }
}
