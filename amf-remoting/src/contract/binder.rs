//! Projection between user records and decoded value graphs

use crate::contract::{AmfContract, AmfEnum, PropertyBag, Registry};
use crate::errors::{EncodeError, Error};
use crate::types::Value;
use std::rc::Rc;

/// Project a registered record into a typed object value
///
/// Fails closed with [`EncodeError::UnregisteredType`] when the type is not
/// in the registry. Members are emitted in declared order; a bag missing a
/// declared member is a contract violation
pub fn project<T: AmfContract>(value: &T, registry: &Registry) -> Result<Rc<Value>, EncodeError> {
    let descriptor = registry.by_type::<T>()?;
    let bag = value.to_bag(registry)?;

    let mut elements = Vec::with_capacity(bag.len());
    for name in &descriptor.members {
        let element = bag
            .iter()
            .find(|e| e.name == **name)
            .ok_or_else(|| EncodeError::ContractViolation {
                field: (*name).to_string(),
                reason: "member missing from projected bag".to_string(),
            })?;
        elements.push(element.clone());
    }

    if descriptor.dynamic {
        for element in &bag {
            if !descriptor.members.contains(&element.name.as_str()) {
                elements.push(element.clone());
            }
        }
    }

    Ok(Rc::new(Value::Object(
        elements,
        Some(descriptor.class_definition()),
    )))
}

/// Project an enum constant into its wire integer
pub fn project_enum<E: AmfEnum>(value: E) -> Rc<Value> {
    Rc::new(Value::Integer(value.to_wire()))
}

/// Materialize a registered record from a decoded value
///
/// An anonymous object binds directly through the bag; a typed object must
/// carry the record's own alias
pub fn bind<T: AmfContract>(value: &Value, registry: &Registry) -> Result<T, Error<'static>> {
    match value {
        Value::Object(elements, class_def) => {
            if let Some(def) = class_def {
                if !def.name.is_empty() {
                    let descriptor = registry.by_alias(&def.name)?;
                    if descriptor.alias != T::alias() {
                        return Err(Error::ContractViolation {
                            field: T::alias().to_string(),
                            reason: format!("wire alias {:?} does not match", def.name),
                        });
                    }
                }
            }
            T::from_bag(&PropertyBag::new(elements), registry)
        }
        other => Err(Error::ContractViolation {
            field: T::alias().to_string(),
            reason: format!("expected an object, found {other:?}"),
        }),
    }
}

/// Materialize an enum constant from a decoded value
///
/// Accepts the wire integer (or an integral double) and, for symbolic
/// producers, the variant name
pub fn bind_enum<E: AmfEnum>(value: &Value) -> Result<E, Error<'static>> {
    let violation = |reason: String| Error::ContractViolation {
        field: E::alias().to_string(),
        reason,
    };

    match value {
        Value::Integer(i) => {
            E::from_wire(*i).ok_or_else(|| violation(format!("enum value {i} is not mapped")))
        }
        Value::Number(n) => {
            if n.fract() != 0.0 || *n < i32::MIN as f64 || *n > i32::MAX as f64 {
                return Err(violation(format!("number {n} is not an enum value")));
            }
            let wire = *n as i32;
            E::from_wire(wire)
                .ok_or_else(|| violation(format!("enum value {wire} is not mapped")))
        }
        Value::String(s) => E::variants()
            .iter()
            .find(|(name, _)| name == s)
            .and_then(|(_, wire)| E::from_wire(*wire))
            .ok_or_else(|| violation(format!("enum name {s:?} is not mapped"))),
        other => Err(violation(format!("cannot coerce {other:?} to an enum"))),
    }
}
