//! The schema registry
//!
//! Maps registered user types to their wire descriptors, keyed both by alias
//! and by `TypeId`. Immutable once handed to a codec, and therefore freely
//! shareable across threads.

use crate::contract::{AmfContract, AmfEnum};
use crate::errors::{EncodeError, Error, SchemaError};
use crate::types::{Attribute, ClassDefinition};
use enumset::EnumSet;
use std::any::TypeId;
use std::collections::HashMap;

/// What kind of contract a descriptor describes
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContractKind {
    /// A record with named members
    Record,
    /// An integer-wired enum
    Enum,
}

/// The cached wire shape of one registered type
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    /// The wire alias
    pub alias: String,

    /// Record or enum
    pub kind: ContractKind,

    /// Member names in declared order; for enums, variant names in ascending
    /// wire-value order
    pub members: Vec<&'static str>,

    /// Whether unknown dynamic members are retained
    pub dynamic: bool,

    /// For enums, every `(name, wire value)` pair
    pub variants: Vec<(&'static str, i32)>,

    /// The programmatic name of the registered type
    pub type_name: &'static str,
}

impl ContractDescriptor {
    /// The trait record this descriptor produces on the wire
    pub(crate) fn class_definition(&self) -> ClassDefinition {
        let mut attributes = EnumSet::empty();
        if self.dynamic {
            attributes |= Attribute::Dynamic;
        }
        ClassDefinition {
            name: self.alias.clone(),
            attributes,
            static_properties: self.members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Resolves user types to wire descriptors
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_alias: HashMap<String, ContractDescriptor>,
    alias_by_type: HashMap<TypeId, String>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        type_id: TypeId,
        descriptor: ContractDescriptor,
    ) -> Result<(), SchemaError> {
        if self.by_alias.contains_key(&descriptor.alias) {
            return Err(SchemaError::DuplicateAlias(descriptor.alias));
        }
        if self.alias_by_type.contains_key(&type_id) {
            return Err(SchemaError::DuplicateType(descriptor.type_name));
        }

        self.alias_by_type.insert(type_id, descriptor.alias.clone());
        self.by_alias.insert(descriptor.alias.clone(), descriptor);
        Ok(())
    }

    /// Register a record contract
    pub fn register<T: AmfContract>(&mut self) -> Result<(), SchemaError> {
        self.insert(
            TypeId::of::<T>(),
            ContractDescriptor {
                alias: T::alias().to_string(),
                kind: ContractKind::Record,
                members: T::members().to_vec(),
                dynamic: T::dynamic(),
                variants: Vec::new(),
                type_name: std::any::type_name::<T>(),
            },
        )
    }

    /// Register an enum contract
    pub fn register_enum<E: AmfEnum>(&mut self) -> Result<(), SchemaError> {
        let mut variants = E::variants().to_vec();
        variants.sort_by_key(|(_, value)| *value);
        let members = variants.iter().map(|(name, _)| *name).collect();

        self.insert(
            TypeId::of::<E>(),
            ContractDescriptor {
                alias: E::alias().to_string(),
                kind: ContractKind::Enum,
                members,
                dynamic: false,
                variants,
                type_name: std::any::type_name::<E>(),
            },
        )
    }

    /// Whether the given alias is registered
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// Look up a descriptor by wire alias
    pub fn by_alias(&self, alias: &str) -> Result<&ContractDescriptor, Error<'static>> {
        self.by_alias
            .get(alias)
            .ok_or_else(|| Error::UnknownTypeAlias(alias.to_string()))
    }

    /// Look up a descriptor by registered type
    pub fn by_type<T: 'static>(&self) -> Result<&ContractDescriptor, EncodeError> {
        self.alias_by_type
            .get(&TypeId::of::<T>())
            .and_then(|alias| self.by_alias.get(alias))
            .ok_or_else(|| EncodeError::UnregisteredType(std::any::type_name::<T>().to_string()))
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use crate::contract::{PropertyBag, Registry};
    use crate::types::Element;

    struct Ping {
        serial: i32,
    }

    impl AmfContract for Ping {
        fn alias() -> &'static str {
            "test.Ping"
        }

        fn members() -> &'static [&'static str] {
            &["serial"]
        }

        fn to_bag(&self, _registry: &Registry) -> Result<Vec<Element>, EncodeError> {
            Ok(vec![Element::new("serial", crate::types::Value::Integer(self.serial))])
        }

        fn from_bag(bag: &PropertyBag<'_>, _registry: &Registry) -> Result<Self, Error<'static>> {
            Ok(Self {
                serial: bag.required("serial")?,
            })
        }
    }

    #[test]
    fn register_and_look_up() {
        let mut registry = Registry::new();
        registry.register::<Ping>().unwrap();

        assert!(registry.contains_alias("test.Ping"));
        assert_eq!(registry.by_alias("test.Ping").unwrap().members, ["serial"]);
        assert_eq!(registry.by_type::<Ping>().unwrap().alias, "test.Ping");
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        struct Pong;
        impl AmfContract for Pong {
            fn alias() -> &'static str {
                "test.Ping"
            }
            fn members() -> &'static [&'static str] {
                &[]
            }
            fn to_bag(&self, _registry: &Registry) -> Result<Vec<Element>, EncodeError> {
                Ok(vec![])
            }
            fn from_bag(_bag: &PropertyBag<'_>, _registry: &Registry) -> Result<Self, Error<'static>> {
                Ok(Self)
            }
        }

        let mut registry = Registry::new();
        registry.register::<Ping>().unwrap();
        assert_eq!(
            registry.register::<Pong>(),
            Err(SchemaError::DuplicateAlias("test.Ping".to_string()))
        );
    }

    #[test]
    fn unknown_lookups_fail() {
        let registry = Registry::new();
        assert!(matches!(
            registry.by_alias("nope"),
            Err(Error::UnknownTypeAlias(_))
        ));
        assert!(matches!(
            registry.by_type::<Ping>(),
            Err(EncodeError::UnregisteredType(_))
        ));
    }
}
