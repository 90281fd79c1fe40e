use super::Attribute;
use enumset::EnumSet;

/// A class definition (trait) describing the shape of a typed object
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassDefinition {
    /// The wire alias of the class, empty for anonymous objects
    pub name: String,

    /// The attributes on this trait
    pub attributes: EnumSet<Attribute>,

    /// The names of the sealed members, in declared order
    pub static_properties: Vec<String>,
}

impl Default for ClassDefinition {
    /// The anonymous trait: no name, no sealed members, dynamic
    fn default() -> Self {
        Self {
            name: String::new(),
            attributes: EnumSet::only(Attribute::Dynamic),
            static_properties: Vec::new(),
        }
    }
}

impl ClassDefinition {
    /// Creates a new ClassDefinition with the given name, and no attributes or properties
    pub fn default_with_name(name: String) -> Self {
        Self {
            name,
            attributes: EnumSet::empty(),
            static_properties: Vec::new(),
        }
    }
}
