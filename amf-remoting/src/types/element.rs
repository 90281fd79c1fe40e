use super::Value;
use std::rc::Rc;

/// A named member of an object or associative array
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// The member name
    pub name: String,

    /// The member value
    pub value: Rc<Value>,
}

impl Element {
    /// Create a new element with the given name
    pub fn new(name: impl Into<String>, value: impl Into<Rc<Value>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
