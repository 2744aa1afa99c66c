//! Variable - A named substitution value

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::VariableField;

/// Variable used for `{name}` substitution
///
/// Names are not unique; see [`crate::services::template`] for how
/// duplicates resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The literal token this variable replaces
    pub fn token(&self) -> String {
        format!("{{{}}}", self.name)
    }

    /// Return a copy with one field replaced
    pub fn with_field(&self, field: VariableField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        match field {
            VariableField::Name => next.name = value.into(),
            VariableField::Value => next.value = value.into(),
        }
        next
    }
}
